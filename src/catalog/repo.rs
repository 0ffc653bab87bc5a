use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{CollectionSpec, JsonDb, Shape, StoreError};

/// Catalog item as persisted. Ids are local to the category's backing
/// file; the same id can exist in two categories at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub nome: String,
    pub tipo: String,
    #[serde(default)]
    pub canabinoide: Option<String>,
    #[serde(default)]
    pub quantidade: u64,
    #[serde(default)]
    pub preco: f64,
    #[serde(default)]
    pub foto: Option<String>,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub criado_em: String,
}

const CATEGORY_FILES: &[(&str, &str)] = &[
    ("oleo", "produtos_oleo.json"),
    ("flor", "produtos_flor.json"),
    ("extrato", "produtos_extrato.json"),
    ("cosmetico", "produtos_cosmetico.json"),
];

const DEFAULT_FILE: &str = "produtos_oleo.json";

fn spec_for(file: &'static str) -> CollectionSpec {
    CollectionSpec {
        name: "produto",
        file,
        shape: Shape::Bare,
    }
}

fn normalize_category(tipo: &str) -> String {
    tipo.trim()
        .to_lowercase()
        .replace(['ó', 'ô', 'õ'], "o")
        .replace(['é', 'ê'], "e")
        .replace('á', "a")
}

/// Write-side routing: an unrecognized category is an error.
pub fn write_spec(tipo: &str) -> Result<CollectionSpec, StoreError> {
    let key = normalize_category(tipo);
    CATEGORY_FILES
        .iter()
        .find(|(label, _)| *label == key)
        .map(|(_, file)| spec_for(file))
        .ok_or_else(|| StoreError::UnknownCategory(tipo.to_string()))
}

/// Read-side routing: an unrecognized or absent category silently falls
/// back to the default file. The asymmetry with [`write_spec`] matches the
/// observed behavior of the system this replaces; see DESIGN.md.
pub fn read_spec(tipo: Option<&str>) -> CollectionSpec {
    tipo.and_then(|t| write_spec(t).ok())
        .unwrap_or_else(|| spec_for(DEFAULT_FILE))
}

fn decode(record: Value) -> Result<Product, StoreError> {
    serde_json::from_value(record).map_err(StoreError::from)
}

pub async fn list(db: &JsonDb, tipo: Option<&str>) -> Result<Vec<Product>, StoreError> {
    let records = db.load(read_spec(tipo)).await?;
    records.into_iter().map(decode).collect()
}

pub async fn create(db: &JsonDb, record: Value, tipo: &str) -> Result<Product, StoreError> {
    let spec = write_spec(tipo)?;
    let stored = db.append(spec, record).await?;
    decode(stored)
}

pub async fn update(
    db: &JsonDb,
    tipo: &str,
    id: u64,
    patch: &Value,
) -> Result<Option<Product>, StoreError> {
    let spec = write_spec(tipo)?;
    db.update_by_id(spec, id, patch).await?.map(decode).transpose()
}

pub async fn remove(db: &JsonDb, tipo: &str, id: u64) -> Result<(), StoreError> {
    let spec = write_spec(tipo)?;
    db.remove_by_id(spec, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn write_routing_accepts_accented_and_plain_labels() {
        assert_eq!(write_spec("Óleo").unwrap().file, "produtos_oleo.json");
        assert_eq!(write_spec("oleo").unwrap().file, "produtos_oleo.json");
        assert_eq!(write_spec("Flor").unwrap().file, "produtos_flor.json");
        assert_eq!(
            write_spec("Cosmético").unwrap().file,
            "produtos_cosmetico.json"
        );
    }

    #[test]
    fn write_routing_rejects_unknown_category() {
        assert!(matches!(
            write_spec("gomas"),
            Err(StoreError::UnknownCategory(_))
        ));
    }

    #[test]
    fn read_routing_falls_back_silently() {
        // unknown and absent categories both land on the default file
        assert_eq!(read_spec(Some("gomas")).file, "produtos_oleo.json");
        assert_eq!(read_spec(None).file, "produtos_oleo.json");
        assert_eq!(read_spec(Some("Flor")).file, "produtos_flor.json");
    }

    #[tokio::test]
    async fn create_scopes_ids_to_the_category_file() {
        let dir = tempdir().unwrap();
        let db = JsonDb::new(dir.path());

        let oil_one = create(&db, json!({ "nome": "A", "tipo": "Óleo" }), "Óleo")
            .await
            .unwrap();
        let oil_two = create(&db, json!({ "nome": "B", "tipo": "Óleo" }), "Óleo")
            .await
            .unwrap();
        let flower = create(&db, json!({ "nome": "C", "tipo": "Flor" }), "Flor")
            .await
            .unwrap();

        assert_eq!(oil_one.id, 1);
        assert_eq!(oil_two.id, 2);
        assert_eq!(flower.id, 1);
    }

    #[tokio::test]
    async fn created_product_appears_in_filtered_list() {
        let dir = tempdir().unwrap();
        let db = JsonDb::new(dir.path());
        create(&db, json!({ "nome": "velho", "tipo": "Óleo" }), "Óleo")
            .await
            .unwrap();

        let created = create(
            &db,
            json!({ "nome": "Full Spectrum 10%", "tipo": "Óleo" }),
            "Óleo",
        )
        .await
        .unwrap();
        assert_eq!(created.id, 2);

        let listed = list(&db, Some("Óleo")).await.unwrap();
        assert!(listed
            .iter()
            .any(|p| p.id == 2 && p.nome == "Full Spectrum 10%"));
    }
}
