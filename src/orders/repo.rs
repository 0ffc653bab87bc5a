use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::store::{self, JsonDb, StoreError};

pub const STATUS_SUCCESS: &str = "sucesso";
pub const STATUS_FAILED: &str = "falha";

/// Buyer identity captured at order time; later profile edits do not
/// rewrite past orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyerSnapshot {
    pub id: u64,
    pub nome: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub produto_id: u64,
    pub nome: String,
    pub quantidade: u64,
    pub preco: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Last four digits only; the full number is used once against the
    /// card allowlist and never persisted.
    pub cartao_final: String,
    pub titular: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub comprador: BuyerSnapshot,
    pub itens: Vec<OrderItem>,
    pub status: String,
    pub endereco: String,
    pub pagamento: Payment,
    #[serde(default)]
    pub rastreio: Option<String>,
    #[serde(default)]
    pub criado_em: String,
}

fn decode(record: Value) -> Result<Order, StoreError> {
    serde_json::from_value(record).map_err(StoreError::from)
}

/// Checks the card number against the allowlist collection.
pub async fn card_allowed(db: &JsonDb, numero: &str) -> Result<bool, StoreError> {
    let cards = db.load(store::CARDS).await?;
    Ok(cards
        .iter()
        .any(|c| c.get("numero").and_then(Value::as_str) == Some(numero)))
}

pub async fn create(
    db: &JsonDb,
    comprador: BuyerSnapshot,
    itens: Vec<OrderItem>,
    endereco: String,
    pagamento: Payment,
    status: &str,
) -> Result<Order, StoreError> {
    let record = json!({
        "comprador": comprador,
        "itens": itens,
        "status": status,
        "endereco": endereco,
        "pagamento": pagamento,
        "rastreio": null,
    });
    let stored = db.append(store::ORDERS, record).await?;
    decode(stored)
}

pub async fn list(db: &JsonDb) -> Result<Vec<Order>, StoreError> {
    let records = db.load(store::ORDERS).await?;
    records.into_iter().map(decode).collect()
}

pub async fn list_by_buyer(db: &JsonDb, buyer_id: u64) -> Result<Vec<Order>, StoreError> {
    let orders = list(db).await?;
    Ok(orders
        .into_iter()
        .filter(|o| o.comprador.id == buyer_id)
        .collect())
}

pub async fn find(db: &JsonDb, id: u64) -> Result<Option<Order>, StoreError> {
    db.find_by_id(store::ORDERS, id).await?.map(decode).transpose()
}

/// Mutates the tracking code in place by id lookup.
pub async fn set_tracking(
    db: &JsonDb,
    id: u64,
    codigo: &str,
) -> Result<Option<Order>, StoreError> {
    db.update_by_id(store::ORDERS, id, &json!({ "rastreio": codigo }))
        .await?
        .map(decode)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn buyer() -> BuyerSnapshot {
        BuyerSnapshot {
            id: 3,
            nome: "Ana".into(),
            email: "a@x.com".into(),
        }
    }

    fn one_item() -> Vec<OrderItem> {
        vec![OrderItem {
            produto_id: 1,
            nome: "Full Spectrum 10%".into(),
            quantidade: 2,
            preco: 199.9,
        }]
    }

    fn payment() -> Payment {
        Payment {
            cartao_final: "1111".into(),
            titular: "Ana".into(),
        }
    }

    #[tokio::test]
    async fn create_appends_with_generated_id_and_timestamp() {
        let dir = tempdir().unwrap();
        let db = JsonDb::new(dir.path());

        let order = create(
            &db,
            buyer(),
            one_item(),
            "Rua A, 1".into(),
            payment(),
            STATUS_SUCCESS,
        )
        .await
        .unwrap();
        assert_eq!(order.id, 1);
        assert_eq!(order.status, STATUS_SUCCESS);
        assert!(order.rastreio.is_none());
        assert!(!order.criado_em.is_empty());
    }

    #[tokio::test]
    async fn list_by_buyer_filters_on_snapshot_id() {
        let dir = tempdir().unwrap();
        let db = JsonDb::new(dir.path());
        create(&db, buyer(), one_item(), "Rua A".into(), payment(), STATUS_SUCCESS)
            .await
            .unwrap();
        let other = BuyerSnapshot {
            id: 9,
            nome: "Bia".into(),
            email: "b@x.com".into(),
        };
        create(&db, other, one_item(), "Rua B".into(), payment(), STATUS_FAILED)
            .await
            .unwrap();

        let mine = list_by_buyer(&db, 3).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].comprador.nome, "Ana");
    }

    #[tokio::test]
    async fn set_tracking_mutates_in_place() {
        let dir = tempdir().unwrap();
        let db = JsonDb::new(dir.path());
        let order = create(&db, buyer(), one_item(), "Rua A".into(), payment(), STATUS_SUCCESS)
            .await
            .unwrap();

        let updated = set_tracking(&db, order.id, "BR123").await.unwrap().unwrap();
        assert_eq!(updated.rastreio.as_deref(), Some("BR123"));

        let reloaded = find(&db, order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.rastreio.as_deref(), Some("BR123"));
    }

    #[tokio::test]
    async fn set_tracking_missing_order_is_none() {
        let dir = tempdir().unwrap();
        let db = JsonDb::new(dir.path());
        assert!(set_tracking(&db, 4, "BR1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn card_allowlist_lookup() {
        let dir = tempdir().unwrap();
        let db = JsonDb::new(dir.path());
        db.save(
            crate::store::CARDS,
            &[json!({ "numero": "4111111111111111", "titular": "Ana" })],
        )
        .await
        .unwrap();

        assert!(card_allowed(&db, "4111111111111111").await.unwrap());
        assert!(!card_allowed(&db, "5555444433332222").await.unwrap());
    }
}
