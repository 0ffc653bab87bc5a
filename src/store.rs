use std::path::PathBuf;

use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("falha de E/S em {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("categoria de produto desconhecida: {0}")]
    UnknownCategory(String),

    #[error("falha de serialização: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Top-level layout of a collection file. Some collections are bare JSON
/// arrays, others wrap the array in `{ "<name>": [...] }`. The mix is part
/// of the on-disk contract; do not unify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Bare,
    Wrapped(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub file: &'static str,
    pub shape: Shape,
}

pub const USERS: CollectionSpec = CollectionSpec {
    name: "usuario",
    file: "users.json",
    shape: Shape::Wrapped("users"),
};

pub const ORDERS: CollectionSpec = CollectionSpec {
    name: "pedido",
    file: "pedidos.json",
    shape: Shape::Wrapped("pedidos"),
};

pub const PRESCRIPTIONS: CollectionSpec = CollectionSpec {
    name: "receita",
    file: "receitas.json",
    shape: Shape::Bare,
};

/// Allow-listed payment cards, one record per accepted card.
pub const CARDS: CollectionSpec = CollectionSpec {
    name: "cartao",
    file: "cartoes.json",
    shape: Shape::Bare,
};

/// Whole-file JSON persistence over a data directory.
///
/// Every operation is a read-entire-file, mutate-in-memory,
/// write-entire-file cycle with no locking. Two handlers racing on the
/// same collection lose the earlier write (last write wins); this is the
/// documented contract, not an accident to be fixed here.
#[derive(Debug, Clone)]
pub struct JsonDb {
    data_dir: PathBuf,
}

impl JsonDb {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn path(&self, spec: CollectionSpec) -> PathBuf {
        self.data_dir.join(spec.file)
    }

    /// Loads a collection. A missing file or unparseable content resets the
    /// collection to its empty default on disk and returns that default;
    /// data loss is the accepted failure mode here, not an error.
    pub async fn load(&self, spec: CollectionSpec) -> Result<Vec<Value>, StoreError> {
        let path = self.path(spec);
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.save(spec, &[]).await?;
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        let records = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .and_then(|doc| unwrap_records(doc, spec.shape));
        match records {
            Some(r) => Ok(r),
            None => {
                warn!(collection = spec.name, file = spec.file, "unparseable collection, resetting to empty");
                self.save(spec, &[]).await?;
                Ok(Vec::new())
            }
        }
    }

    /// Serializes the whole collection and overwrites the file in place.
    /// No temp-file-then-rename, no fsync beyond the platform default.
    pub async fn save(&self, spec: CollectionSpec, records: &[Value]) -> Result<(), StoreError> {
        let doc = match spec.shape {
            Shape::Bare => Value::Array(records.to_vec()),
            Shape::Wrapped(key) => json!({ key: records }),
        };
        let bytes = serde_json::to_vec_pretty(&doc)?;
        let path = self.path(spec);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::Io {
                path: path.display().to_string(),
                source: e,
            })
    }

    pub async fn find_by_id(
        &self,
        spec: CollectionSpec,
        id: u64,
    ) -> Result<Option<Value>, StoreError> {
        let records = self.load(spec).await?;
        Ok(records.into_iter().find(|r| record_id(r) == Some(id)))
    }

    /// Appends a record, generating its id (1 + max over this file, or 1
    /// when empty) and stamping `criado_em`. Ids are scoped to the backing
    /// file only; two different files can hold the same id.
    pub async fn append(
        &self,
        spec: CollectionSpec,
        mut record: Value,
    ) -> Result<Value, StoreError> {
        let mut records = self.load(spec).await?;
        record["id"] = json!(next_id(&records));
        record["criado_em"] = json!(now_rfc3339());
        records.push(record.clone());
        self.save(spec, &records).await?;
        Ok(record)
    }

    /// Shallow-merges `patch` onto the record with the given id. Returns
    /// `None` without touching the file when the id is absent.
    pub async fn update_by_id(
        &self,
        spec: CollectionSpec,
        id: u64,
        patch: &Value,
    ) -> Result<Option<Value>, StoreError> {
        let mut records = self.load(spec).await?;
        let Some(record) = records.iter_mut().find(|r| record_id(r) == Some(id)) else {
            return Ok(None);
        };
        shallow_merge(record, patch);
        let updated = record.clone();
        self.save(spec, &records).await?;
        Ok(Some(updated))
    }

    /// Filters the record out and writes the result back unconditionally;
    /// deleting an absent id is indistinguishable from a real delete.
    pub async fn remove_by_id(&self, spec: CollectionSpec, id: u64) -> Result<(), StoreError> {
        let mut records = self.load(spec).await?;
        records.retain(|r| record_id(r) != Some(id));
        self.save(spec, &records).await
    }
}

fn unwrap_records(doc: Value, shape: Shape) -> Option<Vec<Value>> {
    match shape {
        Shape::Bare => match doc {
            Value::Array(items) => Some(items),
            _ => None,
        },
        Shape::Wrapped(key) => match doc {
            Value::Object(mut map) => match map.remove(key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            },
            _ => None,
        },
    }
}

fn record_id(record: &Value) -> Option<u64> {
    record.get("id").and_then(Value::as_u64)
}

pub fn next_id(records: &[Value]) -> u64 {
    records.iter().filter_map(record_id).max().unwrap_or(0) + 1
}

fn shallow_merge(record: &mut Value, patch: &Value) {
    if let (Value::Object(target), Value::Object(fields)) = (record, patch) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
