use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::store::{self, JsonDb, StoreError};

/// User record as persisted in the users collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub nome: String,
    pub email: String,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Raw role string as stored; normalized via [`crate::roles::Role`]
    /// only at the boundaries that need it.
    pub role: String,
    #[serde(default = "default_true")]
    pub ativo: bool,
    #[serde(default)]
    pub criado_em: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub nome: String,
    pub email: String,
    pub cpf: Option<String>,
    pub password_hash: String,
    pub role: String,
}

/// The single source of truth for users. Exactly one implementation is
/// active at a time: the file-backed store in production, the in-memory
/// store in tests.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<User>, StoreError>;
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
    async fn update(&self, id: u64, patch: Value) -> Result<Option<User>, StoreError>;
    async fn remove(&self, id: u64) -> Result<(), StoreError>;
}

/// File-backed store over the users collection.
pub struct JsonUserStore {
    db: JsonDb,
}

impl JsonUserStore {
    pub fn new(db: JsonDb) -> Self {
        Self { db }
    }
}

fn decode(record: Value) -> Result<User, StoreError> {
    serde_json::from_value(record).map_err(StoreError::from)
}

#[async_trait]
impl UserStore for JsonUserStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let records = self.db.load(store::USERS).await?;
        records.into_iter().map(decode).collect()
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        self.db
            .find_by_id(store::USERS, id)
            .await?
            .map(decode)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.list().await?;
        Ok(users.into_iter().find(|u| u.email == email))
    }

    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<User>, StoreError> {
        let users = self.list().await?;
        Ok(users.into_iter().find(|u| u.cpf.as_deref() == Some(cpf)))
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let record = json!({
            "nome": new.nome,
            "email": new.email,
            "cpf": new.cpf,
            "password_hash": new.password_hash,
            "role": new.role,
            "ativo": true,
        });
        let stored = self.db.append(store::USERS, record).await?;
        decode(stored)
    }

    async fn update(&self, id: u64, patch: Value) -> Result<Option<User>, StoreError> {
        self.db
            .update_by_id(store::USERS, id, &patch)
            .await?
            .map(decode)
            .transpose()
    }

    async fn remove(&self, id: u64) -> Result<(), StoreError> {
        self.db.remove_by_id(store::USERS, id).await
    }
}

/// In-memory store for tests; same id-generation contract as the file
/// store (1 + max, scoped to this store).
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.lock().await.clone())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.cpf.as_deref() == Some(cpf))
            .cloned())
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let user = User {
            id,
            nome: new.nome,
            email: new.email,
            cpf: new.cpf,
            password_hash: new.password_hash,
            role: new.role,
            ativo: true,
            criado_em: store::now_rfc3339(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: u64, patch: Value) -> Result<Option<User>, StoreError> {
        let mut users = self.users.lock().await;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        let mut record = serde_json::to_value(&*user)?;
        record["password_hash"] = json!(user.password_hash);
        if let (Value::Object(target), Value::Object(fields)) = (&mut record, &patch) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        *user = serde_json::from_value(record)?;
        Ok(Some(user.clone()))
    }

    async fn remove(&self, id: u64) -> Result<(), StoreError> {
        self.users.lock().await.retain(|u| u.id != id);
        Ok(())
    }
}
