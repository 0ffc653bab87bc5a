use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument};

use crate::{auth::dto::PublicUser, error::ApiError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/usuarios", get(list_users))
        .route("/admin/usuarios/:id", put(update_user))
        .route("/admin/usuarios/:id", delete(delete_user))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

/// Fields a client patch may never touch: the id is store-generated, the
/// creation stamp is immutable and the hash only changes through the
/// password flow.
const RESERVED_FIELDS: &[&str] = &["id", "criado_em", "password_hash"];

/// Shallow patch on a user record. Role changes land in the store
/// immediately but only reach the guard on the user's next login.
#[instrument(skip(state, patch))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(mut patch): Json<Value>,
) -> Result<Json<PublicUser>, ApiError> {
    if let Value::Object(fields) = &mut patch {
        for field in RESERVED_FIELDS {
            fields.remove(*field);
        }
    }
    let user = state
        .users
        .update(id, patch)
        .await?
        .ok_or(ApiError::NotFound("usuario"))?;
    info!(user_id = id, "user updated");
    Ok(Json(PublicUser::from(user)))
}

/// The only hard delete in the system.
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.users.remove(id).await?;
    info!(user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    async fn seeded_state(dir: &std::path::Path) -> (AppState, u64) {
        let state = AppState::fake(dir);
        let user = state
            .users
            .create(crate::auth::repo::NewUser {
                nome: "Ana".into(),
                email: "a@x.com".into(),
                cpf: None,
                password_hash: "h".into(),
                role: "paciente".into(),
            })
            .await
            .unwrap();
        (state, user.id)
    }

    #[tokio::test]
    async fn patch_changes_role_in_store() {
        let dir = tempdir().unwrap();
        let (state, id) = seeded_state(dir.path()).await;

        let updated = update_user(State(state), Path(id), Json(json!({ "role": "medico" })))
            .await
            .unwrap();
        assert_eq!(updated.0.role, "medico");
    }

    #[tokio::test]
    async fn patch_cannot_touch_reserved_fields() {
        let dir = tempdir().unwrap();
        let (state, id) = seeded_state(dir.path()).await;

        let updated = update_user(
            State(state.clone()),
            Path(id),
            Json(json!({
                "id": 42,
                "criado_em": "1999-01-01T00:00:00Z",
                "password_hash": "forged",
                "nome": "Ana Maria",
            })),
        )
        .await
        .unwrap();
        assert_eq!(updated.0.id, id);
        assert_eq!(updated.0.nome, "Ana Maria");

        let stored = state.users.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "h");
        assert_ne!(stored.criado_em, "1999-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn delete_then_list_is_empty() {
        let dir = tempdir().unwrap();
        let (state, id) = seeded_state(dir.path()).await;

        delete_user(State(state.clone()), Path(id)).await.unwrap();
        let users = list_users(State(state)).await.unwrap();
        assert!(users.0.is_empty());
    }

    #[tokio::test]
    async fn patch_missing_user_is_not_found() {
        let dir = tempdir().unwrap();
        let state = AppState::fake(dir.path());
        let err = update_user(State(state), Path(9), Json(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("usuario")));
    }
}
