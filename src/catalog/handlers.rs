use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};

use crate::{
    catalog::{
        dto::{CatalogQuery, CreateProductRequest},
        repo::{self, Product},
    },
    error::ApiError,
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/produtos", get(list_products))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/produtos", post(create_product))
        .route("/admin/produtos/:id", put(update_product))
        .route("/admin/produtos/:id", delete(delete_product))
}

/// Public catalog read. An unknown `tipo` silently serves the default
/// category file.
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(q): Query<CatalogQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = repo::list(&state.db, q.tipo.as_deref()).await?;
    Ok(Json(products))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    if payload.nome.trim().is_empty() {
        return Err(ApiError::Validation("nome"));
    }
    if payload.tipo.trim().is_empty() {
        return Err(ApiError::Validation("tipo"));
    }

    let record = json!({
        "nome": payload.nome,
        "tipo": payload.tipo,
        "canabinoide": payload.canabinoide,
        "quantidade": payload.quantidade,
        "preco": payload.preco,
        "foto": payload.foto,
        "descricao": payload.descricao,
    });
    let product = repo::create(&state.db, record, &payload.tipo).await?;

    info!(id = product.id, tipo = %product.tipo, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Shallow patch on a product; `tipo` selects the backing file via the
/// query string, same as delete.
#[instrument(skip(state, patch))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(q): Query<CatalogQuery>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Product>, ApiError> {
    let tipo = q.tipo.as_deref().ok_or(ApiError::Validation("tipo"))?;
    let updated = repo::update(&state.db, tipo, id, &patch)
        .await?
        .ok_or(ApiError::NotFound("produto"))?;
    info!(id, tipo, "product updated");
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(q): Query<CatalogQuery>,
) -> Result<StatusCode, ApiError> {
    let tipo = q.tipo.as_deref().ok_or(ApiError::Validation("tipo"))?;
    repo::remove(&state.db, tipo, id).await?;
    info!(id, tipo, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
