use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    orders::{
        dto::{CreateOrderRequest, TrackingRequest},
        repo::{self, BuyerSnapshot, Order, Payment},
    },
    state::AppState,
};

pub fn patient_routes() -> Router<AppState> {
    Router::new()
        .route("/paciente/pedidos", post(create_order))
        .route("/paciente/pedidos", get(list_my_orders))
        .route("/paciente/pedidos/:id", get(get_my_order))
}

pub fn reception_routes() -> Router<AppState> {
    Router::new().route("/acolhimento/pedidos", get(list_all_orders))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/pedidos", get(list_all_orders))
        .route("/admin/pedidos/:id/rastreio", put(set_tracking))
}

/// Creates an order with the buyer snapshotted from the caller's token.
/// The card is checked against the allowlist; a rejected card still
/// records the order, with status `falha`.
#[instrument(skip(state, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    if payload.itens.is_empty() {
        return Err(ApiError::Validation("itens"));
    }
    if payload.endereco.trim().is_empty() {
        return Err(ApiError::Validation("endereco"));
    }
    if payload.cartao.trim().is_empty() {
        return Err(ApiError::Validation("cartao"));
    }

    let user = state
        .users
        .find_by_id(auth.id)
        .await?
        .ok_or(ApiError::NotFound("usuario"))?;
    let comprador = BuyerSnapshot {
        id: user.id,
        nome: user.nome,
        email: user.email,
    };

    let status = if repo::card_allowed(&state.db, payload.cartao.trim()).await? {
        repo::STATUS_SUCCESS
    } else {
        warn!(user_id = auth.id, "card not on allowlist, order failed");
        repo::STATUS_FAILED
    };

    let last_four = payload
        .cartao
        .trim()
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<String>();
    let pagamento = Payment {
        cartao_final: last_four,
        titular: payload.titular,
    };

    let order = repo::create(
        &state.db,
        comprador,
        payload.itens,
        payload.endereco,
        pagamento,
        status,
    )
    .await?;

    info!(order_id = order.id, status = %order.status, "order created");
    Ok((StatusCode::CREATED, Json(order)))
}

#[instrument(skip(state))]
pub async fn list_my_orders(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = repo::list_by_buyer(&state.db, auth.id).await?;
    Ok(Json(orders))
}

/// A patient sees only their own orders; someone else's id answers 404,
/// not 403, so order ids cannot be probed.
#[instrument(skip(state))]
pub async fn get_my_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<u64>,
) -> Result<Json<Order>, ApiError> {
    let order = repo::find(&state.db, id)
        .await?
        .filter(|o| o.comprador.id == auth.id)
        .ok_or(ApiError::NotFound("pedido"))?;
    Ok(Json(order))
}

#[instrument(skip(state))]
pub async fn list_all_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = repo::list(&state.db).await?;
    Ok(Json(orders))
}

#[instrument(skip(state, payload))]
pub async fn set_tracking(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<TrackingRequest>,
) -> Result<Json<Order>, ApiError> {
    if payload.codigo.trim().is_empty() {
        return Err(ApiError::Validation("codigo"));
    }
    let order = repo::set_tracking(&state.db, id, payload.codigo.trim())
        .await?
        .ok_or(ApiError::NotFound("pedido"))?;
    info!(order_id = id, "tracking code set");
    Ok(Json(order))
}
