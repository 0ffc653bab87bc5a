use serde::Deserialize;

use super::repo::OrderItem;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub itens: Vec<OrderItem>,
    pub endereco: String,
    pub cartao: String,
    pub titular: String,
}

#[derive(Debug, Deserialize)]
pub struct TrackingRequest {
    pub codigo: String,
}
