use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub tipo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
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
}
