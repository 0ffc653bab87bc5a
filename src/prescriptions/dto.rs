use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UploadPrescriptionRequest {
    pub arquivo: String,
    pub medicamentos: Vec<String>,
    #[serde(default)]
    pub emitida_em: Option<String>,
    #[serde(default)]
    pub valida_ate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidatePrescriptionRequest {
    /// `aprovada` or `rejeitada`.
    pub status: String,
    #[serde(default)]
    pub medicamentos: Option<Vec<String>>,
    #[serde(default)]
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PrescriptionQuery {
    #[serde(default)]
    pub status: Option<String>,
}
