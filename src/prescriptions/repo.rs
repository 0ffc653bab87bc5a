use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::store::{self, JsonDb, StoreError};

pub const STATUS_PENDING: &str = "pendente";
pub const STATUS_APPROVED: &str = "aprovada";
pub const STATUS_REJECTED: &str = "rejeitada";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonSnapshot {
    pub id: u64,
    pub nome: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: u64,
    pub paciente: PersonSnapshot,
    /// Stamped by the validating doctor; absent while pending.
    #[serde(default)]
    pub medico: Option<PersonSnapshot>,
    pub medicamentos: Vec<String>,
    #[serde(default)]
    pub emitida_em: Option<String>,
    #[serde(default)]
    pub valida_ate: Option<String>,
    pub status: String,
    /// Opaque reference to the uploaded file; extraction happens elsewhere.
    pub arquivo: String,
    #[serde(default)]
    pub observacoes: Option<String>,
    #[serde(default)]
    pub criado_em: String,
}

fn decode(record: Value) -> Result<Prescription, StoreError> {
    serde_json::from_value(record).map_err(StoreError::from)
}

pub async fn create(
    db: &JsonDb,
    paciente: PersonSnapshot,
    medicamentos: Vec<String>,
    arquivo: String,
    emitida_em: Option<String>,
    valida_ate: Option<String>,
) -> Result<Prescription, StoreError> {
    let record = json!({
        "paciente": paciente,
        "medico": null,
        "medicamentos": medicamentos,
        "emitida_em": emitida_em,
        "valida_ate": valida_ate,
        "status": STATUS_PENDING,
        "arquivo": arquivo,
        "observacoes": null,
    });
    let stored = db.append(store::PRESCRIPTIONS, record).await?;
    decode(stored)
}

pub async fn list(db: &JsonDb, status: Option<&str>) -> Result<Vec<Prescription>, StoreError> {
    let records = db.load(store::PRESCRIPTIONS).await?;
    let all: Result<Vec<_>, _> = records.into_iter().map(decode).collect();
    let all = all?;
    Ok(match status {
        Some(s) => all.into_iter().filter(|p| p.status == s).collect(),
        None => all,
    })
}

pub async fn list_by_patient(db: &JsonDb, patient_id: u64) -> Result<Vec<Prescription>, StoreError> {
    let all = list(db, None).await?;
    Ok(all
        .into_iter()
        .filter(|p| p.paciente.id == patient_id)
        .collect())
}

/// The validation step: flips the status, optionally replaces the
/// medication list and notes, and stamps the validating doctor.
pub async fn validate(
    db: &JsonDb,
    id: u64,
    status: &str,
    medico: PersonSnapshot,
    medicamentos: Option<Vec<String>>,
    observacoes: Option<String>,
) -> Result<Option<Prescription>, StoreError> {
    let mut patch = json!({
        "status": status,
        "medico": medico,
    });
    if let Some(meds) = medicamentos {
        patch["medicamentos"] = json!(meds);
    }
    if let Some(obs) = observacoes {
        patch["observacoes"] = json!(obs);
    }
    db.update_by_id(store::PRESCRIPTIONS, id, &patch)
        .await?
        .map(decode)
        .transpose()
}
