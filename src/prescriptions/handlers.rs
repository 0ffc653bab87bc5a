use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    prescriptions::{
        dto::{PrescriptionQuery, UploadPrescriptionRequest, ValidatePrescriptionRequest},
        repo::{self, PersonSnapshot, Prescription},
    },
    state::AppState,
};

pub fn patient_routes() -> Router<AppState> {
    Router::new()
        .route("/paciente/receitas", post(upload_prescription))
        .route("/paciente/receitas", get(list_my_prescriptions))
}

pub fn medic_routes() -> Router<AppState> {
    Router::new()
        .route("/medic/receitas", get(list_prescriptions))
        .route("/medic/receitas/:id/validar", put(validate_prescription))
}

async fn snapshot_of(state: &AppState, id: u64) -> Result<PersonSnapshot, ApiError> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("usuario"))?;
    Ok(PersonSnapshot {
        id: user.id,
        nome: user.nome,
        email: user.email,
    })
}

#[instrument(skip(state, payload))]
pub async fn upload_prescription(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UploadPrescriptionRequest>,
) -> Result<(StatusCode, Json<Prescription>), ApiError> {
    if payload.arquivo.trim().is_empty() {
        return Err(ApiError::Validation("arquivo"));
    }
    if payload.medicamentos.is_empty() {
        return Err(ApiError::Validation("medicamentos"));
    }

    let paciente = snapshot_of(&state, auth.id).await?;
    let prescription = repo::create(
        &state.db,
        paciente,
        payload.medicamentos,
        payload.arquivo,
        payload.emitida_em,
        payload.valida_ate,
    )
    .await?;

    info!(prescription_id = prescription.id, "prescription uploaded");
    Ok((StatusCode::CREATED, Json(prescription)))
}

#[instrument(skip(state))]
pub async fn list_my_prescriptions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Prescription>>, ApiError> {
    let prescriptions = repo::list_by_patient(&state.db, auth.id).await?;
    Ok(Json(prescriptions))
}

#[instrument(skip(state))]
pub async fn list_prescriptions(
    State(state): State<AppState>,
    Query(q): Query<PrescriptionQuery>,
) -> Result<Json<Vec<Prescription>>, ApiError> {
    let prescriptions = repo::list(&state.db, q.status.as_deref()).await?;
    Ok(Json(prescriptions))
}

#[instrument(skip(state, payload))]
pub async fn validate_prescription(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<u64>,
    Json(payload): Json<ValidatePrescriptionRequest>,
) -> Result<Json<Prescription>, ApiError> {
    let status = match payload.status.as_str() {
        repo::STATUS_APPROVED | repo::STATUS_REJECTED => payload.status.as_str(),
        _ => return Err(ApiError::Validation("status")),
    };

    let medico = snapshot_of(&state, auth.id).await?;
    let prescription = repo::validate(
        &state.db,
        id,
        status,
        medico,
        payload.medicamentos,
        payload.observacoes,
    )
    .await?
    .ok_or(ApiError::NotFound("receita"))?;

    info!(prescription_id = id, status, "prescription validated");
    Ok(Json(prescription))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn state_with_users(dir: &std::path::Path) -> (AppState, AuthUser, AuthUser) {
        let state = AppState::fake(dir);
        let patient = state
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
        let doctor = state
            .users
            .create(crate::auth::repo::NewUser {
                nome: "Dr. Beto".into(),
                email: "b@x.com".into(),
                cpf: None,
                password_hash: "h".into(),
                role: "medico".into(),
            })
            .await
            .unwrap();
        (
            state,
            AuthUser {
                id: patient.id,
                role: patient.role,
            },
            AuthUser {
                id: doctor.id,
                role: doctor.role,
            },
        )
    }

    #[tokio::test]
    async fn upload_then_validate_flow() {
        let dir = tempdir().unwrap();
        let (state, patient, doctor) = state_with_users(dir.path()).await;

        let (status, uploaded) = upload_prescription(
            State(state.clone()),
            patient,
            Json(UploadPrescriptionRequest {
                arquivo: "uploads/r1.pdf".into(),
                medicamentos: vec!["CBD 10%".into()],
                emitida_em: None,
                valida_ate: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(uploaded.0.status, repo::STATUS_PENDING);

        let validated = validate_prescription(
            State(state),
            doctor,
            Path(uploaded.0.id),
            Json(ValidatePrescriptionRequest {
                status: repo::STATUS_APPROVED.into(),
                medicamentos: None,
                observacoes: Some("ok".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(validated.0.status, repo::STATUS_APPROVED);
        assert_eq!(validated.0.medico.unwrap().nome, "Dr. Beto");
    }

    #[tokio::test]
    async fn validate_rejects_unknown_status() {
        let dir = tempdir().unwrap();
        let (state, _patient, doctor) = state_with_users(dir.path()).await;

        let err = validate_prescription(
            State(state),
            doctor,
            Path(1),
            Json(ValidatePrescriptionRequest {
                status: "talvez".into(),
                medicamentos: None,
                observacoes: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation("status")));
    }

    #[tokio::test]
    async fn upload_requires_file_and_medications() {
        let dir = tempdir().unwrap();
        let (state, patient, _doctor) = state_with_users(dir.path()).await;

        let err = upload_prescription(
            State(state),
            patient,
            Json(UploadPrescriptionRequest {
                arquivo: "f.pdf".into(),
                medicamentos: vec![],
                emitida_em: None,
                valida_ate: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation("medicamentos")));
    }
}
