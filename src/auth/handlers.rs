use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::NewUser,
    },
    error::{conflict_field, ApiError},
    roles::{self, Role},
    state::AppState,
    store::StoreError,
};


pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn is_valid_cpf(cpf: &str) -> bool {
    cpf.len() == 11 && cpf.chars().all(|c| c.is_ascii_digit())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.nome.trim().is_empty() {
        return Err(ApiError::Validation("nome"));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("email"));
    }
    if payload.senha.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation("senha"));
    }
    if let Some(cpf) = payload.cpf.as_deref() {
        if !is_valid_cpf(cpf) {
            return Err(ApiError::Validation("cpf"));
        }
    }

    if state.users.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("email"));
    }
    if let Some(cpf) = payload.cpf.as_deref() {
        if state.users.find_by_cpf(cpf).await?.is_some() {
            warn!("cpf already registered");
            return Err(ApiError::Conflict("cpf"));
        }
    }

    let hash = hash_password(&payload.senha)?;
    let user = state
        .users
        .create(NewUser {
            nome: payload.nome.trim().to_string(),
            email: payload.email.clone(),
            cpf: payload.cpf.clone(),
            password_hash: hash,
            role: Role::Patient.as_str().to_string(),
        })
        .await
        .map_err(classify_create_error)?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.role)?;
    let redirect = roles::home_path(&user.role);

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(user),
        redirect,
    }))
}

/// A duplicate-key failure surfaced by a store backend arrives as an
/// opaque message; best-effort mapping to a field-level 409.
fn classify_create_error(e: StoreError) -> ApiError {
    match conflict_field(&e.to_string()) {
        Some(field) => ApiError::Conflict(field),
        None => ApiError::Store(e),
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("email"));
    }

    let user = match state.users.find_by_email(&payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::Unauthorized);
        }
    };

    if !user.ativo {
        warn!(user_id = user.id, "login on inactive account");
        return Err(ApiError::Unauthorized);
    }

    if !verify_password(&payload.senha, &user.password_hash)? {
        warn!(email = %payload.email, user_id = user.id, "login invalid password");
        return Err(ApiError::Unauthorized);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.role)?;
    let redirect = roles::home_path(&user.role);

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(user),
        redirect,
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .users
        .find_by_id(auth.id)
        .await?
        .ok_or(ApiError::NotFound("usuario"))?;
    Ok(Json(PublicUser::from(user)))
}
