use serde::{Deserialize, Serialize};

use super::repo::User;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub nome: String,
    pub email: String,
    pub senha: String,
    #[serde(default)]
    pub cpf: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub senha: String,
}

/// Response returned after register or login: the session token, the
/// public user and the area the UI should navigate to.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
    pub redirect: &'static str,
}

/// Public part of the user returned to clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: u64,
    pub nome: String,
    pub email: String,
    pub role: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            nome: u.nome,
            email: u.email,
            role: u.role,
        }
    }
}
