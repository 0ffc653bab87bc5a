use std::time::Duration;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap, StatusCode},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{config::JwtConfig, state::AppState};

/// Session token payload. Carries the numeric user id and the raw role
/// string; the role is trusted as-is until the token expires, so a role
/// change only takes effect on re-login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: u64,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_days,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl: Duration::from_secs((ttl_days as u64) * 24 * 60 * 60),
        }
    }
}

impl JwtKeys {
    pub fn sign(&self, user_id: u64, role: &str) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            role: role.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, role, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

/// Pulls the raw token from the `Authorization: Bearer` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Pulls the raw token from the `token` cookie.
pub(crate) fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .find_map(|c| c.trim().strip_prefix("token="))
        })
        .map(str::to_string)
}

/// Extracts and validates the session token, yielding the caller's id and
/// raw role string. Accepts the same two token sources as the guard, so a
/// request the guard lets through never dies here for lack of a header.
#[derive(Debug)]
pub struct AuthUser {
    pub id: u64,
    pub role: String,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_token(&parts.headers))
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing credentials".to_string(),
            ))?;

        let claims = match keys.verify(&token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ));
            }
        };

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }

    #[test]
    fn sign_and_verify_roundtrip_keeps_id_and_role() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let token = keys.sign(7, "medico").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, "medico");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[test]
    fn expiry_is_thirty_days_out() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.sign(1, "paciente").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let bad = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.sign(1, "admin").expect("sign");
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_other_secret() {
        let good = make_keys("secret-a", "iss", "aud");
        let other = make_keys("secret-b", "iss", "aud");
        let token = good.sign(1, "admin").expect("sign");
        assert!(other.verify(&token).is_err());
    }

    async fn extract(keys: &JwtKeys, request: axum::http::Request<()>) -> Result<AuthUser, StatusCode> {
        let (mut parts, _) = request.into_parts();
        AuthUser::from_request_parts(&mut parts, keys)
            .await
            .map_err(|(status, _)| status)
    }

    #[tokio::test]
    async fn extractor_accepts_bearer_header() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.sign(7, "medico").expect("sign");
        let request = axum::http::Request::builder()
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap();

        let user = extract(&keys, request).await.expect("bearer accepted");
        assert_eq!(user.id, 7);
        assert_eq!(user.role, "medico");
    }

    #[tokio::test]
    async fn extractor_accepts_token_cookie() {
        // a cookie-authenticated request passes the guard; it must reach
        // the handler too, not die on a missing Authorization header
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.sign(3, "paciente").expect("sign");
        let request = axum::http::Request::builder()
            .header(header::COOKIE, format!("theme=dark; token={token}"))
            .body(())
            .unwrap();

        let user = extract(&keys, request).await.expect("cookie accepted");
        assert_eq!(user.id, 3);
        assert_eq!(user.role, "paciente");
    }

    #[tokio::test]
    async fn extractor_rejects_missing_and_invalid_tokens() {
        let keys = make_keys("dev-secret", "iss", "aud");

        let bare = axum::http::Request::builder().body(()).unwrap();
        assert_eq!(extract(&keys, bare).await.unwrap_err(), StatusCode::UNAUTHORIZED);

        let garbage = axum::http::Request::builder()
            .header(header::COOKIE, "token=not-a-jwt")
            .body(())
            .unwrap();
        assert_eq!(
            extract(&keys, garbage).await.unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
    }
}
