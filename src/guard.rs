use axum::{
    extract::{FromRef, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::{
    auth::jwt::{bearer_token, cookie_token, JwtKeys},
    roles::Role,
    state::AppState,
};

/// Paths that bypass every check: the auth endpoints, diagnostic
/// endpoints, the public catalog read and the navigational pages the
/// guard itself redirects to.
const PUBLIC_PATHS: &[&str] = &[
    "/auth/register",
    "/auth/login",
    "/health",
    "/version",
    "/produtos",
    "/login",
    "/unauthorized",
];

const LOGIN_PATH: &str = "/login";
const UNAUTHORIZED_PATH: &str = "/unauthorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    RedirectLogin,
    RedirectUnauthorized,
}

/// The guard's whole policy, as a pure function over the request path and
/// the (already verified) role string from the token.
///
/// Paths outside the four known prefixes are granted to any authenticated
/// identity, whatever its role. That catch-all is the observed behavior of
/// the system this replaces and is kept deliberately; see DESIGN.md before
/// tightening it.
pub fn evaluate(path: &str, role: Option<&str>) -> Access {
    if PUBLIC_PATHS.contains(&path) {
        return Access::Allow;
    }

    let Some(raw) = role else {
        return Access::RedirectLogin;
    };
    let role = Role::parse(raw);

    let allowed = if under(path, "/admin") {
        role == Some(Role::Admin)
    } else if under(path, "/medic") {
        matches!(role, Some(Role::Admin | Role::Doctor))
    } else if under(path, "/acolhimento") {
        matches!(role, Some(Role::Admin | Role::Reception))
    } else if under(path, "/paciente") {
        // every recognized role may enter the patient area
        role.is_some()
    } else {
        true
    };

    if allowed {
        Access::Allow
    } else {
        Access::RedirectUnauthorized
    }
}

/// Whole-segment prefix match: `/admin` and `/admin/...` are the admin
/// area, a sibling path like `/administracao` is not.
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Middleware wrapper around [`evaluate`]. Decides allow/redirect and
/// nothing else; it never mutates state.
pub async fn access_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let role = identity_role(&state, req.headers());
    match evaluate(req.uri().path(), role.as_deref()) {
        Access::Allow => next.run(req).await,
        Access::RedirectLogin => {
            debug!(path = req.uri().path(), "anonymous request, redirecting to login");
            Redirect::to(LOGIN_PATH).into_response()
        }
        Access::RedirectUnauthorized => {
            debug!(path = req.uri().path(), role = ?role, "role not allowed, redirecting");
            Redirect::to(UNAUTHORIZED_PATH).into_response()
        }
    }
}

/// Extracts the raw role string from the request's token, if any. A token
/// that fails verification counts as no token at all. The role inside a
/// valid token is trusted as-is for the token's lifetime; role changes
/// only take effect on re-login.
fn identity_role(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let token = bearer_token(headers).or_else(|| cookie_token(headers))?;
    let keys = JwtKeys::from_ref(state);
    keys.verify(&token).ok().map(|claims| claims.role)
}
