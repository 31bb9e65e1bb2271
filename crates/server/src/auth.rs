//! Static bearer-token auth for the two console roles.

use axum::http::HeaderMap;
use secrecy::ExposeSecret;

use donorway_core::config::AuthConfig;
use donorway_core::errors::ApiErrorKind;

use crate::api::{api_error, ApiFailure};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Staff,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn resolve_role(token: &str, auth: &AuthConfig) -> Option<Role> {
    if token == auth.admin_token.expose_secret() {
        return Some(Role::Admin);
    }
    if let Some(staff_token) = &auth.staff_token {
        if token == staff_token.expose_secret() {
            return Some(Role::Staff);
        }
    }
    None
}

/// Missing or unrecognized credentials are 401; a valid staff token on an
/// admin endpoint is 403.
pub fn require_role(headers: &HeaderMap, auth: &AuthConfig, required: Role) -> Result<Role, ApiFailure> {
    let token = bearer_token(headers)
        .ok_or_else(|| api_error(ApiErrorKind::Unauthorized, "missing bearer credential"))?;

    let role = resolve_role(token, auth)
        .ok_or_else(|| api_error(ApiErrorKind::Unauthorized, "unrecognized credential"))?;

    match (required, role) {
        (Role::Admin, Role::Staff) => {
            Err(api_error(ApiErrorKind::Forbidden, "admin role required"))
        }
        _ => Ok(role),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, StatusCode};

    use donorway_core::config::AuthConfig;

    use super::{require_role, Role};

    fn auth() -> AuthConfig {
        AuthConfig {
            admin_token: "admin-secret".to_string().into(),
            staff_token: Some("staff-secret".to_string().into()),
        }
    }

    fn headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).expect("header value"),
        );
        headers
    }

    #[test]
    fn missing_credential_is_unauthorized() {
        let result = require_role(&HeaderMap::new(), &auth(), Role::Staff);
        assert_eq!(result.unwrap_err().0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn unknown_token_is_unauthorized() {
        let result = require_role(&headers("wrong-token"), &auth(), Role::Staff);
        assert_eq!(result.unwrap_err().0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn staff_token_on_admin_endpoint_is_forbidden() {
        let result = require_role(&headers("staff-secret"), &auth(), Role::Admin);
        assert_eq!(result.unwrap_err().0, StatusCode::FORBIDDEN);
    }

    #[test]
    fn admin_token_satisfies_staff_endpoints() {
        let role = require_role(&headers("admin-secret"), &auth(), Role::Staff).expect("allowed");
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn staff_token_satisfies_staff_endpoints() {
        let role = require_role(&headers("staff-secret"), &auth(), Role::Staff).expect("allowed");
        assert_eq!(role, Role::Staff);
    }
}
