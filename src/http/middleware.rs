//! Authentication middleware and JWT verification

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::app::AppState;
use crate::util::time::unix_secs;

type HmacSha256 = Hmac<Sha256>;

/// Audience Supabase stamps on signed-in user tokens
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// JWT claims from Supabase auth token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Audience
    #[serde(default)]
    pub aud: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: u64,
    /// Email (if available)
    #[serde(default)]
    pub email: Option<String>,
    /// Role
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Deserialize)]
struct JwtHeader {
    alg: String,
}

/// Verify a JWT token and extract claims
pub fn verify_jwt(token: &str, secret: &str) -> Result<JwtClaims, AuthError> {
    verify_jwt_at(token, secret, unix_secs())
}

/// Verify a JWT token against an explicit clock
pub fn verify_jwt_at(token: &str, secret: &str, now: u64) -> Result<JwtClaims, AuthError> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::InvalidToken);
    };

    let header: JwtHeader = URL_SAFE_NO_PAD
        .decode(header_b64)
        .ok()
        .and_then(|raw| serde_json::from_slice(&raw).ok())
        .ok_or(AuthError::InvalidToken)?;
    if header.alg != "HS256" {
        return Err(AuthError::InvalidToken);
    }

    // Verify signature (HMAC-SHA256, constant-time compare)
    let provided_signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AuthError::InvalidToken)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&provided_signature)
        .map_err(|_| AuthError::InvalidToken)?;

    // Decode payload
    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AuthError::InvalidToken)?;

    let claims: JwtClaims =
        serde_json::from_slice(&payload_json).map_err(|_| AuthError::InvalidToken)?;

    if claims.exp < now {
        return Err(AuthError::TokenExpired);
    }

    if let Some(aud) = &claims.aud {
        if aud != AUTHENTICATED_AUDIENCE {
            return Err(AuthError::InvalidAudience);
        }
    }

    Ok(claims)
}

/// Sign claims as an HS256 JWT, the way Supabase issues access tokens
pub fn sign_jwt(claims: &JwtClaims, secret: &str) -> Result<String, AuthError> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = serde_json::to_vec(claims).map_err(|_| AuthError::InvalidToken)?;
    let payload = URL_SAFE_NO_PAD.encode(payload);

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(format!("{}.{}", header, payload).as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}.{}", header, payload, signature))
}

/// Extract JWT from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Authentication error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Invalid authorization header format")]
    InvalidFormat,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid audience")]
    InvalidAudience,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::MissingHeader => StatusCode::UNAUTHORIZED,
            AuthError::InvalidFormat => StatusCode::BAD_REQUEST,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::InvalidAudience => StatusCode::UNAUTHORIZED,
        };

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Authenticated user extractor result
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub claims: JwtClaims,
}

impl From<JwtClaims> for AuthenticatedUser {
    fn from(claims: JwtClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
            claims,
        }
    }
}

/// Resolve the caller from request headers
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthenticatedUser, AuthError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingHeader)?;

    let token = extract_bearer_token(auth_header).ok_or(AuthError::InvalidFormat)?;

    verify_jwt(token, secret).map(AuthenticatedUser::from)
}

/// Like [`authenticate`], but anonymous or invalid callers yield `None`
pub fn optional_user(headers: &HeaderMap, secret: &str) -> Option<AuthenticatedUser> {
    authenticate(headers, secret).ok()
}

/// Middleware to require authentication
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_user = authenticate(request.headers(), &state.config.supabase_jwt_secret)?;

    // Insert into request extensions for handlers to access
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "super-secret-jwt-token";

    fn claims(exp: u64) -> JwtClaims {
        JwtClaims {
            sub: Uuid::nil(),
            aud: Some(AUTHENTICATED_AUDIENCE.to_string()),
            exp,
            iat: 0,
            email: Some("learner@example.com".to_string()),
            role: Some("authenticated".to_string()),
        }
    }

    #[test]
    fn round_trips_signed_token() {
        let token = sign_jwt(&claims(2_000), SECRET).unwrap();
        let verified = verify_jwt_at(&token, SECRET, 1_000).unwrap();
        assert_eq!(verified.sub, Uuid::nil());
        assert_eq!(verified.email.as_deref(), Some("learner@example.com"));
    }

    #[test]
    fn rejects_expired_token() {
        let token = sign_jwt(&claims(999), SECRET).unwrap();
        assert!(matches!(
            verify_jwt_at(&token, SECRET, 1_000),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn rejects_wrong_secret_and_garbage() {
        let token = sign_jwt(&claims(2_000), SECRET).unwrap();
        assert!(matches!(
            verify_jwt_at(&token, "other", 1_000),
            Err(AuthError::InvalidToken)
        ));
        assert!(verify_jwt_at("a.b", SECRET, 1_000).is_err());
        assert!(verify_jwt_at("a.b.c.d", SECRET, 1_000).is_err());
    }

    #[test]
    fn rejects_foreign_audience() {
        let mut c = claims(2_000);
        c.aud = Some("service".to_string());
        let token = sign_jwt(&c, SECRET).unwrap();
        assert!(matches!(
            verify_jwt_at(&token, SECRET, 1_000),
            Err(AuthError::InvalidAudience)
        ));
    }

    #[test]
    fn authenticate_checks_scheme() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            authenticate(&headers, SECRET),
            Err(AuthError::MissingHeader)
        ));

        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            authenticate(&headers, SECRET),
            Err(AuthError::InvalidFormat)
        ));
        assert!(optional_user(&headers, SECRET).is_none());
    }
}
