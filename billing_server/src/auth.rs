use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use billing_engine::Identity;
use chrono::Duration;
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    UntrustedToken,
};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

/// The custom claims carried in the access token. The identity provider is the only party that
/// mints these in production; this server only verifies them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user_id: i64,
    #[serde(default)]
    pub is_staff: bool,
}

impl JwtClaims {
    pub fn identity(&self) -> Identity {
        Identity { user_id: self.user_id, is_staff: self.is_staff }
    }
}

/// Extract and verify the bearer token on every authenticated route. WebSocket clients cannot
/// set headers from a browser, so a `token` query parameter is accepted as a fallback.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let verifier = req
        .app_data::<web::Data<TokenVerifier>>()
        .ok_or_else(|| ServerError::InitializeError("No token verifier is configured".to_string()))?;
    let token = token_from_request(req).ok_or(AuthError::MissingToken)?;
    let claims = verifier.validate_token(&token)?;
    Ok(claims)
}

fn token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let value = value.to_str().ok()?;
        return value.strip_prefix("Bearer ").map(|s| s.trim().to_string());
    }
    web::Query::<TokenQuery>::from_query(req.query_string()).ok().and_then(|q| q.into_inner().token)
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Issues access tokens signed with the shared secret. The server itself never mints tokens on a
/// request path; this exists for tooling and tests.
pub struct TokenIssuer {
    key: Hs256Key,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: Hs256Key::new(config.jwt_secret.reveal().as_bytes()) }
    }

    pub fn issue_token(&self, claims: JwtClaims, duration: Option<Duration>) -> Result<String, AuthError> {
        let header = Header::empty().with_token_type("JWT");
        let duration = duration.unwrap_or_else(|| Duration::hours(24));
        let claims = Claims::new(claims).set_duration_and_issuance(&TimeOptions::default(), duration);
        Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::ValidationError(format!("{e}")))
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: Hs256Key,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: Hs256Key::new(config.jwt_secret.reveal().as_bytes()) }
    }

    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(format!("{e}")))?;
        let token = Hs256
            .validator::<JwtClaims>(&self.key)
            .validate(&untrusted)
            .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        token
            .claims()
            .validate_expiration(&TimeOptions::default())
            .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        let claims = token.claims().custom.clone();
        debug!("💻️ Verified access token for user #{}", claims.user_id);
        Ok(claims)
    }
}
