//! JWT bearer check for protected routes

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, errors::Error as JwtError, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{handlers::ErrorBody, AppState};
use crate::config::JwtConfig;

/// Claims read from an accepted token
///
/// `exp`, `iss` and `aud` are checked by the validator before this is built.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: u64,
}

/// HS256 token validator for one issuer/audience pair
pub struct JwtAuth {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(config.key.as_bytes()),
            validation,
        }
    }

    /// Checks signature, algorithm, expiry, issuer and audience
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.key, &self.validation).map(|data| data.claims)
    }
}

/// Rejects requests without a valid `Authorization: Bearer <jwt>`
///
/// Passes everything through when no JWT key is configured.
pub async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(auth) = state.auth.as_deref() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token);

    let Some(token) = provided else {
        warn!(uri = %request.uri(), "Rejected request without bearer token");
        return unauthorized();
    };

    match auth.verify(token) {
        Ok(claims) => {
            debug!(sub = ?claims.sub, exp = claims.exp, "Accepted bearer token");
            next.run(request).await
        }
        Err(e) => {
            warn!(uri = %request.uri(), reason = ?e.kind(), "Rejected request with invalid bearer token");
            unauthorized()
        }
    }
}

/// Extracts the token from an `Authorization` header value
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(ErrorBody::new("Missing or invalid bearer token.")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, errors::ErrorKind, EncodingKey, Header};
    use serde_json::{json, Value};

    const KEY: &str = "test-secret";

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new(KEY))
    }

    fn sign(claims: &Value, key: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(key.as_bytes())).unwrap()
    }

    fn claims(exp_offset_secs: i64) -> Value {
        json!({
            "sub": "pilot",
            "iss": "starship-proxy",
            "aud": "starship-proxy",
            "exp": Utc::now().timestamp() + exp_offset_secs,
        })
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("  Bearer   abc  "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn test_verify_accepts_valid_token() {
        let token = sign(&claims(300), KEY);

        let claims = auth().verify(&token).expect("Valid token should verify");

        assert_eq!(claims.sub.as_deref(), Some("pilot"));
    }

    #[test]
    fn test_verify_rejects_recently_expired_token() {
        // No leeway: even a few seconds past exp is rejected.
        let token = sign(&claims(-5), KEY);

        let err = auth().verify(&token).unwrap_err();

        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn test_verify_rejects_wrong_issuer_and_audience() {
        let mut wrong_iss = claims(300);
        wrong_iss["iss"] = json!("someone-else");
        let mut wrong_aud = claims(300);
        wrong_aud["aud"] = json!("other-service");

        let iss_err = auth().verify(&sign(&wrong_iss, KEY)).unwrap_err();
        let aud_err = auth().verify(&sign(&wrong_aud, KEY)).unwrap_err();

        assert!(matches!(iss_err.kind(), ErrorKind::InvalidIssuer));
        assert!(matches!(aud_err.kind(), ErrorKind::InvalidAudience));
    }

    #[test]
    fn test_verify_rejects_bad_signature() {
        let token = sign(&claims(300), "another-secret");

        let err = auth().verify(&token).unwrap_err();

        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
    }

    #[test]
    fn test_verify_requires_exp() {
        let mut no_exp = claims(300);
        no_exp.as_object_mut().unwrap().remove("exp");

        assert!(auth().verify(&sign(&no_exp, KEY)).is_err());
    }

    #[test]
    fn test_verify_rejects_other_algorithms() {
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims(300),
            &EncodingKey::from_secret(KEY.as_bytes()),
        )
        .unwrap();

        assert!(auth().verify(&token).is_err());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(auth().verify("not.a.jwt").is_err());
    }
}
