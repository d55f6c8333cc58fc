use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

/// Claims
///
/// The identity attributes carried inside a session token, as exposed to the rest of the
/// service. Field names on the wire follow the issuer (`sub`, `iat`, `exp`); missing string
/// fields decode as empty and missing timestamps as `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Claims {
    /// Opaque user id (`sub`).
    #[serde(rename = "sub")]
    pub subject: String,
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub profile_id: String,
    pub server_id: String,
    /// Epoch seconds (`iat`).
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Epoch seconds (`exp`).
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl Claims {
    /// A record is usable for authorization only when `subject`, `username` and `email`
    /// are all non-empty. A well-formed token alone is not enough.
    pub fn is_complete(&self) -> bool {
        !self.subject.is_empty() && !self.username.is_empty() && !self.email.is_empty()
    }
}

/// TokenPayload
///
/// The payload exactly as the issuer wrote it. It may carry the account's `private_key`,
/// which must never leave this module: the only way out is [`TokenPayload::sanitize`].
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPayload {
    #[serde(flatten)]
    claims: Claims,
    #[serde(default)]
    private_key: Option<String>,
}

impl TokenPayload {
    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// Drops `private_key` and returns the claims safe to hand to callers.
    pub fn sanitize(self) -> Claims {
        self.claims
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("token must have 3 segments, found {0}")]
    Segments(usize),
    #[error("token segment is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("token segment is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("token header does not name an algorithm")]
    Header,
    #[error("token has expired")]
    Expired,
    #[error("token signature rejected: {0}")]
    Signature(String),
}

fn split_token(token: &str) -> Result<[&str; 3], DecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    match segments.as_slice() {
        [header, payload, signature] => Ok([*header, *payload, *signature]),
        other => Err(DecodeError::Segments(other.len())),
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(URL_SAFE_NO_PAD.decode(segment.trim_end_matches('='))?)
}

/// decode_unverified
///
/// Reads the payload of a JWS without checking its signature. The header must decode to a
/// JSON object naming an `alg`; the signature segment may be empty.
pub fn decode_unverified(token: &str) -> Result<TokenPayload, DecodeError> {
    let [header, payload, _signature] = split_token(token)?;

    let header: Value = serde_json::from_slice(&decode_segment(header)?)?;
    if !header.get("alg").is_some_and(Value::is_string) {
        return Err(DecodeError::Header);
    }

    Ok(serde_json::from_slice(&decode_segment(payload)?)?)
}

/// decode_structured
///
/// Parses the token into the typed payload, failing on a wrong segment count, bad
/// base64url or a payload that is not a JSON object. Header and signature are not inspected.
pub fn decode_structured(token: &str) -> Result<TokenPayload, DecodeError> {
    let [_header, payload, _signature] = split_token(token)?;
    let payload: Value = serde_json::from_slice(&decode_segment(payload)?)?;
    if !payload.is_object() {
        return Err(DecodeError::Json(<serde_json::Error as serde::de::Error>::custom(
            "payload is not a JSON object",
        )));
    }
    Ok(serde_json::from_value(payload)?)
}

/// decode_verified
///
/// Checks the HS256 signature against `key` and rejects expired tokens before reading
/// the payload.
pub fn decode_verified(token: &str, key: &DecodingKey) -> Result<TokenPayload, DecodeError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<TokenPayload>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => DecodeError::Expired,
            _ => DecodeError::Signature(e.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(value: &Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    #[test]
    fn unverified_accepts_empty_signature() {
        let token = format!(
            "{}.{}.",
            segment(&serde_json::json!({"alg": "HS256"})),
            segment(&serde_json::json!({"sub": "u1", "email": "a@b.c", "username": "a"}))
        );
        let claims = decode_unverified(&token).unwrap().sanitize();
        assert_eq!(claims.subject, "u1");
        assert!(claims.is_complete());
    }

    #[test]
    fn unverified_requires_algorithm_in_header() {
        let token = format!(
            "{}.{}.sig",
            segment(&serde_json::json!({"typ": "JWT"})),
            segment(&serde_json::json!({"sub": "u1"}))
        );
        assert!(matches!(decode_unverified(&token), Err(DecodeError::Header)));
    }

    #[test]
    fn structured_ignores_header_but_rejects_non_object_payload() {
        let token = format!("garbage.{}.sig", segment(&serde_json::json!(["sub"])));
        assert!(matches!(decode_structured(&token), Err(DecodeError::Json(_))));

        let token = format!("garbage.{}.sig", segment(&serde_json::json!({"sub": "u1"})));
        assert_eq!(decode_structured(&token).unwrap().sanitize().subject, "u1");
    }

    #[test]
    fn sanitize_drops_private_key() {
        let token = format!(
            "{}.{}.sig",
            segment(&serde_json::json!({"alg": "HS256"})),
            segment(&serde_json::json!({"sub": "u1", "private_key": "c2VjcmV0"}))
        );
        let payload = decode_unverified(&token).unwrap();
        assert!(payload.has_private_key());

        let json = serde_json::to_string(&payload.sanitize()).unwrap();
        assert!(!json.contains("private_key"));
        assert!(!json.contains("c2VjcmV0"));
    }

    #[test]
    fn segment_count_is_checked() {
        assert!(matches!(decode_structured("a.b"), Err(DecodeError::Segments(2))));
        assert!(matches!(
            decode_unverified("a.b.c.d.e"),
            Err(DecodeError::Segments(5))
        ));
    }

    #[test]
    fn missing_fields_default_and_fail_completeness() {
        let token = format!(
            "{}.{}.sig",
            segment(&serde_json::json!({"alg": "HS256"})),
            segment(&serde_json::json!({"sub": "u1", "username": "a"}))
        );
        let claims = decode_structured(&token).unwrap().sanitize();
        assert_eq!(claims.email, "");
        assert_eq!(claims.expires_at, 0);
        assert!(!claims.is_complete());
    }
}
