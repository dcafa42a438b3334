//! Lenient JSON bodies.
//!
//! Handlers read fields out of a [`Payload`] and report their own 400
//! messages, so a wrong-typed field never turns into a plain-text rejection.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// JSON object body. An empty or `null` body reads as an empty object.
#[derive(Debug, Default)]
pub struct Payload(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::BadRequest("bad_body"))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        match serde_json::from_slice(&bytes) {
            Ok(Value::Object(fields)) => Ok(Self(fields)),
            Ok(Value::Null) => Ok(Self::default()),
            _ => Err(ApiError::BadRequest("bad_body")),
        }
    }
}

impl Payload {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    /// Trimmed, non-empty string field.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Integer field, given as a JSON integer or a string of digits.
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Numeric field, given as a JSON number or a numeric string.
    pub fn number(&self, key: &str) -> Option<f64> {
        let number = match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };

        number.filter(|n| n.is_finite())
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(fields) => Payload(fields),
            _ => unreachable!(),
        }
    }

    #[test]
    fn fields_accept_numbers_and_numeric_strings() {
        let p = payload(json!({"a": 3, "b": " 4 ", "c": "x", "d": 1.5, "e": null, "k": "  "}));

        assert_eq!(p.int("a"), Some(3));
        assert_eq!(p.int("b"), Some(4));
        assert_eq!(p.int("c"), None);
        assert_eq!(p.int("d"), None);
        assert_eq!(p.number("d"), Some(1.5));
        assert_eq!(p.number("b"), Some(4.0));
        assert!(p.get("e").is_none());
        assert_eq!(p.text("k"), None);
        assert_eq!(p.text("c"), Some("x"));
        assert_eq!(p.text("a"), None);
    }
}
