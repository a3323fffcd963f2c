use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Cursor lifetime from creation, per §3 / §6.
pub const CURSOR_TTL_SECS: i64 = 600;

/// Opaque pagination cursor: `{query-hash, offset, creation-time}` (§3, §6).
/// Short field names match the on-wire JSON shape specified in §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPayload {
    pub q: String,
    pub o: usize,
    pub t: i64,
}

impl CursorPayload {
    pub fn new(query_hash: impl Into<String>, offset: usize, created_at: i64) -> Self {
        Self {
            q: query_hash.into(),
            o: offset,
            t: created_at,
        }
    }

    /// Base64-URL (no padding) encoding of the JSON payload.
    pub fn encode(&self) -> Result<String, DomainError> {
        let json = serde_json::to_vec(self)
            .map_err(|e| DomainError::internal(format!("cursor encode: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decodes and validates expiry against `now`. Malformed or expired
    /// cursors are rejected with `InvalidCursor` (§6).
    pub fn decode(cursor: &str, now: i64) -> Result<Self, DomainError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|e| DomainError::InvalidCursor(format!("base64: {e}")))?;
        let payload: CursorPayload = serde_json::from_slice(&bytes)
            .map_err(|e| DomainError::InvalidCursor(format!("json: {e}")))?;
        if now.saturating_sub(payload.t) > CURSOR_TTL_SECS {
            return Err(DomainError::InvalidCursor("cursor expired".into()));
        }
        Ok(payload)
    }
}

pub fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_within_ttl() {
        let now = now_unix();
        let payload = CursorPayload::new("abc123", 10, now);
        let encoded = payload.encode().unwrap();
        let decoded = CursorPayload::decode(&encoded, now + 60).unwrap();
        assert_eq!(decoded.q, "abc123");
        assert_eq!(decoded.o, 10);
    }

    #[test]
    fn rejects_expired_cursor() {
        let created = 1_000;
        let payload = CursorPayload::new("abc123", 0, created);
        let encoded = payload.encode().unwrap();
        let err = CursorPayload::decode(&encoded, created + CURSOR_TTL_SECS + 1).unwrap_err();
        assert!(matches!(err, DomainError::InvalidCursor(_)));
    }

    #[test]
    fn rejects_malformed_cursor() {
        let err = CursorPayload::decode("not-valid-base64!!", now_unix()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidCursor(_)));
    }
}
