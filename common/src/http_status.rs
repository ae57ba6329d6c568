//! HTTP status code carried by responses produced behind the bridge.

use serde::{Deserialize, Serialize};

/// Lowest status code a response may carry.
pub const MIN_STATUS_CODE: u16 = 100;

/// Highest status code a response may carry.
pub const MAX_STATUS_CODE: u16 = 599;

/// HTTP status code of a domain response.
///
/// Serialized as a bare number so raw response records stay plain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HttpStatusCode(pub u16);

impl HttpStatusCode {
    pub const OK: HttpStatusCode = HttpStatusCode(200);
    pub const INTERNAL_SERVER_ERROR: HttpStatusCode = HttpStatusCode(500);

    /// Within the range a real HTTP response can use.
    pub fn is_valid(&self) -> bool {
        (MIN_STATUS_CODE..=MAX_STATUS_CODE).contains(&self.0)
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// 3xx.
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.0)
    }

    /// 4xx client errors.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    /// 5xx server errors.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl Default for HttpStatusCode {
    fn default() -> Self {
        HttpStatusCode::OK
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        HttpStatusCode(code)
    }
}

impl std::fmt::Display for HttpStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::HttpStatusCode;

    /// **VALUE**: Verifies status classification used by response helpers.
    ///
    /// **BUG THIS CATCHES**: Would catch off-by-one range edits that make a 299
    /// look like a redirect or a 600 look valid.
    #[test]
    fn given_status_codes_when_classified_then_ranges_are_exact() {
        // GIVEN / WHEN / THEN
        assert!(HttpStatusCode(200).is_success());
        assert!(HttpStatusCode(299).is_success());
        assert!(HttpStatusCode(302).is_redirect());
        assert!(HttpStatusCode(404).is_client_error());
        assert!(HttpStatusCode(503).is_server_error());
        assert!(HttpStatusCode(599).is_valid());
        assert!(!HttpStatusCode(600).is_valid());
        assert!(!HttpStatusCode(99).is_valid());
    }

    /// **VALUE**: Raw response records must carry the status as a plain number.
    #[test]
    fn given_status_code_when_serialized_then_is_bare_number() {
        // GIVEN: A status code
        let status = HttpStatusCode(418);

        // WHEN: Serializing
        let json = serde_json::to_string(&status).unwrap();

        // THEN: No wrapper object
        assert_eq!(json, "418");
    }
}
