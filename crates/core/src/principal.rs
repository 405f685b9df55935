//! The authenticated principal attached to a request.

/// Who (if anyone) the caller has proven themselves to be.
///
/// A sum type, per the Design Notes in spec.md §9 — callers centralize the
/// conversion into upstream headers in one function (`apply_principal_headers`
/// in the gateway's forwarder), never scattering it across stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    Bearer {
        user_id: u64,
        email: String,
        role: String,
    },
    ApiKey {
        /// 32-byte SHA-256 fingerprint of the presented key, hex-encoded downstream.
        fingerprint: [u8; 32],
        /// First 11 characters of the presented key, safe to log/display.
        display_prefix: String,
    },
}

impl Principal {
    pub fn kind(&self) -> &'static str {
        match self {
            Principal::Anonymous => "anonymous",
            Principal::Bearer { .. } => "bearer",
            Principal::ApiKey { .. } => "api_key",
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Principal::Anonymous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_is_not_authenticated() {
        assert!(!Principal::Anonymous.is_authenticated());
        assert_eq!(Principal::Anonymous.kind(), "anonymous");
    }

    #[test]
    fn bearer_is_authenticated() {
        let p = Principal::Bearer {
            user_id: 1,
            email: "u@x".into(),
            role: "user".into(),
        };
        assert!(p.is_authenticated());
        assert_eq!(p.kind(), "bearer");
    }

    #[test]
    fn api_key_is_authenticated() {
        let p = Principal::ApiKey {
            fingerprint: [0u8; 32],
            display_prefix: "cp_abcdefgh".into(),
        };
        assert!(p.is_authenticated());
        assert_eq!(p.kind(), "api_key");
    }
}
