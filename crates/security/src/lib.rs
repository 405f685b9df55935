//! Security primitives for the edge request router — bearer-token
//! verification, API-key fingerprinting, and log-redaction helpers.
//!
//! Provides:
//! - **Bearer**: HS256 issue/verify with strict `exp`/`nbf`/`alg` checks
//! - **API key**: SHA-256 fingerprinting and safe display prefixes
//! - **Redact**: keep secrets out of `Debug`/log output

pub mod apikey;
pub mod bearer;
pub mod redact;

pub use apikey::{DISPLAY_PREFIX_LEN, display_prefix, fingerprint, fingerprint_hex, hex_encode};
pub use bearer::{BearerError, Claims, MIN_SECRET_LEN, issue, parse_authorization_header, verify};
