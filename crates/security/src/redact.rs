//! Small helpers for keeping secrets out of logs, mirroring the teacher's
//! `redact()` helper in `rustedclaw-config::AppConfig`'s `Debug` impl.

/// Render a secret-bearing `Option<String>` as a presence marker only.
pub fn redact_option(value: &Option<String>) -> &'static str {
    match value {
        Some(_) => "[REDACTED]",
        None => "[ABSENT]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_present_value() {
        assert_eq!(redact_option(&Some("secret".into())), "[REDACTED]");
    }

    #[test]
    fn marks_absent_value() {
        assert_eq!(redact_option(&None), "[ABSENT]");
    }
}
