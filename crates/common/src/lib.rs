//! Shared utilities for the dotnope workspace: on-disk paths, the structured
//! log schema shared by the mediator and the native interposer, and value
//! redaction for anything that might echo a secret into a log line.

pub mod paths;

/// Standard log schema field names, shared by the runtime mediator's
/// `tracing` fields and the native interposer's plain-text decision log.
pub mod log_schema {
    pub const EVENT_TYPE: &str = "event_type";
    pub const PACKAGE: &str = "package";
    pub const CALLER: &str = "caller";
    pub const OPERATION: &str = "operation";
    pub const VARIABLE: &str = "variable";
    pub const DECISION: &str = "decision";
    pub const REASON: &str = "reason";
    pub const TIMESTAMP: &str = "ts";
    pub const COMPONENT: &str = "component";
}

/// True if `name` is a valid environment variable name: a non-empty string
/// of identifier characters, or the reserved wildcard sentinel `*`.
pub fn is_valid_variable_name(name: &str) -> bool {
    if name == "*" {
        return true;
    }
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Redact an environment variable's value before it reaches a log line.
/// Unlike argument redaction (which inspects `key=value` shapes), every
/// variable value mediated by this system is a candidate secret, so the
/// default is to redact unconditionally; set `DOTNOPE_LOG_RAW=1` to opt
/// into unredacted diagnostic logging (never recommended in production).
pub fn redact_value(value: &str) -> String {
    if std::env::var("DOTNOPE_LOG_RAW").as_deref() == Ok("1") {
        return value.to_string();
    }
    if value.is_empty() {
        return String::new();
    }
    format!("***({} bytes)", value.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_variable_name() {
        assert!(is_valid_variable_name("AWS_SECRET"));
        assert!(is_valid_variable_name("*"));
        assert!(is_valid_variable_name("_PRIVATE_9"));
        assert!(!is_valid_variable_name(""));
        assert!(!is_valid_variable_name("BAD-NAME"));
        assert!(!is_valid_variable_name("has space"));
    }

    #[test]
    fn test_redact_value() {
        assert_eq!(redact_value(""), "");
        assert_eq!(redact_value("topsecret"), "***(9 bytes)");
    }
}
