// Simple helpers to avoid accidental printing of secrets in logs/tests.
use std::env;

/// Redact a text body unless DEV_PRINT_SECRETS=1 is set in the environment.
/// By default this returns a short placeholder containing only the length.
pub fn redact_body(s: &str) -> String {
    if env::var("DEV_PRINT_SECRETS").ok().as_deref() == Some("1") {
        // Developer explicitly allowed printing secrets
        return s.to_string();
    }
    format!("<redacted len={}>", s.len())
}

/// Show only the first and last six characters of a secret, e.g.
/// `SDLCVG...QGO3JM` style output for operator logs.
pub fn mask_secret(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{}...{}", head, tail)
}
