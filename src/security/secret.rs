//! Small helpers and aliases for secret buffers that must be zeroized on drop.
use zeroize::Zeroizing;

/// Secret text (e.g. an `S...` seed) which will be zeroed when dropped.
pub type SecretString = Zeroizing<String>;

/// Move a `String` into a `SecretString` which will be zeroized on drop.
pub fn vec_to_secret_string(s: String) -> SecretString {
    Zeroizing::new(s)
}

/// Read a secret from the environment without leaving an unwiped copy behind.
pub fn secret_from_env(name: &str) -> Option<SecretString> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty()).map(Zeroizing::new)
}
