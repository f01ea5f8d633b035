//! Configuration access port trait.

use crate::domain::error::DcaError;

/// Typed lookups into sectioned key/value configuration. Numeric getters
/// return `Ok(None)` for a missing key and a `Config` error for a value
/// that does not parse.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, DcaError>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, DcaError>;

    /// Non-empty trimmed value, or `None`.
    fn get_trimmed(&self, section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}
