//! Configuration access port trait.

use crate::domain::error::ScalptraderError;

/// Typed access to `section.key` values.
///
/// Missing keys fall back to `default`; present but malformed values are
/// errors rather than silent defaults.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, ScalptraderError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, ScalptraderError>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, ScalptraderError>;
}
