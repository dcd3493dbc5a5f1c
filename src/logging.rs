//! Log-safe rendering of secrets

use std::fmt;

/// Masked display for secrets and bearer tokens
///
/// Shows the first 4 characters followed by `***`. Values of 8 characters
/// or fewer are masked entirely.
#[derive(Clone, Debug)]
pub struct SensitiveValue<'a> {
    inner: &'a str,
}

impl<'a> SensitiveValue<'a> {
    /// ```
    /// use cost_analytics::logging::SensitiveValue;
    ///
    /// assert_eq!(SensitiveValue::new("abcdef-secret").to_string(), "abcd***");
    /// ```
    pub fn new(value: &'a str) -> Self {
        Self { inner: value }
    }
}

impl<'a> fmt::Display for SensitiveValue<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: String = self.inner.chars().take(4).collect();
        if self.inner.chars().count() <= 8 {
            write!(f, "***")
        } else {
            write!(f, "{}***", visible)
        }
    }
}
