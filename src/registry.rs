//! Symbolic error codes and their descriptions.
//!
//! An [`ErrorRegistry`] is filled during setup, then shared read-only (behind
//! an [`Arc`](std::sync::Arc)) with every
//! [`RequestCorrelator`](crate::correlator::RequestCorrelator). Sharing it
//! freezes it, so no lock is needed while serving.

use std::collections::HashMap;

/// Code sent when a handler fails with an unregistered code.
pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN";
/// Description sent with [`UNKNOWN_ERROR_CODE`].
pub const UNKNOWN_ERROR_DESCRIPTION: &str = "Unknown Error";

/// Mapping from symbolic error code to human-readable description.
///
/// # Examples
///
/// ```
/// use ampframe::registry::ErrorRegistry;
///
/// let registry = ErrorRegistry::new()
///     .with("NO_SUCH_PEER", "The requested peer does not exist")
///     .with("TIMEOUT", "The operation timed out");
/// assert_eq!(
///     registry.lookup("NO_SUCH_PEER"),
///     Some("The requested peer does not exist")
/// );
/// assert_eq!(registry.lookup("MISSING"), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ErrorRegistry {
    descriptions: HashMap<String, String>,
}

impl ErrorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Insert or overwrite the description for `code`, returning the previous
    /// description if there was one.
    pub fn register(
        &mut self,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Option<String> {
        self.descriptions.insert(code.into(), description.into())
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, code: impl Into<String>, description: impl Into<String>) -> Self {
        self.register(code, description);
        self
    }

    /// Description registered for `code`.
    #[must_use]
    pub fn lookup(&self, code: &str) -> Option<&str> {
        self.descriptions.get(code).map(String::as_str)
    }

    /// Number of registered codes.
    #[must_use]
    pub fn len(&self) -> usize { self.descriptions.len() }

    /// Returns `true` if no codes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.descriptions.is_empty() }
}

impl<C, D> FromIterator<(C, D)> for ErrorRegistry
where
    C: Into<String>,
    D: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (C, D)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (code, description) in iter {
            registry.register(code, description);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorRegistry;

    #[test]
    fn register_overwrites_previous_description() {
        let mut registry = ErrorRegistry::new();
        assert_eq!(registry.register("BUSY", "first"), None);
        assert_eq!(registry.register("BUSY", "second"), Some("first".to_owned()));
        assert_eq!(registry.lookup("BUSY"), Some("second"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn collects_from_pairs() {
        let registry: ErrorRegistry = [("A", "alpha"), ("B", "beta")].into_iter().collect();
        assert_eq!(registry.lookup("B"), Some("beta"));
        assert!(!registry.is_empty());
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let registry = ErrorRegistry::new().with("TIMEOUT", "timed out");
        assert_eq!(registry.lookup("timeout"), None);
    }
}
