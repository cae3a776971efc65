//! The AMP box, the protocol's single message unit.
//!
//! A box maps UTF-8 string keys to UTF-8 string values. Keys are unique and
//! carry no semantic order; serialization imposes the reserved-key priority
//! order documented in [`crate::codec`]. Remaining keys are kept sorted so the
//! encoded form of a given box is stable.

use std::collections::{BTreeMap, btree_map};

/// Decimal correlation id on a request that expects a reply.
pub const ASK: &str = "_ask";
/// Correlation id echoed on a successful response.
pub const ANSWER: &str = "_answer";
/// Command name, normalized into a dispatch identifier.
pub const COMMAND: &str = "_command";
/// Correlation id on a failed response.
pub const ERROR: &str = "_error";
/// Symbolic failure code on a failed response.
pub const ERROR_CODE: &str = "_error_code";
/// Human-readable failure text on a failed response.
pub const ERROR_DESCRIPTION: &str = "_error_description";

/// Every key with protocol-level meaning.
pub const RESERVED_KEYS: [&str; 6] = [ASK, ANSWER, COMMAND, ERROR, ERROR_CODE, ERROR_DESCRIPTION];

/// Longest key the wire format permits, in bytes.
pub const MAX_KEY_LENGTH: usize = 255;
/// Longest value the wire format permits, in bytes.
pub const MAX_VALUE_LENGTH: usize = 65_535;

/// Returns `true` if `key` is one of the [`RESERVED_KEYS`].
#[must_use]
pub fn is_reserved_key(key: &str) -> bool { RESERVED_KEYS.contains(&key) }

/// A mapping of string keys to string values.
///
/// # Examples
///
/// ```
/// use ampframe::ampbox::AmpBox;
///
/// let request = AmpBox::from([("_ask", "1"), ("_command", "list_peer")]);
/// assert_eq!(request.ask(), Some("1"));
/// assert_eq!(request.command(), Some("list_peer"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AmpBox(BTreeMap<String, String>);

impl AmpBox {
    /// Create an empty box.
    #[must_use]
    pub fn new() -> Self { Self(BTreeMap::new()) }

    /// Insert a pair, returning the value previously stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> { self.0.get(key).map(String::as_str) }

    /// Remove `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> { self.0.remove(key) }

    /// Returns `true` if the box holds `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool { self.0.contains_key(key) }

    /// Number of pairs in the box.
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// Returns `true` if the box holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Iterate over the pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// The `_ask` correlation id, if present.
    #[must_use]
    pub fn ask(&self) -> Option<&str> { self.get(ASK) }

    /// The `_answer` correlation id, if present.
    #[must_use]
    pub fn answer(&self) -> Option<&str> { self.get(ANSWER) }

    /// The `_command` name, if present.
    #[must_use]
    pub fn command(&self) -> Option<&str> { self.get(COMMAND) }

    /// Drop every reserved key, leaving only application pairs.
    pub fn strip_reserved(&mut self) { self.0.retain(|key, _| !is_reserved_key(key)); }
}

impl<K, V> FromIterator<(K, V)> for AmpBox
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ampbox = Self::new();
        ampbox.extend(iter);
        ampbox
    }
}

impl<K, V> Extend<(K, V)> for AmpBox
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for AmpBox
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self { pairs.into_iter().collect() }
}

impl IntoIterator for AmpBox {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_insert_replaces_earlier_value() {
        let mut ampbox = AmpBox::new();
        assert_eq!(ampbox.insert("payload", "first"), None);
        assert_eq!(ampbox.insert("payload", "second"), Some("first".to_owned()));
        assert_eq!(ampbox.get("payload"), Some("second"));
        assert_eq!(ampbox.len(), 1);
    }

    #[test]
    fn strip_reserved_keeps_application_pairs() {
        let mut ampbox = AmpBox::from([
            (ASK, "3"),
            (COMMAND, "sum"),
            (ERROR_CODE, "BOOM"),
            ("total", "12"),
        ]);
        ampbox.strip_reserved();
        assert_eq!(ampbox, AmpBox::from([("total", "12")]));
    }

    #[test]
    fn reserved_key_check_is_exact() {
        assert!(is_reserved_key("_ask"));
        assert!(is_reserved_key("_error_description"));
        assert!(!is_reserved_key("ask"));
        assert!(!is_reserved_key("_asked"));
    }
}
