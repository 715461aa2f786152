//! Producer identification type.

use std::sync::Arc;

/// Identifier for an audio producer.
///
/// `ProducerId` is the name the host knows a producer by. It uses `Arc<str>`
/// internally, so cloning it on the audio path is a pointer copy.
///
/// # Example
///
/// ```
/// use channel_relay::ProducerId;
///
/// let a2 = ProducerId::new("A2");
/// assert_eq!(a2, ProducerId::new("A2"));
/// assert_ne!(a2, ProducerId::new("A3"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProducerId(Arc<str>);

impl ProducerId {
    /// Creates a new producer ID from a string.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProducerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProducerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ProducerId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for ProducerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_producer_id_display() {
        let id = ProducerId::new("V1+A1");
        assert_eq!(format!("{id}"), "V1+A1");
    }

    #[test]
    fn test_producer_id_conversions() {
        let from_str: ProducerId = "A2".into();
        let from_string: ProducerId = String::from("A2").into();
        assert_eq!(from_str, from_string);
        assert_eq!(from_str.as_ref(), "A2");
    }
}
