//! Subscriber channel keys

/// Unique identifier for a subscriber channel (connection + sub-index)
///
/// One connection may open several channels on the same stream, so the
/// connection's endpoint id alone is not enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelKey {
    /// Transport connection identifier
    pub endpoint: u64,
    /// Channel index within the connection
    pub index: i32,
}

impl ChannelKey {
    /// Create a new channel key
    pub fn new(endpoint: u64, index: i32) -> Self {
        Self { endpoint, index }
    }
}

impl std::fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.endpoint, self.index)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_key_identity() {
        let mut keys = HashSet::new();
        keys.insert(ChannelKey::new(7, 0));
        keys.insert(ChannelKey::new(7, 1));
        keys.insert(ChannelKey::new(7, 0));

        assert_eq!(keys.len(), 2);
        assert_eq!(ChannelKey::new(7, 1).to_string(), "7/1");
    }
}
