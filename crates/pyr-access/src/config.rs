//! Node configuration.

use pyr_access_core::{DEFAULT_FRESHNESS_WINDOW, GRANT_PROTOCOL};

/// Configuration for an access node.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Maximum age in blocks of the block a claim is signed against.
    ///
    /// Claimants must sign a block recent enough to pass this check, so the
    /// value is part of the wire contract between peers.
    pub freshness_window: u64,
    /// Direct-channel protocol name for grant packages.
    pub grant_protocol: String,
    /// First block scanned for publish events when rebuilding the library.
    pub bootstrap_from_block: u64,
    /// Largest inbound grant payload accepted, in bytes.
    pub max_grant_bytes: usize,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            grant_protocol: GRANT_PROTOCOL.to_string(),
            bootstrap_from_block: 0,
            max_grant_bytes: 64 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_wire_contract() {
        let config = AccessConfig::default();
        assert_eq!(config.freshness_window, 20);
        assert_eq!(config.grant_protocol, "/sharedBucket");
    }
}
