//! Configuration for the messaging hub.

use std::time::Duration;

/// Buffer size for the per-connection buffered reader/writer.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Default idle deadline for reads, writes and dials.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for hub behavior.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Deadline for each network read/write; a stalled peer fails the
    /// operation instead of blocking forever.
    ///
    /// On the send side this bounds the whole encode-and-flush of one
    /// frame, and on the receive side the whole handler invocation, not
    /// just idle gaps between bytes. Size it for the largest frame a
    /// deployment moves, not for round-trip latency.
    pub idle_timeout: Duration,

    /// Deadline for outbound dials.
    pub connect_timeout: Duration,

    /// Which of a node's addresses to dial. Nodes may expose several
    /// paths (interfaces, networks); this selects one by position.
    pub address_index: usize,

    /// Maximum accepted inbound frame payload length.
    pub max_msg_length: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_TIMEOUT,
            address_index: 0,
            max_msg_length: u64::MAX,
        }
    }
}

impl HubConfig {
    /// Create a configuration with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle deadline for reads and writes.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the dial deadline.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Select which node address slot to dial.
    pub fn with_address_index(mut self, index: usize) -> Self {
        self.address_index = index;
        self
    }

    /// Cap the accepted inbound frame payload length.
    pub fn with_max_msg_length(mut self, max: u64) -> Self {
        self.max_msg_length = max;
        self
    }
}
