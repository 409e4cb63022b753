//! Protocol configuration.

use std::time::Duration;

/// Tunable parameters of the election and performance protocol.
///
/// None of these change the protocol's structure, only its geometry and
/// timing. Defaults mirror the original deployment (neighbor distance 3).
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Maximum Euclidean distance (inclusive) at which two musicians are
    /// neighbors.
    pub neighbor_max_distance: u32,

    /// Interval between a performing winner's Perform heartbeats.
    pub heartbeat_interval: Duration,

    /// Total length of a winner's performance. After this the winner goes
    /// silent and its losers' leases run out.
    pub performance_duration: Duration,

    /// How long a loser waits without a heartbeat before treating the
    /// winner's turn as finished. Must exceed `heartbeat_interval` or
    /// losers will restart rounds mid-performance.
    pub lease_timeout: Duration,

    /// Opt-in tie-break: on equal priority values, defer to the higher id.
    ///
    /// Off by default. The literal policy uses strict `>`, under which two
    /// equal-valued neighbors mutually reject each other and both stall in
    /// Unknown forever.
    pub tie_break_by_id: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            neighbor_max_distance: 3,
            heartbeat_interval: Duration::from_millis(500),
            performance_duration: Duration::from_secs(5),
            lease_timeout: Duration::from_millis(1500),
            tie_break_by_id: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lease_outlives_heartbeat() {
        let config = ProtocolConfig::default();
        assert!(config.lease_timeout > config.heartbeat_interval);
    }
}
