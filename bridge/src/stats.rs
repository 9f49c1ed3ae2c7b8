use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use protocol::RejectReason;

/// Outcome counters shared by every connection.
#[derive(Debug, Default)]
pub struct BridgeStats {
    connections: AtomicU64,
    forwarded: AtomicU64,
    rejected: [AtomicU64; RejectReason::COUNT],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub connections: u64,
    pub forwarded: u64,
    pub rejected: Vec<(RejectReason, u64)>,
}

impl BridgeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connection(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self, reason: RejectReason) {
        self.rejected[reason.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connections: self.connections.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            rejected: RejectReason::ALL
                .iter()
                .map(|reason| (*reason, self.rejected[reason.index()].load(Ordering::Relaxed)))
                .collect(),
        }
    }
}

impl StatsSnapshot {
    pub fn rejected_total(&self) -> u64 {
        self.rejected.iter().map(|(_, count)| count).sum()
    }

    pub fn rejected_for(&self, reason: RejectReason) -> u64 {
        self.rejected
            .iter()
            .find(|(r, _)| *r == reason)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "connections={} forwarded={} rejected={}",
            self.connections,
            self.forwarded,
            self.rejected_total()
        )?;
        for (reason, count) in self.rejected.iter().filter(|(_, count)| *count > 0) {
            write!(f, " [{}: {}]", reason, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_reason_separately() {
        let stats = BridgeStats::new();
        stats.record_connection();
        stats.record_forwarded();
        stats.record_forwarded();
        stats.record_rejected(RejectReason::Unauthorized);
        stats.record_rejected(RejectReason::Unauthorized);
        stats.record_rejected(RejectReason::MissingTopic);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.connections, 1);
        assert_eq!(snapshot.forwarded, 2);
        assert_eq!(snapshot.rejected_total(), 3);
        assert_eq!(snapshot.rejected_for(RejectReason::Unauthorized), 2);
        assert_eq!(snapshot.rejected_for(RejectReason::MissingTopic), 1);
        assert_eq!(snapshot.rejected_for(RejectReason::MalformedRequest), 0);
    }

    #[test]
    fn display_lists_only_nonzero_reasons() {
        let stats = BridgeStats::new();
        stats.record_rejected(RejectReason::MalformedRequest);

        let text = stats.snapshot().to_string();
        assert_eq!(
            text,
            "connections=0 forwarded=0 rejected=1 [Invalid JSON: 1]"
        );
    }
}
