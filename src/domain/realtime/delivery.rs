//! Delivery accounting for broadcasts.

use std::ops::AddAssign;

use serde::Serialize;

/// How many recipients got a message live versus queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub online: usize,
    pub offline: usize,
}

impl DeliveryReport {
    /// Report for a broadcast that had no recipients.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.online + self.offline
    }

    /// Record one delivery attempt.
    pub fn record(&mut self, delivered: bool) {
        if delivered {
            self.online += 1;
        } else {
            self.offline += 1;
        }
    }
}

impl AddAssign for DeliveryReport {
    fn add_assign(&mut self, rhs: Self) {
        self.online += rhs.online;
        self.offline += rhs.offline;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_splits_online_and_offline() {
        let mut report = DeliveryReport::empty();
        report.record(true);
        report.record(false);
        report.record(false);

        assert_eq!(report, DeliveryReport { online: 1, offline: 2 });
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn reports_accumulate() {
        let mut total = DeliveryReport { online: 1, offline: 0 };
        total += DeliveryReport { online: 2, offline: 5 };
        assert_eq!(total, DeliveryReport { online: 3, offline: 5 });
    }
}
