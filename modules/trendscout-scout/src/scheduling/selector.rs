use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use super::ledger::{Credential, CredentialId, QuotaLedger};

/// Quota units charged per YouTube Data API call.
pub struct OperationCost;

impl OperationCost {
    pub const SEARCH: u64 = 100;
    pub const VIDEOS: u64 = 1;
    pub const CHANNELS: u64 = 1;
    pub const COMMENT_THREADS: u64 = 1; // per page, regardless of item count
    pub const COMMENTS: u64 = 1; // per page of replies
}

/// Kind of metered call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    Videos,
    Channels,
    CommentThreads,
    Comments,
}

impl Operation {
    pub const fn cost(self) -> u64 {
        match self {
            Operation::Search => OperationCost::SEARCH,
            Operation::Videos => OperationCost::VIDEOS,
            Operation::Channels => OperationCost::CHANNELS,
            Operation::CommentThreads => OperationCost::COMMENT_THREADS,
            Operation::Comments => OperationCost::COMMENTS,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::Videos => "videos",
            Operation::Channels => "channels",
            Operation::CommentThreads => "commentThreads",
            Operation::Comments => "comments",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every credential is out of quota for the requested operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("all {credentials} API keys have exceeded their quota for {operation} (cost {cost})")]
pub struct QuotaExhausted {
    pub operation: Operation,
    pub cost: u64,
    pub credentials: usize,
}

/// Hands out the first credential, in pool order, that can pay for a call.
///
/// Usage concentrates on low-index keys; later keys only absorb overflow.
pub struct CredentialSelector {
    ledger: Arc<QuotaLedger>,
}

impl CredentialSelector {
    pub fn new(ledger: Arc<QuotaLedger>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<QuotaLedger> {
        &self.ledger
    }

    /// Charge the operation's cost to the first credential with room.
    /// The charge is made on success, before the call is issued.
    pub fn acquire(&self, operation: Operation) -> Result<Credential, QuotaExhausted> {
        let cost = operation.cost();
        let credentials = self.ledger.len();

        for index in 0..credentials {
            let id = CredentialId(index);
            if self.ledger.charge_if_available(id, cost) {
                if let Some(credential) = self.ledger.credential(id) {
                    return Ok(credential);
                }
            }
        }

        warn!(%operation, cost, credentials, "All API keys exhausted");
        Err(QuotaExhausted {
            operation,
            cost,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::testing::ManualClock;

    fn selector(keys: usize, quota: u64) -> CredentialSelector {
        let clock = Arc::new(ManualClock::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()));
        let keys = (0..keys).map(|i| format!("key-{i}")).collect();
        CredentialSelector::new(Arc::new(QuotaLedger::with_clock(keys, quota, clock)))
    }

    #[test]
    fn search_is_an_order_of_magnitude_above_item_calls() {
        assert_eq!(Operation::Search.cost(), 100);
        for op in [
            Operation::Videos,
            Operation::Channels,
            Operation::CommentThreads,
            Operation::Comments,
        ] {
            assert_eq!(op.cost(), 1);
        }
    }

    #[test]
    fn prefers_lowest_index_with_room() {
        let selector = selector(3, 150);
        let first = selector.acquire(Operation::Search).unwrap();
        assert_eq!(first.id, CredentialId(0));
        assert_eq!(first.key, "key-0");

        // key-0 has 50 left: too little for a search, plenty for item calls.
        assert_eq!(selector.acquire(Operation::Search).unwrap().id, CredentialId(1));
        assert_eq!(selector.acquire(Operation::Videos).unwrap().id, CredentialId(0));
        assert_eq!(selector.acquire(Operation::Search).unwrap().id, CredentialId(2));
    }

    #[test]
    fn exhaustion_reports_operation_and_leaves_usage_untouched() {
        let selector = selector(2, 100);
        selector.acquire(Operation::Search).unwrap();
        selector.acquire(Operation::Search).unwrap();

        let err = selector.acquire(Operation::Videos).unwrap_err();
        assert_eq!(err.operation, Operation::Videos);
        assert_eq!(err.cost, 1);
        assert_eq!(err.credentials, 2);
        let ledger = selector.ledger();
        assert_eq!(ledger.usage(CredentialId(0)), Some(100));
        assert_eq!(ledger.usage(CredentialId(1)), Some(100));
    }

    #[test]
    fn empty_pool_is_exhausted() {
        let selector = selector(0, 10_000);
        assert!(selector.acquire(Operation::Comments).is_err());
    }
}
