use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use trendscout_common::config::Config;
use trendscout_common::redact;

/// Source of "today" for daily quota resets.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Position of a credential in the pool. Lower ids are preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CredentialId(pub usize);

/// An API key handed out for a single call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: CredentialId,
    pub key: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("key", &redact(&self.key))
            .finish()
    }
}

/// Point-in-time view of one credential's usage, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub id: CredentialId,
    pub key: String,
    pub usage: u64,
    pub remaining: u64,
    pub last_reset: NaiveDate,
}

struct CredentialState {
    key: String,
    usage: u64,
    last_reset: NaiveDate,
}

impl CredentialState {
    fn reset_if_new_day(&mut self, today: NaiveDate) {
        if self.last_reset != today {
            info!(key = %redact(&self.key), %today, previous = self.usage, "Quota reset for new day");
            self.usage = 0;
            self.last_reset = today;
        }
    }
}

/// Per-credential daily quota usage.
///
/// One mutex guards every credential. It is held only for the
/// check-and-increment, never across a network call.
pub struct QuotaLedger {
    daily_quota: u64,
    clock: Arc<dyn Clock>,
    credentials: Mutex<Vec<CredentialState>>,
}

impl QuotaLedger {
    pub fn new(keys: Vec<String>, daily_quota: u64) -> Self {
        Self::with_clock(keys, daily_quota, Arc::new(SystemClock))
    }

    pub fn with_clock(keys: Vec<String>, daily_quota: u64, clock: Arc<dyn Clock>) -> Self {
        let today = clock.today();
        let credentials = keys
            .into_iter()
            .map(|key| CredentialState {
                key,
                usage: 0,
                last_reset: today,
            })
            .collect();
        Self {
            daily_quota,
            clock,
            credentials: Mutex::new(credentials),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.youtube_api_keys.clone(), config.youtube_daily_quota)
    }

    fn state(&self) -> MutexGuard<'_, Vec<CredentialState>> {
        self.credentials.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn daily_quota(&self) -> u64 {
        self.daily_quota
    }

    pub fn len(&self) -> usize {
        self.state().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn credential(&self, id: CredentialId) -> Option<Credential> {
        self.state().get(id.0).map(|c| Credential {
            id,
            key: c.key.clone(),
        })
    }

    /// Charge `cost` units to a credential if it has room today.
    ///
    /// Resets the credential first when its last reset was on an earlier day.
    /// Returns false, without mutating usage, when the charge would exceed the
    /// daily quota or the credential does not exist.
    pub fn charge_if_available(&self, id: CredentialId, cost: u64) -> bool {
        let today = self.clock.today();
        let mut credentials = self.state();
        let Some(credential) = credentials.get_mut(id.0) else {
            return false;
        };

        credential.reset_if_new_day(today);
        match credential.usage.checked_add(cost) {
            Some(next) if next <= self.daily_quota => {
                credential.usage = next;
                debug!(
                    key = %redact(&credential.key),
                    cost,
                    usage = next,
                    "Quota charged"
                );
                true
            }
            _ => false,
        }
    }

    /// Zero a credential's usage if its last reset was on an earlier day.
    pub fn reset_if_new_day(&self, id: CredentialId) {
        let today = self.clock.today();
        if let Some(credential) = self.state().get_mut(id.0) {
            credential.reset_if_new_day(today);
        }
    }

    /// Usage recorded so far. Not reset-aware: may show yesterday's figure.
    pub fn usage(&self, id: CredentialId) -> Option<u64> {
        self.state().get(id.0).map(|c| c.usage)
    }

    pub fn remaining(&self, id: CredentialId) -> Option<u64> {
        self.usage(id).map(|u| self.daily_quota.saturating_sub(u))
    }

    pub fn snapshot(&self) -> Vec<UsageSnapshot> {
        self.state()
            .iter()
            .enumerate()
            .map(|(i, c)| UsageSnapshot {
                id: CredentialId(i),
                key: c.key.clone(),
                usage: c.usage,
                remaining: self.daily_quota.saturating_sub(c.usage),
                last_reset: c.last_reset,
            })
            .collect()
    }

    /// Log usage of every credential.
    pub fn log_status(&self) {
        for snapshot in self.snapshot() {
            info!(
                credential = snapshot.id.0,
                key = %redact(&snapshot.key),
                usage = snapshot.usage,
                remaining = snapshot.remaining,
                limit = self.daily_quota,
                "Quota status"
            );
        }
    }
}
