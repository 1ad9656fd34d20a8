pub mod ledger;
pub mod selector;

pub use ledger::{Clock, Credential, CredentialId, QuotaLedger, SystemClock, UsageSnapshot};
pub use selector::{CredentialSelector, Operation, OperationCost, QuotaExhausted};
