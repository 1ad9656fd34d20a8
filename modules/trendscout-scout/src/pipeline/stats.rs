use super::enrichment::SkipReason;

/// Outcome counts from one `enrich` call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnrichStats {
    pub candidates: u32,
    pub enriched: u32,
    pub discarded_over_target: u32,
    pub no_body: u32,
    pub not_found: u32,
    pub quota_exhausted: u32,
    pub lookup_failed: u32,
    pub cancelled: u32,
}

impl EnrichStats {
    pub fn record_skip(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::BodyUnavailable => self.no_body += 1,
            SkipReason::NotFound => self.not_found += 1,
            SkipReason::QuotaExhausted => self.quota_exhausted += 1,
            SkipReason::LookupFailed(_) => self.lookup_failed += 1,
            SkipReason::Cancelled => self.cancelled += 1,
        }
    }
}

impl std::fmt::Display for EnrichStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} candidates: {} enriched, {} over target, {} without body, {} missing, \
             {} quota exhausted, {} failed, {} cancelled",
            self.candidates,
            self.enriched,
            self.discarded_over_target,
            self.no_body,
            self.not_found,
            self.quota_exhausted,
            self.lookup_failed,
            self.cancelled
        )
    }
}
