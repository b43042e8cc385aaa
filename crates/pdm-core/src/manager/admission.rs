//! Per-domain admission budget for one manager pass.
//!
//! A fresh budget is filled from the registry under the registry lock, so
//! the counts cannot go stale while queued jobs are being admitted.

use std::collections::HashMap;

#[derive(Debug)]
pub struct DomainBudget {
    /// 0 = unlimited.
    limit: usize,
    active: HashMap<String, usize>,
}

impl DomainBudget {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            active: HashMap::new(),
        }
    }

    /// Count a job that is already active.
    pub fn occupy(&mut self, domain: &str) {
        *self.active.entry(domain.to_string()).or_default() += 1;
    }

    pub fn active(&self, domain: &str) -> usize {
        self.active.get(domain).copied().unwrap_or(0)
    }

    /// Slots still free for `domain`. `None` means unlimited.
    pub fn available(&self, domain: &str) -> Option<usize> {
        (self.limit > 0).then(|| self.limit.saturating_sub(self.active(domain)))
    }

    /// Take a slot if one is free.
    pub fn try_admit(&mut self, domain: &str) -> bool {
        if self.available(domain) == Some(0) {
            return false;
        }
        self.occupy(domain);
        true
    }
}
