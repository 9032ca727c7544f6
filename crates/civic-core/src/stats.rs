//! Dashboard analytics over a set of complaints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Complaint, ComplaintStatus, Priority};

/// Counts shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintStats {
    pub total: usize,
    pub new: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub rejected: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
    pub by_category: BTreeMap<String, usize>,
}

impl ComplaintStats {
    pub fn from_complaints<'a>(complaints: impl IntoIterator<Item = &'a Complaint>) -> Self {
        let mut stats = Self::default();
        for c in complaints {
            stats.total += 1;
            match c.status {
                ComplaintStatus::New => stats.new += 1,
                ComplaintStatus::InProgress => stats.in_progress += 1,
                ComplaintStatus::Resolved => stats.resolved += 1,
                ComplaintStatus::Rejected => stats.rejected += 1,
            }
            match c.priority {
                Priority::Low => stats.low += 1,
                Priority::Medium => stats.medium += 1,
                Priority::High => stats.high += 1,
                Priority::Critical => stats.critical += 1,
            }
            *stats.by_category.entry(c.category.clone()).or_insert(0) += 1;
        }
        stats
    }

    /// Complaints still awaiting work (new + in progress).
    pub fn open(&self) -> usize {
        self.new + self.in_progress
    }

    /// Resolved share of all complaints as a rounded percentage.
    pub fn resolution_rate(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.resolved as f64 / self.total as f64) * 100.0).round() as u32
    }
}
