use std::collections::BTreeMap;

use crate::model::{AssignmentCandidate, AssignmentSummary, ScoreTier, Warning};

/// Compute summary statistics from ranked candidates.
pub fn compute_summary(candidates: &[AssignmentCandidate], ineligible: usize) -> AssignmentSummary {
    let mut warning_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut bis = 0;
    let mut floor = 0;
    let mut data_errors = 0;
    let mut with_freshness_warnings = 0;

    for c in candidates {
        for flag in &c.flags {
            *warning_counts.entry(flag.to_string()).or_insert(0) += 1;
        }

        match c.tier {
            ScoreTier::Bis => bis += 1,
            ScoreTier::Floor => floor += 1,
            ScoreTier::Simulated => {}
        }
        if c.flags.contains(&Warning::DataError) {
            data_errors += 1;
        }
        if c.flags.iter().any(Warning::is_freshness) {
            with_freshness_warnings += 1;
        }
    }

    AssignmentSummary {
        eligible: candidates.len(),
        ineligible,
        bis,
        floor,
        data_errors,
        with_freshness_warnings,
        warning_counts,
    }
}
