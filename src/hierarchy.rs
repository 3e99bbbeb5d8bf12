// 🌳 Hierarchy Resolver
// Tentative headquarters links → verified links, in insertion-safe order.
//
// A branch code always implies a headquarters code (first 8 chars + XXX), but
// the dataset does not always contain it (ALBPPLP1BMW exists, ALBPPLP1XXX does
// not). Such links are cleared, not rejected. Headquarters come first in the
// output so a self-referencing foreign key is satisfied row by row.

use crate::models::Bank;
use crate::parser::ParsedBatch;
use std::collections::HashSet;
use tracing::debug;

/// Codes of the headquarters records in `banks`
pub fn headquarters_codes(banks: &[Bank]) -> HashSet<String> {
    banks
        .iter()
        .filter(|b| b.is_headquarter())
        .map(|b| b.swift_code.clone())
        .collect()
}

/// Verify links against `known_headquarters` and order headquarters first.
///
/// Links whose target is not in `known_headquarters` are dropped. Each group
/// keeps its input order. The input records are not modified; corrected
/// copies are returned.
pub fn resolve(banks: &[Bank], known_headquarters: &HashSet<String>) -> Vec<Bank> {
    let (headquarters, branches): (Vec<&Bank>, Vec<&Bank>) =
        banks.iter().partition(|b| b.is_headquarter());

    let mut dangling = 0usize;
    let branches: Vec<Bank> = branches
        .into_iter()
        .map(|bank| match &bank.hq_swift_code {
            Some(hq) if !known_headquarters.contains(hq) => {
                debug!(swift_code = %bank.swift_code, hq_swift_code = %hq, "Headquarters not in batch, clearing link");
                dangling += 1;
                bank.with_hq_swift_code(None)
            }
            _ => bank.clone(),
        })
        .collect();

    debug!(
        headquarters = headquarters.len(),
        branches = branches.len(),
        dangling,
        "Resolved bank hierarchy"
    );

    headquarters.into_iter().cloned().chain(branches).collect()
}

impl ParsedBatch {
    /// Run hierarchy resolution on this batch
    pub fn resolve(&self) -> Vec<Bank> {
        resolve(&self.banks, &self.headquarters)
    }
}
