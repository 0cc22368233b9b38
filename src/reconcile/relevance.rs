//! Decides whether a change event warrants a reconciliation.

use std::collections::BTreeSet;

use crate::model::{ChangeAction, ChangeEvent};

/// Returns true when the event changed at least one whitelisted field.
///
/// Deletions are never relevant: there is nothing left to converge.
#[must_use]
pub fn is_relevant(event: &ChangeEvent, whitelist: &BTreeSet<String>) -> bool {
    event.action != ChangeAction::Deleted
        && event.changed_fields.keys().any(|field| whitelist.contains(field))
}

/// The changed fields that are also whitelisted, for logging.
#[must_use]
pub fn relevant_fields<'a>(event: &'a ChangeEvent, whitelist: &BTreeSet<String>) -> Vec<&'a str> {
    event
        .changed_fields
        .keys()
        .filter(|field| whitelist.contains(*field))
        .map(String::as_str)
        .collect()
}
