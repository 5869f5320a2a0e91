//! Rule evaluation.

use tempurl_core::{RuleGrant, TempUrlError, TempUrlResult};

/// Reduce the matches of a rule query to the single authorizing grant.
///
/// No match means the caller is not authorized. Several matches are a
/// configuration fault and are never resolved by picking one.
pub fn evaluate_rules(mut grants: Vec<RuleGrant>) -> TempUrlResult<RuleGrant> {
    match grants.len() {
        0 => Err(TempUrlError::not_authorized(
            "no access rule authorizes this request",
        )),
        1 => Ok(grants.remove(0)),
        n => Err(TempUrlError::ambiguous_rule(n)),
    }
}

/// Duration actually granted: the request, capped at the rule maximum when
/// one is set.
#[must_use]
pub fn grant_duration(requested: i64, max_duration: Option<i64>) -> i64 {
    match max_duration {
        Some(max) if max > 0 => requested.min(max),
        _ => requested,
    }
}
