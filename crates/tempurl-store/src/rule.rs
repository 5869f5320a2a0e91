//! Access rules and their compiled form.
//!
//! Patterns are compiled once, when a rule is added, and always match the
//! whole container or object name: `logs` is stored as `^(?:logs)$`. The
//! `regex` crate matches in linear time, so a hostile pattern can cost
//! memory at compile time (bounded by [`MAX_PATTERN_LEN`] and the compiled
//! size limit) but never exponential matching time.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tempurl_core::RuleGrant;

use crate::RuleQuery;
use crate::error::StoreError;

/// Longest accepted container or object pattern, in bytes.
pub const MAX_PATTERN_LEN: usize = 256;

/// Upper bound on the compiled program size of a single pattern.
const COMPILED_SIZE_LIMIT: usize = 1 << 20;

/// An access rule as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRule {
    /// Id of the account whose objects this rule exposes.
    pub granting_account: String,
    /// API key of the caller the rule applies to.
    pub requestor_api_key: String,
    /// Pattern the container name must fully match.
    pub container_pattern: String,
    /// Pattern the object name must fully match.
    pub object_pattern: String,
    /// HTTP method the rule allows.
    pub method: String,
    /// Upper bound on the granted duration, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<i64>,
}

/// An access rule with its patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: AccessRule,
    method: String,
    container: Regex,
    object: Regex,
}

impl CompiledRule {
    /// Validate and compile `rule`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPattern`] for an empty, oversized or
    /// syntactically invalid pattern.
    pub fn compile(rule: AccessRule) -> Result<Self, StoreError> {
        let container = compile_pattern(&rule.container_pattern)?;
        let object = compile_pattern(&rule.object_pattern)?;
        Ok(Self {
            method: rule.method.to_ascii_uppercase(),
            rule,
            container,
            object,
        })
    }

    /// The rule this was compiled from.
    #[must_use]
    pub fn rule(&self) -> &AccessRule {
        &self.rule
    }

    /// Whether the rule authorizes `query`, given the id the queried account
    /// name resolved to.
    #[must_use]
    pub fn matches(&self, account_id: &str, query: &RuleQuery<'_>) -> bool {
        self.rule.granting_account == account_id
            && self.rule.requestor_api_key == query.requestor_api_key
            && self.method.eq_ignore_ascii_case(query.method)
            && self.container.is_match(query.container)
            && self.object.is_match(query.object)
    }

    /// The grant this rule yields when it matches.
    #[must_use]
    pub fn grant(&self) -> RuleGrant {
        RuleGrant {
            granting_account_id: self.rule.granting_account.clone(),
            max_duration: self.rule.max_duration,
        }
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, StoreError> {
    let invalid = |reason: String| StoreError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason,
    };

    if pattern.is_empty() {
        return Err(invalid("pattern is empty".to_owned()));
    }
    if pattern.len() > MAX_PATTERN_LEN {
        return Err(invalid(format!(
            "pattern is longer than {MAX_PATTERN_LEN} bytes"
        )));
    }

    RegexBuilder::new(&format!("^(?:{pattern})$"))
        .size_limit(COMPILED_SIZE_LIMIT)
        .build()
        .map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(container: &str, object: &str) -> AccessRule {
        AccessRule {
            granting_account: "acme-id".into(),
            requestor_api_key: "app1".into(),
            container_pattern: container.into(),
            object_pattern: object.into(),
            method: "get".into(),
            max_duration: Some(600),
        }
    }

    fn query<'a>(container: &'a str, object: &'a str) -> RuleQuery<'a> {
        RuleQuery {
            requestor_api_key: "app1",
            account: "acme",
            container,
            object,
            method: "GET",
        }
    }

    #[test]
    fn test_should_match_whole_names_only() {
        let compiled = CompiledRule::compile(rule("logs", ".*")).unwrap();
        assert!(compiled.matches("acme-id", &query("logs", "a.log")));
        assert!(!compiled.matches("acme-id", &query("logs2", "a.log")));
        assert!(!compiled.matches("acme-id", &query("old-logs", "a.log")));
    }

    #[test]
    fn test_should_accept_already_anchored_pattern() {
        let compiled = CompiledRule::compile(rule("^logs$", "^2024/.*$")).unwrap();
        assert!(compiled.matches("acme-id", &query("logs", "2024/01/a.log")));
        assert!(!compiled.matches("acme-id", &query("logs", "2023/01/a.log")));
    }

    #[test]
    fn test_should_keep_alternation_inside_anchors() {
        let compiled = CompiledRule::compile(rule("logs|metrics", ".*")).unwrap();
        assert!(compiled.matches("acme-id", &query("metrics", "x")));
        assert!(!compiled.matches("acme-id", &query("logsfoo", "x")));
        assert!(!compiled.matches("acme-id", &query("foometrics", "x")));
    }

    #[test]
    fn test_should_compare_method_case_insensitively() {
        let compiled = CompiledRule::compile(rule("logs", ".*")).unwrap();
        let mut q = query("logs", "a");
        q.method = "get";
        assert!(compiled.matches("acme-id", &q));
        q.method = "PUT";
        assert!(!compiled.matches("acme-id", &q));
    }

    #[test]
    fn test_should_not_match_other_requestor_or_account() {
        let compiled = CompiledRule::compile(rule("logs", ".*")).unwrap();
        let mut q = query("logs", "a");
        q.requestor_api_key = "app2";
        assert!(!compiled.matches("acme-id", &q));
        assert!(!compiled.matches("other-id", &query("logs", "a")));
    }

    #[test]
    fn test_should_reject_invalid_patterns() {
        for pattern in ["", "(unclosed", "[z-a]"] {
            let err = CompiledRule::compile(rule(pattern, ".*")).unwrap_err();
            assert!(matches!(err, StoreError::InvalidPattern { .. }), "{pattern}");
        }
        let long = "a".repeat(MAX_PATTERN_LEN + 1);
        assert!(CompiledRule::compile(rule(".*", &long)).is_err());
    }

    #[test]
    fn test_should_reject_pattern_exceeding_compiled_size() {
        let err = CompiledRule::compile(rule(r"\w{1000}\w{1000}\w{1000}", ".*")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPattern { .. }));
    }

    #[test]
    fn test_should_produce_grant() {
        let grant = CompiledRule::compile(rule("logs", ".*")).unwrap().grant();
        assert_eq!(grant.granting_account_id, "acme-id");
        assert_eq!(grant.max_duration, Some(600));
    }
}
