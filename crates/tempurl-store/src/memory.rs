//! In-memory account and rule store.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use tempurl_core::{Account, RuleGrant};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::rule::{AccessRule, CompiledRule};
use crate::seed::SeedFile;
use crate::{AccessRuleStore, AccountLookup, RuleQuery};

/// Accounts and rules held in process memory.
///
/// Accounts are indexed by id and by name. Rules are compiled on insert
/// and scanned linearly on every match.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: DashMap<String, Account>,
    ids_by_name: DashMap<String, String>,
    rules: RwLock<Vec<CompiledRule>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a parsed seed file.
    ///
    /// # Errors
    ///
    /// Fails on the first duplicate account, invalid pattern or rule
    /// referencing an unknown account.
    pub fn from_seed(seed: SeedFile) -> Result<Self, StoreError> {
        let store = Self::new();
        for account in seed.accounts {
            store.add_account(account)?;
        }
        for rule in seed.rules {
            store.add_rule(rule)?;
        }
        info!(
            accounts = store.account_count(),
            rules = store.rule_count(),
            "store seeded"
        );
        Ok(store)
    }

    /// Add an account. Ids and names must both be unique.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateAccount`] if the id or name is taken.
    pub fn add_account(&self, account: Account) -> Result<(), StoreError> {
        let name_slot = match self.ids_by_name.entry(account.name.clone()) {
            Entry::Occupied(e) => return Err(StoreError::DuplicateAccount(e.key().clone())),
            Entry::Vacant(e) => e,
        };
        match self.accounts.entry(account.id.clone()) {
            Entry::Occupied(e) => Err(StoreError::DuplicateAccount(e.key().clone())),
            Entry::Vacant(e) => {
                debug!(id = %account.id, name = %account.name, "account added");
                name_slot.insert(account.id.clone());
                e.insert(account);
                Ok(())
            }
        }
    }

    /// Compile and add an access rule.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownAccount`] if the granting account does not
    /// exist, or [`StoreError::InvalidPattern`] if a pattern is rejected.
    pub fn add_rule(&self, rule: AccessRule) -> Result<(), StoreError> {
        if !self.accounts.contains_key(&rule.granting_account) {
            return Err(StoreError::UnknownAccount(rule.granting_account));
        }
        let compiled = CompiledRule::compile(rule)?;
        self.rules.write().push(compiled);
        Ok(())
    }

    /// Number of accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Number of rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }
}

#[async_trait]
impl AccountLookup for MemoryStore {
    async fn account_by_name(&self, name: &str) -> Result<Option<Account>, StoreError> {
        let Some(id) = self.ids_by_name.get(name).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        Ok(self.accounts.get(&id).map(|r| r.value().clone()))
    }

    async fn account_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(id).map(|r| r.value().clone()))
    }
}

#[async_trait]
impl AccessRuleStore for MemoryStore {
    async fn matching_rules(&self, query: &RuleQuery<'_>) -> Result<Vec<RuleGrant>, StoreError> {
        let Some(account_id) = self.ids_by_name.get(query.account).map(|r| r.value().clone())
        else {
            return Ok(Vec::new());
        };
        let grants: Vec<RuleGrant> = self
            .rules
            .read()
            .iter()
            .filter(|rule| rule.matches(&account_id, query))
            .map(CompiledRule::grant)
            .collect();
        debug!(
            requestor = query.requestor_api_key,
            account = query.account,
            matches = grants.len(),
            "rules evaluated"
        );
        Ok(grants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> Account {
        Account::new("acme-key", "acme", "acme-secret")
    }

    fn logs_rule() -> AccessRule {
        AccessRule {
            granting_account: "acme-key".into(),
            requestor_api_key: "app1".into(),
            container_pattern: "^logs$".into(),
            object_pattern: ".*".into(),
            method: "GET".into(),
            max_duration: Some(600),
        }
    }

    fn query<'a>(container: &'a str, method: &'a str) -> RuleQuery<'a> {
        RuleQuery {
            requestor_api_key: "app1",
            account: "acme",
            container,
            object: "2024/app.log",
            method,
        }
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_account(acme()).unwrap();
        store.add_rule(logs_rule()).unwrap();
        store
    }

    #[tokio::test]
    async fn test_should_lookup_account_by_name_and_id() {
        let store = seeded();
        let by_name = store.account_by_name("acme").await.unwrap().unwrap();
        let by_id = store.account_by_id("acme-key").await.unwrap().unwrap();
        assert_eq!(by_name, by_id);
        assert!(store.account_by_name("nobody").await.unwrap().is_none());
        assert!(store.account_by_id("nobody").await.unwrap().is_none());
    }

    #[test]
    fn test_should_reject_duplicate_accounts() {
        let store = seeded();
        let same_name = Account::new("other-key", "acme", "s");
        let same_id = Account::new("acme-key", "other", "s");
        assert!(matches!(
            store.add_account(same_name),
            Err(StoreError::DuplicateAccount(n)) if n == "acme"
        ));
        assert!(matches!(
            store.add_account(same_id),
            Err(StoreError::DuplicateAccount(id)) if id == "acme-key"
        ));
        assert_eq!(store.account_count(), 1);
        // The rejected id did not leave a dangling name entry behind.
        assert!(store.ids_by_name.get("other").is_none());
    }

    #[test]
    fn test_should_reject_rule_for_unknown_account() {
        let store = MemoryStore::new();
        let err = store.add_rule(logs_rule()).unwrap_err();
        assert!(matches!(err, StoreError::UnknownAccount(_)));
    }

    #[tokio::test]
    async fn test_should_match_single_rule() {
        let store = seeded();
        let grants = store.matching_rules(&query("logs", "GET")).await.unwrap();
        assert_eq!(
            grants,
            vec![RuleGrant {
                granting_account_id: "acme-key".into(),
                max_duration: Some(600),
            }]
        );
    }

    #[tokio::test]
    async fn test_should_not_match_other_container_or_method() {
        let store = seeded();
        assert!(store.matching_rules(&query("logs2", "GET")).await.unwrap().is_empty());
        assert!(store.matching_rules(&query("logs", "PUT")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_should_return_every_overlapping_rule() {
        let store = seeded();
        store
            .add_rule(AccessRule {
                container_pattern: "lo.*".into(),
                max_duration: None,
                ..logs_rule()
            })
            .unwrap();
        let grants = store.matching_rules(&query("logs", "GET")).await.unwrap();
        assert_eq!(grants.len(), 2);
    }

    #[tokio::test]
    async fn test_should_return_nothing_for_unknown_account() {
        let store = seeded();
        let mut q = query("logs", "GET");
        q.account = "globex";
        assert!(store.matching_rules(&q).await.unwrap().is_empty());
    }

    #[test]
    fn test_should_build_from_seed() {
        let seed = SeedFile {
            accounts: vec![acme(), Account::new("app1", "app", "app-secret")],
            rules: vec![logs_rule()],
        };
        let store = MemoryStore::from_seed(seed).unwrap();
        assert_eq!(store.account_count(), 2);
        assert_eq!(store.rule_count(), 1);
    }

    #[test]
    fn test_should_fail_seed_with_bad_pattern() {
        let seed = SeedFile {
            accounts: vec![acme()],
            rules: vec![AccessRule {
                object_pattern: "(".into(),
                ..logs_rule()
            }],
        };
        assert!(matches!(
            MemoryStore::from_seed(seed),
            Err(StoreError::InvalidPattern { .. })
        ));
    }
}
