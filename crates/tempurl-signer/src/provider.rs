//! Broker business logic.

use std::fmt;
use std::sync::Arc;

use tempurl_core::{
    Account, AccountView, KeyRequest, SecretCache, TempUrl, TempUrlConfig, TempUrlError,
    TempUrlResult, UrlRequest,
};
use tempurl_store::{AccessRuleStore, AccountLookup, RuleQuery, with_timeout};
use tracing::{debug, info};

use crate::rules::{evaluate_rules, grant_duration};
use crate::signature::sign_temp_url_at;

/// Issues temporary URLs and manages account signing keys.
///
/// Signing keys live in the provider's [`SecretCache`], keyed by account id.
/// The provider is built once at startup and shared by `Arc`.
pub struct TempUrlProvider {
    config: TempUrlConfig,
    signing_keys: Arc<SecretCache>,
    accounts: Arc<dyn AccountLookup>,
    rules: Arc<dyn AccessRuleStore>,
}

impl fmt::Debug for TempUrlProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TempUrlProvider")
            .field("object_host", &self.config.object_host)
            .field("signing_keys", &self.signing_keys.len())
            .finish_non_exhaustive()
    }
}

impl TempUrlProvider {
    /// Create a provider with an empty signing-key cache.
    #[must_use]
    pub fn new(
        config: TempUrlConfig,
        accounts: Arc<dyn AccountLookup>,
        rules: Arc<dyn AccessRuleStore>,
    ) -> Self {
        Self {
            config,
            signing_keys: Arc::new(SecretCache::new()),
            accounts,
            rules,
        }
    }

    /// The signing-key cache, for sweeping.
    #[must_use]
    pub fn signing_keys(&self) -> Arc<SecretCache> {
        Arc::clone(&self.signing_keys)
    }

    /// Issue a temporary URL for `requestor`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a bad request, `NotAuthorized` when no rule
    /// matches, `AmbiguousRule` when several do, `Configuration` when the
    /// granting account has no signing key and `Upstream` when the rule
    /// store fails or times out.
    pub async fn create_url(&self, requestor: &str, request: UrlRequest) -> TempUrlResult<TempUrl> {
        self.create_url_at(requestor, request, chrono::Utc::now().timestamp())
            .await
    }

    /// [`Self::create_url`] against an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`Self::create_url`].
    pub async fn create_url_at(
        &self,
        requestor: &str,
        mut request: UrlRequest,
        now_unix: i64,
    ) -> TempUrlResult<TempUrl> {
        request.validate()?;
        let requested = *request
            .duration
            .get_or_insert(self.config.default_duration);
        if requested <= 0 {
            return Err(TempUrlError::configuration(
                "default duration must be a positive number of seconds",
            ));
        }

        let query = RuleQuery {
            requestor_api_key: requestor,
            account: &request.account,
            container: &request.container,
            object: &request.object,
            method: &request.method,
        };
        let grants = with_timeout(
            self.config.store_timeout(),
            self.rules.matching_rules(&query),
        )
        .await?;
        let grant = evaluate_rules(grants)?;

        let Some(secret) = self.signing_keys.get(&grant.granting_account_id) else {
            return Err(TempUrlError::configuration(format!(
                "no signing key provisioned for account {}",
                request.account
            )));
        };

        let granted = grant_duration(requested, grant.max_duration);
        let url = sign_temp_url_at(
            &self.config.object_host,
            &secret,
            &request,
            granted,
            now_unix,
        );
        info!(
            requestor,
            account = %request.account,
            path = %url.path,
            method = %request.method,
            requested,
            granted,
            expires = url.expires,
            "temporary URL issued"
        );
        Ok(url)
    }

    /// Install the signing key of account `name`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an empty key, `UnknownAccount` when the account
    /// does not exist, `Forbidden` when `requestor` does not own it and
    /// `Upstream` when the account store fails.
    pub async fn set_key(
        &self,
        requestor: &str,
        name: &str,
        request: KeyRequest,
    ) -> TempUrlResult<AccountView> {
        if request.key.is_empty() {
            return Err(TempUrlError::invalid_request("missing required field: key"));
        }
        let account = self.authorized_account(requestor, name).await?;
        match self.config.signing_key_ttl() {
            Some(ttl) => self.signing_keys.set_with_ttl(&account.id, request.key, ttl),
            None => self.signing_keys.set(&account.id, request.key),
        }
        info!(requestor, account = name, "signing key installed");
        Ok(account.view())
    }

    /// Remove the signing key of account `name`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::set_key`], minus the key check.
    pub async fn remove_key(&self, requestor: &str, name: &str) -> TempUrlResult<()> {
        let account = self.authorized_account(requestor, name).await?;
        let removed = self.signing_keys.delete(&account.id);
        info!(requestor, account = name, removed, "signing key removed");
        Ok(())
    }

    /// Look up `name` and check that `requestor` owns it.
    async fn authorized_account(&self, requestor: &str, name: &str) -> TempUrlResult<Account> {
        let account = with_timeout(
            self.config.store_timeout(),
            self.accounts.account_by_name(name),
        )
        .await?
        .ok_or_else(|| TempUrlError::unknown_account(name))?;
        if account.id != requestor {
            debug!(requestor, account = name, "requestor does not own account");
            return Err(TempUrlError::forbidden(format!(
                "not allowed to manage keys of account {name}"
            )));
        }
        Ok(account)
    }
}
