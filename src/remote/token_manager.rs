//! 远程访问令牌的生命周期管理。
//!
//! 每个本地用户最多缓存一个远程令牌。令牌在剩余有效期不足安全余量时重新交换，
//! 新令牌先落库再返回客户端。

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::database::{StoreError, UserAccount, UserStore};
use crate::remote::auth::CredentialExchange;
use crate::remote::client::{ClientFactory, FolderApi};
use crate::remote::error::RemoteError;

/// 令牌剩余有效期低于此值时重新交换
pub const SAFETY_MARGIN_SECS: i64 = 5 * 60;
/// 服务端未给出可用有效期时采用的默认值
pub const DEFAULT_LIFETIME_SECS: i64 = 3600;
/// 浏览、上传、预览和下载所需的最小权限
pub const TOKEN_SCOPES: &[&str] = &[
    "base_explorer",
    "base_upload",
    "item_preview",
    "item_download",
    "item_upload",
];

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("user {0} has no linked remote account")]
    NotProvisioned(i64),
    #[error("credential exchange failed: {0}")]
    ExchangeFailed(#[source] RemoteError),
    #[error("cannot compute token expiry from lifetime of {lifetime_secs}s")]
    TokenComputation { lifetime_secs: i64 },
    #[error("failed to persist refreshed token: {0}")]
    Persistence(#[source] StoreError),
}

pub struct TokenManager {
    exchange: Arc<dyn CredentialExchange>,
    clients: Arc<dyn ClientFactory>,
    store: Arc<dyn UserStore>,
}

impl TokenManager {
    pub fn new(
        exchange: Arc<dyn CredentialExchange>,
        clients: Arc<dyn ClientFactory>,
        store: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            exchange,
            clients,
            store,
        }
    }

    /// 返回一个令牌至少还能使用安全余量时长的客户端
    pub async fn get_valid_client(
        &self,
        account: &UserAccount,
    ) -> Result<Arc<dyn FolderApi>, TokenError> {
        let remote_user_id = account
            .remote_user_id
            .as_deref()
            .ok_or(TokenError::NotProvisioned(account.id))?;

        let now = Utc::now();
        if let Some((token, expires_at)) = account.cached_token()
            && is_fresh(expires_at, now)
        {
            tracing::debug!("Reusing cached remote token for user {}", account.id);
            return Ok(self.clients.client(token));
        }

        tracing::info!("Exchanging remote token for user {}", account.id);
        let exchanged = self
            .exchange
            .exchange(remote_user_id, TOKEN_SCOPES)
            .await
            .map_err(TokenError::ExchangeFailed)?;

        let now = Utc::now();
        let expires_at = expiry_from(now, exchanged.expires_in)?;

        self.store
            .update_remote_token(account.id, &exchanged.access_token, expires_at)
            .await
            .map_err(TokenError::Persistence)?;

        Ok(self.clients.client(&exchanged.access_token))
    }
}

fn is_fresh(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at > now + Duration::seconds(SAFETY_MARGIN_SECS)
}

/// 缺失、非正数的有效期按默认值处理
fn expiry_from(now: DateTime<Utc>, expires_in: Option<i64>) -> Result<DateTime<Utc>, TokenError> {
    let lifetime_secs = match expires_in {
        Some(secs) if secs > 0 => secs,
        _ => DEFAULT_LIFETIME_SECS,
    };

    Duration::try_seconds(lifetime_secs)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or(TokenError::TokenComputation { lifetime_secs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repositories::user::tests::MemoryStore;
    use crate::remote::models::{ExchangedToken, FileEntry, ItemCollection};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TOLERANCE_SECS: i64 = 5;

    struct FakeExchange {
        calls: AtomicUsize,
        scopes: Mutex<Vec<String>>,
        result: Mutex<Option<Result<ExchangedToken, RemoteError>>>,
        expires_in: Option<i64>,
    }

    impl FakeExchange {
        fn issuing(expires_in: Option<i64>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                scopes: Mutex::new(Vec::new()),
                result: Mutex::new(None),
                expires_in,
            })
        }

        fn failing(err: RemoteError) -> Arc<Self> {
            let fake = Self::issuing(None);
            *fake.result.lock().unwrap() = Some(Err(err));
            fake
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialExchange for FakeExchange {
        async fn exchange(
            &self,
            remote_user_id: &str,
            scopes: &[&str],
        ) -> Result<ExchangedToken, RemoteError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            *self.scopes.lock().unwrap() = scopes.iter().map(|s| s.to_string()).collect();
            if let Some(result) = self.result.lock().unwrap().take() {
                return result;
            }
            Ok(ExchangedToken {
                access_token: format!("token-{remote_user_id}-{n}"),
                expires_in: self.expires_in,
            })
        }
    }

    struct FakeClient;

    #[async_trait]
    impl FolderApi for FakeClient {
        async fn list_folder_items(
            &self,
            _folder_id: &str,
            _fields: &[&str],
        ) -> Result<ItemCollection, RemoteError> {
            Ok(ItemCollection {
                total_count: 0,
                entries: Vec::new(),
            })
        }

        async fn get_file(&self, file_id: &str, _fields: &[&str]) -> Result<FileEntry, RemoteError> {
            Err(RemoteError::Unexpected(format!("no file {file_id}")))
        }
    }

    /// 记录每次构造客户端时使用的令牌
    #[derive(Default)]
    struct FakeClients {
        issued: Mutex<Vec<String>>,
    }

    impl FakeClients {
        fn last_token(&self) -> Option<String> {
            self.issued.lock().unwrap().last().cloned()
        }
    }

    impl ClientFactory for FakeClients {
        fn client(&self, access_token: &str) -> Arc<dyn FolderApi> {
            self.issued.lock().unwrap().push(access_token.to_string());
            Arc::new(FakeClient)
        }
    }

    fn account(remote_user_id: Option<&str>) -> UserAccount {
        UserAccount {
            id: 7,
            username: "alice".into(),
            password_hash: String::new(),
            remote_user_id: remote_user_id.map(str::to_string),
            remote_access_token: None,
            remote_token_expires_at: None,
            created_at: Utc::now(),
        }
    }

    fn with_cached(mut user: UserAccount, token: &str, expires_at: DateTime<Utc>) -> UserAccount {
        user.remote_access_token = Some(token.into());
        user.remote_token_expires_at = Some(expires_at);
        user
    }

    fn manager(exchange: Arc<FakeExchange>, store: Arc<MemoryStore>) -> TokenManager {
        manager_with_clients(exchange, store, Arc::new(FakeClients::default()))
    }

    fn manager_with_clients(
        exchange: Arc<FakeExchange>,
        store: Arc<MemoryStore>,
        clients: Arc<FakeClients>,
    ) -> TokenManager {
        TokenManager::new(exchange, clients, store)
    }

    fn assert_close(actual: DateTime<Utc>, expected: DateTime<Utc>) {
        let diff = (actual - expected).num_seconds().abs();
        assert!(diff <= TOLERANCE_SECS, "{actual} is {diff}s away from {expected}");
    }

    #[tokio::test]
    async fn unprovisioned_account_fails_without_network() {
        let user = account(None);
        let exchange = FakeExchange::issuing(Some(3600));
        let store = MemoryStore::with(user.clone());
        let tokens = manager(exchange.clone(), store.clone());

        let result = tokens.get_valid_client(&user).await;

        assert!(matches!(result, Err(TokenError::NotProvisioned(7))));
        assert_eq!(exchange.calls(), 0);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_token_exchanges_once_and_persists() {
        let user = account(Some("3100"));
        let exchange = FakeExchange::issuing(Some(4000));
        let store = MemoryStore::with(user.clone());
        let clients = Arc::new(FakeClients::default());
        let tokens = manager_with_clients(exchange.clone(), store.clone(), clients.clone());

        tokens.get_valid_client(&user).await.unwrap();

        assert_eq!(exchange.calls(), 1);
        assert_eq!(clients.last_token().as_deref(), Some("token-3100-1"));
        let saved = store.snapshot(7);
        assert_eq!(saved.remote_access_token.as_deref(), Some("token-3100-1"));
        assert_close(
            saved.remote_token_expires_at.unwrap(),
            Utc::now() + Duration::seconds(4000),
        );
    }

    #[tokio::test]
    async fn fresh_token_is_reused() {
        let user = with_cached(
            account(Some("3100")),
            "cached",
            Utc::now() + Duration::minutes(30),
        );
        let exchange = FakeExchange::issuing(Some(3600));
        let store = MemoryStore::with(user.clone());
        let clients = Arc::new(FakeClients::default());
        let tokens = manager_with_clients(exchange.clone(), store.clone(), clients.clone());

        tokens.get_valid_client(&user).await.unwrap();

        assert_eq!(exchange.calls(), 0);
        assert_eq!(clients.last_token().as_deref(), Some("cached"));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn near_expiry_token_is_replaced_with_fixed_scopes() {
        let user = with_cached(
            account(Some("3100")),
            "stale",
            Utc::now() + Duration::minutes(2),
        );
        let exchange = FakeExchange::issuing(Some(3600));
        let store = MemoryStore::with(user.clone());
        let clients = Arc::new(FakeClients::default());
        let tokens = manager_with_clients(exchange.clone(), store.clone(), clients.clone());

        tokens.get_valid_client(&user).await.unwrap();

        assert_eq!(exchange.calls(), 1);
        assert_eq!(*exchange.scopes.lock().unwrap(), TOKEN_SCOPES);
        assert_eq!(clients.last_token().as_deref(), Some("token-3100-1"));
        assert_eq!(
            store.snapshot(7).remote_access_token.as_deref(),
            Some("token-3100-1")
        );
    }

    #[tokio::test]
    async fn expired_token_is_replaced() {
        let user = with_cached(
            account(Some("3100")),
            "expired",
            Utc::now() - Duration::hours(1),
        );
        let exchange = FakeExchange::issuing(Some(3600));
        let tokens = manager(exchange.clone(), MemoryStore::with(user.clone()));

        tokens.get_valid_client(&user).await.unwrap();

        assert_eq!(exchange.calls(), 1);
    }

    #[tokio::test]
    async fn token_exactly_at_margin_is_replaced() {
        let user = with_cached(
            account(Some("3100")),
            "edge",
            Utc::now() + Duration::seconds(SAFETY_MARGIN_SECS),
        );
        let exchange = FakeExchange::issuing(Some(3600));
        let tokens = manager(exchange.clone(), MemoryStore::with(user.clone()));

        tokens.get_valid_client(&user).await.unwrap();

        assert_eq!(exchange.calls(), 1);
    }

    #[test]
    fn freshness_boundary_is_strict() {
        let now = Utc::now();
        let margin = Duration::seconds(SAFETY_MARGIN_SECS);
        assert!(!is_fresh(now + margin, now));
        assert!(is_fresh(now + margin + Duration::milliseconds(1), now));
    }

    #[tokio::test]
    async fn second_call_reuses_freshly_persisted_token() {
        let user = account(Some("3100"));
        let exchange = FakeExchange::issuing(Some(3600));
        let store = MemoryStore::with(user.clone());
        let clients = Arc::new(FakeClients::default());
        let tokens = manager_with_clients(exchange.clone(), store.clone(), clients.clone());

        tokens.get_valid_client(&user).await.unwrap();
        let reloaded = store.get(7).await.unwrap().unwrap();
        tokens.get_valid_client(&reloaded).await.unwrap();

        assert_eq!(exchange.calls(), 1);
        assert_eq!(clients.last_token().as_deref(), Some("token-3100-1"));
    }

    #[tokio::test]
    async fn missing_or_zero_lifetime_defaults_to_an_hour() {
        for expires_in in [None, Some(0), Some(-30)] {
            let user = account(Some("3100"));
            let store = MemoryStore::with(user.clone());
            let tokens = manager(FakeExchange::issuing(expires_in), store.clone());

            tokens.get_valid_client(&user).await.unwrap();

            assert_close(
                store.snapshot(7).remote_token_expires_at.unwrap(),
                Utc::now() + Duration::seconds(DEFAULT_LIFETIME_SECS),
            );
        }
    }

    #[tokio::test]
    async fn unrepresentable_expiry_persists_nothing() {
        let user = account(Some("3100"));
        let store = MemoryStore::with(user.clone());
        let tokens = manager(FakeExchange::issuing(Some(i64::MAX)), store.clone());

        let result = tokens.get_valid_client(&user).await;

        assert!(matches!(result, Err(TokenError::TokenComputation { .. })));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert!(store.snapshot(7).remote_access_token.is_none());
    }

    #[tokio::test]
    async fn exchange_failure_is_surfaced_without_retry() {
        let user = account(Some("3100"));
        let exchange = FakeExchange::failing(RemoteError::Api {
            status: 400,
            code: "invalid_grant".into(),
            message: "user is inactive".into(),
        });
        let store = MemoryStore::with(user.clone());
        let tokens = manager(exchange.clone(), store.clone());

        match tokens.get_valid_client(&user).await {
            Err(TokenError::ExchangeFailed(RemoteError::Api { message, .. })) => {
                assert_eq!(message, "user is inactive");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("exchange failure must not yield a client"),
        }
        assert_eq!(exchange.calls(), 1);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn persistence_failure_withholds_client_and_keeps_old_token() {
        let expires_at = Utc::now() + Duration::minutes(1);
        let user = with_cached(account(Some("3100")), "previous", expires_at);
        let store = MemoryStore::broken(user.clone());
        let tokens = manager(FakeExchange::issuing(Some(3600)), store.clone());

        let result = tokens.get_valid_client(&user).await;

        assert!(matches!(result, Err(TokenError::Persistence(_))));
        let saved = store.snapshot(7);
        assert_eq!(saved.remote_access_token.as_deref(), Some("previous"));
        assert_eq!(saved.remote_token_expires_at, Some(expires_at));
    }
}
