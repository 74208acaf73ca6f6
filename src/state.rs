use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::user::{User, UserUpdate};
use crate::notify::Notifier;
use crate::store::Store;
use crate::utils::uid_cache::UidCache;
use crate::utils::uid_filter::UidFilter;

/// Shared by every worker through `web::Data`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub notifier: Notifier,
    uid_filter: UidFilter,
    uid_cache: UidCache,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            store,
            notifier: Notifier::from_config(config)?,
            uid_filter: UidFilter::new(),
            uid_cache: UidCache::new(
                config.uid_cache_capacity,
                Duration::from_secs(config.uid_cache_ttl_secs),
            ),
        })
    }

    /// Looks a user up through filter, then cache, then store.
    pub async fn find_user(&self, uid: &str) -> AppResult<Option<User>> {
        // 1️⃣ Cuckoo filter: fast negative
        if !self.uid_filter.might_exist(uid) {
            debug!(uid, "UID rejected by filter");
            return Ok(None);
        }

        // 2️⃣ Moka cache: fast positive
        if let Some(user) = self.uid_cache.get(uid).await {
            return Ok(Some(user));
        }

        // 3️⃣ Store fallback
        let user = self.store.get_user(uid).await?;
        if let Some(user) = &user {
            self.uid_cache.put(user.clone()).await;
        }
        Ok(user)
    }

    /// Like [`find_user`](Self::find_user) but unknown UIDs are an error.
    pub async fn require_user(&self, uid: &str) -> AppResult<User> {
        self.find_user(uid)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    pub async fn register_user(&self, user: User) -> AppResult<User> {
        if self.uid_cache.get(&user.uid).await.is_some() {
            return Err(AppError::conflict("UID already exists"));
        }

        let created = self.store.create_user(&user).await?;
        self.uid_filter.insert(&created.uid);
        self.uid_cache.put(created.clone()).await;
        Ok(created)
    }

    pub async fn update_user(&self, uid: &str, update: &UserUpdate) -> AppResult<User> {
        let updated = self
            .store
            .update_user(uid, update)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        self.uid_cache.put(updated.clone()).await;
        Ok(updated)
    }

    /// Loads every registered UID into the filter (and as many users as fit into
    /// the cache), then starts trusting the filter's negatives.
    pub async fn warmup(&self, batch_size: usize) -> anyhow::Result<usize> {
        let users = self.store.list_users().await?;

        for batch in users.chunks(batch_size.max(1)) {
            self.uid_filter.insert_batch(batch.iter().map(|u| u.uid.as_str()));
            self.uid_cache.put_batch(batch).await;
        }
        self.uid_filter.mark_ready();

        info!("UID index warmup complete: {} users", users.len());
        Ok(users.len())
    }
}
