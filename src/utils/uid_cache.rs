use moka::future::Cache;
use std::time::Duration;

use crate::model::user::User;

/// Recently seen users by exact UID. A hit skips the store on repeated scans.
#[derive(Clone)]
pub struct UidCache {
    users: Cache<String, User>,
}

impl UidCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            users: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, uid: &str) -> Option<User> {
        self.users.get(uid).await
    }

    pub async fn put(&self, user: User) {
        self.users.insert(user.uid.clone(), user).await;
    }

    /// Batch insert, awaited concurrently
    pub async fn put_batch(&self, users: &[User]) {
        let futures: Vec<_> = users
            .iter()
            .map(|u| self.users.insert(u.uid.clone(), u.clone()))
            .collect();

        futures::future::join_all(futures).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(uid: &str) -> User {
        User {
            uid: uid.into(),
            name: "Ada".into(),
            email: None,
            role: None,
            department: None,
        }
    }

    #[actix_web::test]
    async fn put_then_get() {
        let cache = UidCache::new(100, Duration::from_secs(60));
        assert!(cache.get("A1").await.is_none());

        cache.put_batch(&[user("A1"), user("B2")]).await;
        assert_eq!(cache.get("B2").await.map(|u| u.uid), Some("B2".to_string()));

        let mut renamed = user("A1");
        renamed.name = "Ada L.".into();
        cache.put(renamed).await;
        assert_eq!(cache.get("A1").await.unwrap().name, "Ada L.");
    }
}
