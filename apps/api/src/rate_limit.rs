use redis::Client as RedisClient;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

const WINDOW_SECS: u64 = 60 * 60;

/// Fixed-window request counter kept in Redis, keyed per user and action.
#[derive(Clone)]
pub struct RateLimiter {
    redis: RedisClient,
}

impl RateLimiter {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }

    /// Counts one hit for `(action, user_id)` in the current hourly window and
    /// rejects with 429 once `limit` is exceeded.
    ///
    /// Redis being unreachable does not block the request.
    pub async fn check(&self, action: &str, user_id: Uuid, limit: u32) -> Result<(), AppError> {
        let key = window_key(action, user_id, chrono::Utc::now().timestamp());
        match self.increment(&key).await {
            Ok(count) if count > i64::from(limit) => Err(AppError::RateLimited {
                retry_after_secs: WINDOW_SECS,
            }),
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Rate limiter unavailable, allowing request: {e}");
                Ok(())
            }
        }
    }

    /// INCR and EXPIRE go out as one MULTI/EXEC, so every counter carries a TTL.
    async fn increment(&self, key: &str) -> redis::RedisResult<i64> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let (count,): (i64,) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(key)
            .cmd("EXPIRE")
            .arg(key)
            .arg(WINDOW_SECS)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }
}

fn window_key(action: &str, user_id: Uuid, now_unix: i64) -> String {
    let window = now_unix / WINDOW_SECS as i64;
    format!("ratelimit:{action}:{user_id}:{window}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_redis_allows_request() {
        let redis = RedisClient::open("redis://127.0.0.1:1").unwrap();
        let limiter = RateLimiter::new(redis);
        assert!(limiter.check("parse", Uuid::new_v4(), 1).await.is_ok());
        assert!(limiter.check("parse", Uuid::new_v4(), 0).await.is_ok());
    }

    #[test]
    fn test_same_window_same_key() {
        let user = Uuid::nil();
        assert_eq!(
            window_key("parse", user, 3_600),
            window_key("parse", user, 7_199)
        );
    }

    #[test]
    fn test_next_window_new_key() {
        let user = Uuid::nil();
        assert_ne!(
            window_key("parse", user, 7_199),
            window_key("parse", user, 7_200)
        );
    }
}
