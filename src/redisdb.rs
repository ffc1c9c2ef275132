use redis::{AsyncCommands, RedisResult, aio::ConnectionManager};
use std::net::IpAddr;

/// Window of the per-IP login limiter, in seconds.
pub const LOGIN_WINDOW_SECS: i64 = 15 * 60;
pub const LOGIN_MAX_ATTEMPTS: i64 = 5;

/// Short-lived storage for OAuth state values
///
/// A state written by `save_oauth_state` can be taken back exactly once;
/// `take_oauth_state` removes it in the same round trip.
pub trait OAuthStateExt {
    async fn save_oauth_state(&self, state: &str, ttl_secs: u64) -> RedisResult<()>;

    async fn take_oauth_state(&self, state: &str) -> RedisResult<Option<String>>;
}

/// Per-client counter behind the login limiter
pub trait LoginAttemptsExt {
    /// Count one login request from `ip` and return the count in the
    /// current window. The window starts at the first request.
    async fn hit_login_attempts(&self, ip: IpAddr) -> RedisResult<i64>;
}

#[derive(Clone)]
pub struct RedisClient {
    pub conn: ConnectionManager,
}

fn oauth_state_key(state: &str) -> String {
    format!("oauth_state:{}", state)
}

fn login_attempts_key(ip: IpAddr) -> String {
    format!("login_attempts:{}", ip)
}

impl RedisClient {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn ping(&self) -> RedisResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

impl LoginAttemptsExt for RedisClient {
    async fn hit_login_attempts(&self, ip: IpAddr) -> RedisResult<i64> {
        let key = login_attempts_key(ip);
        let mut conn = self.conn.clone();

        // SET NX EX opens the window with its TTL, INCR keeps that TTL;
        // MULTI/EXEC so a counter never exists without an expiry.
        let (attempts,): (i64,) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&key)
            .arg(0)
            .arg("EX")
            .arg(LOGIN_WINDOW_SECS)
            .arg("NX")
            .ignore()
            .incr(&key, 1)
            .query_async(&mut conn)
            .await?;

        Ok(attempts)
    }
}

impl OAuthStateExt for RedisClient {
    async fn save_oauth_state(&self, state: &str, ttl_secs: u64) -> RedisResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex(oauth_state_key(state), state, ttl_secs).await
    }

    async fn take_oauth_state(&self, state: &str) -> RedisResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get_del(oauth_state_key(state)).await
    }
}
