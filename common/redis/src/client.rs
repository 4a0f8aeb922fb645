use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError};
use std::time::Duration;

use crate::{Client, CustomRedisError};

// Deletes the key only when its current value matches ARGV[1], so a caller
// holding a stale token cannot remove a key that has since been re-created
// by another holder.
const DELETE_IF_EQUALS_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

pub struct RedisClient {
    connection: MultiplexedConnection,
}

impl RedisClient {
    /// Create a new RedisClient with no timeouts (blocks indefinitely).
    ///
    /// For timeout configuration, use `with_config()` and specify
    /// `response_timeout` and `connection_timeout`.
    pub async fn new(addr: String) -> Result<RedisClient, CustomRedisError> {
        Self::with_config(addr, None, None).await
    }

    /// Create a new RedisClient with timeout control
    ///
    /// # Arguments
    /// * `addr` - Redis connection string
    /// * `response_timeout` - Optional timeout for Redis command responses. `None` means no timeout (blocks indefinitely).
    /// * `connection_timeout` - Optional timeout for establishing connections. `None` means no timeout (blocks indefinitely).
    ///
    /// # Errors
    /// Returns `CustomRedisError::InvalidConfiguration` if `Some(Duration::ZERO)` is passed - use `None` for no timeout instead.
    pub async fn with_config(
        addr: String,
        response_timeout: Option<Duration>,
        connection_timeout: Option<Duration>,
    ) -> Result<RedisClient, CustomRedisError> {
        let client = redis::Client::open(addr)?;

        // Validate that Duration::ZERO is not passed - use None instead
        if let Some(timeout) = response_timeout {
            if timeout.is_zero() {
                return Err(CustomRedisError::InvalidConfiguration(
                    "Redis response timeout cannot be Duration::ZERO - use None for no timeout"
                        .to_string(),
                ));
            }
        }
        if let Some(timeout) = connection_timeout {
            if timeout.is_zero() {
                return Err(CustomRedisError::InvalidConfiguration(
                    "Redis connection timeout cannot be Duration::ZERO - use None for no timeout"
                        .to_string(),
                ));
            }
        }

        // Use Redis native timeout configuration
        // None means no timeout (blocks indefinitely)
        let mut config = redis::AsyncConnectionConfig::new();

        if let Some(timeout) = response_timeout {
            config = config.set_response_timeout(timeout);
        }

        if let Some(timeout) = connection_timeout {
            config = config.set_connection_timeout(timeout);
        }

        let connection = client
            .get_multiplexed_async_connection_with_config(&config)
            .await?;

        Ok(RedisClient { connection })
    }
}

#[async_trait]
impl Client for RedisClient {
    async fn get(&self, k: String) -> Result<String, CustomRedisError> {
        let mut conn = self.connection.clone();
        let raw_bytes: Vec<u8> = conn.get(k).await?;

        // return NotFound error when empty
        if raw_bytes.is_empty() {
            return Err(CustomRedisError::NotFound);
        }

        let value = String::from_utf8(raw_bytes)?;
        Ok(value)
    }

    async fn set(&self, k: String, v: String) -> Result<(), CustomRedisError> {
        let mut conn = self.connection.clone();
        conn.set::<_, _, ()>(k, v).await?;
        Ok(())
    }

    async fn setex(&self, k: String, v: String, seconds: u64) -> Result<(), CustomRedisError> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(k, v, seconds).await?;
        Ok(())
    }

    async fn set_nx_ex(
        &self,
        k: String,
        v: String,
        seconds: u64,
    ) -> Result<bool, CustomRedisError> {
        let mut conn = self.connection.clone();

        // Use SET with both NX and EX options
        let result: Result<Option<String>, RedisError> = redis::cmd("SET")
            .arg(&k)
            .arg(&v)
            .arg("EX")
            .arg(seconds)
            .arg("NX")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(Some(_)) => Ok(true), // Key was set successfully
            Ok(None) => Ok(false),   // Key already existed
            Err(e) => Err(e.into()),
        }
    }

    async fn del(&self, k: String) -> Result<(), CustomRedisError> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(k).await?;
        Ok(())
    }

    async fn del_if_eq(&self, k: String, v: String) -> Result<bool, CustomRedisError> {
        let mut conn = self.connection.clone();

        let deleted: i64 = redis::cmd("EVAL")
            .arg(DELETE_IF_EQUALS_SCRIPT)
            .arg(1)
            .arg(&k)
            .arg(&v)
            .query_async(&mut conn)
            .await?;

        Ok(deleted == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_response_timeout_returns_error() {
        let result = RedisClient::with_config(
            "redis://localhost:6379".to_string(),
            Some(Duration::ZERO),
            None,
        )
        .await;

        assert!(matches!(
            result,
            Err(CustomRedisError::InvalidConfiguration(_))
        ));
        if let Err(CustomRedisError::InvalidConfiguration(msg)) = result {
            assert!(msg.contains("response timeout"));
        }
    }

    #[tokio::test]
    async fn test_zero_connection_timeout_returns_error() {
        let result = RedisClient::with_config(
            "redis://localhost:6379".to_string(),
            None,
            Some(Duration::ZERO),
        )
        .await;

        assert!(matches!(
            result,
            Err(CustomRedisError::InvalidConfiguration(_))
        ));
        if let Err(CustomRedisError::InvalidConfiguration(msg)) = result {
            assert!(msg.contains("connection timeout"));
        }
    }
}
