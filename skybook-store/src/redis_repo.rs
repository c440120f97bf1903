use async_trait::async_trait;
use redis::{AsyncCommands, RedisResult};
use skybook_core::ports::AvailabilityCache;
use uuid::Uuid;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

fn availability_key(flight_id: &str) -> String {
    format!("flight:{}:availability", flight_id)
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub async fn get_flight_availability(&self, flight_id: &str) -> RedisResult<Option<i32>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.get(availability_key(flight_id)).await
    }

    pub async fn set_flight_availability(&self, flight_id: &str, count: i32) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set(availability_key(flight_id), count).await
    }

    pub async fn delete_flight_availability(&self, flight_id: &str) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del(availability_key(flight_id)).await
    }

    /// Adjust the cached availability counter by `delta`, but only if the
    /// key is already seeded. A cache miss returns nil and lets the next
    /// search re-seed from the seat map, so we never invent counts here.
    pub async fn adjust_flight_availability(
        &self,
        flight_id: &str,
        delta: i32,
    ) -> RedisResult<Option<i64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let script = redis::Script::new(
            r#"
            if redis.call("EXISTS", KEYS[1]) == 1 then
                return redis.call("INCRBY", KEYS[1], ARGV[1])
            else
                return nil
            end
        "#,
        );

        script
            .key(availability_key(flight_id))
            .arg(delta)
            .invoke_async(&mut conn)
            .await
    }

    /// Fixed-window rate limit: one atomic INCR+EXPIRE round trip.
    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: i64,
        window_seconds: i64,
    ) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

#[async_trait]
impl AvailabilityCache for RedisClient {
    async fn get(
        &self,
        flight_id: Uuid,
    ) -> Result<Option<i32>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .get_flight_availability(&flight_id.to_string())
            .await?)
    }

    async fn set(
        &self,
        flight_id: Uuid,
        count: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .set_flight_availability(&flight_id.to_string(), count)
            .await?)
    }

    async fn adjust(
        &self,
        flight_id: Uuid,
        delta: i32,
    ) -> Result<Option<i64>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .adjust_flight_availability(&flight_id.to_string(), delta)
            .await?)
    }

    async fn clear(
        &self,
        flight_id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .delete_flight_availability(&flight_id.to_string())
            .await?)
    }
}
