pub mod app_config;
pub mod database;
pub mod redis_repo;

pub use app_config::{BusinessRules, Config};
pub use database::DbClient;
pub use redis_repo::RedisClient;
