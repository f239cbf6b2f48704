// Service exports
pub mod cache;
pub mod postgres;

pub use cache::{CacheError, CacheKey, CacheManager, CachedLocation};
pub use postgres::{LocationStore, StoreError};
