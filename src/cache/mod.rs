//! 查询结果缓存

mod lru;

pub use lru::{CacheStats, LruCache};
