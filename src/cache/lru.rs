//! 固定容量 LRU 缓存
//!
//! 节点存放在 `Vec` 槽位中，最近使用顺序是用下标串起来的双向链表，
//! 不需要指针回环。查找索引和链表由同一把锁保护：
//! - `get` / `put` / `clear` 会修改访问顺序，持写锁
//! - `stats` 只读计数，持读锁

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::trace;

use crate::config::DEFAULT_CACHE_CAPACITY;

/// 空链接
const NIL: usize = usize::MAX;

/// 缓存统计信息
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    /// 当前缓存数量
    pub size: usize,
    /// 缓存容量
    pub capacity: usize,
    /// 命中次数
    pub hits: u64,
    /// 未命中次数
    pub misses: u64,
    /// 命中率（百分比）
    pub hit_rate: f64,
}

/// 缓存项
struct CacheItem<V> {
    key: String,
    value: V,
    prev: usize,
    next: usize,
}

struct LruState<V> {
    index: HashMap<String, usize>,
    slots: Vec<Option<CacheItem<V>>>,
    free: Vec<usize>,
    /// 最近使用
    head: usize,
    /// 最久未使用
    tail: usize,
    hits: u64,
    misses: u64,
}

impl<V> LruState<V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            hits: 0,
            misses: 0,
        }
    }

    fn item(&self, idx: usize) -> &CacheItem<V> {
        self.slots[idx].as_ref().expect("linked slot must be occupied")
    }

    fn item_mut(&mut self, idx: usize) -> &mut CacheItem<V> {
        self.slots[idx].as_mut().expect("linked slot must be occupied")
    }

    /// 从链表中摘下，不释放槽位
    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let item = self.item(idx);
            (item.prev, item.next)
        };

        if prev == NIL {
            self.head = next;
        } else {
            self.item_mut(prev).next = next;
        }

        if next == NIL {
            self.tail = prev;
        } else {
            self.item_mut(next).prev = prev;
        }

        let item = self.item_mut(idx);
        item.prev = NIL;
        item.next = NIL;
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let item = self.item_mut(idx);
            item.prev = NIL;
            item.next = old_head;
        }

        if old_head == NIL {
            self.tail = idx;
        } else {
            self.item_mut(old_head).prev = idx;
        }
        self.head = idx;
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head != idx {
            self.detach(idx);
            self.push_front(idx);
        }
    }

    fn allocate(&mut self, item: CacheItem<V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(item);
                idx
            }
            None => {
                self.slots.push(Some(item));
                self.slots.len() - 1
            }
        }
    }

    /// 移除最久未使用的项，返回被淘汰的 key
    fn evict_oldest(&mut self) -> Option<String> {
        let oldest = self.tail;
        if oldest == NIL {
            return None;
        }

        self.detach(oldest);
        let item = self.slots[oldest].take()?;
        self.free.push(oldest);
        self.index.remove(&item.key);
        Some(item.key)
    }
}

/// 线程安全的固定容量 LRU 缓存
///
/// 超出容量时淘汰最久未使用的一项；`get` 命中会把该项提到最前。
pub struct LruCache<V> {
    capacity: usize,
    state: RwLock<LruState<V>>,
}

impl<V: Clone> LruCache<V> {
    /// 创建 LRU 缓存，容量为 0 时使用默认容量
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CACHE_CAPACITY
        } else {
            capacity
        };

        Self {
            capacity,
            state: RwLock::new(LruState::new()),
        }
    }

    /// 获取缓存
    ///
    /// 命中会修改访问顺序，因此需要写锁
    pub fn get(&self, key: &str) -> Option<V> {
        let mut state = self.state.write();

        match state.index.get(key).copied() {
            Some(idx) => {
                state.move_to_front(idx);
                state.hits += 1;
                Some(state.item(idx).value.clone())
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// 设置缓存
    pub fn put(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut state = self.state.write();

        // 已存在：更新值并移到最前，占用数不变
        if let Some(idx) = state.index.get(&key).copied() {
            state.item_mut(idx).value = value;
            state.move_to_front(idx);
            return;
        }

        let idx = state.allocate(CacheItem {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        });
        state.push_front(idx);
        state.index.insert(key, idx);

        if state.index.len() > self.capacity
            && let Some(evicted) = state.evict_oldest()
        {
            trace!("LruCache: evicted {}", evicted);
        }
    }

    /// 清空缓存并重置命中统计，容量不变
    pub fn clear(&self) {
        *self.state.write() = LruState::new();
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> CacheStats {
        let state = self.state.read();

        let total = state.hits + state.misses;
        let hit_rate = if total > 0 {
            state.hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        CacheStats {
            size: state.index.len(),
            capacity: self.capacity,
            hits: state.hits,
            misses: state.misses,
            hit_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.state.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
