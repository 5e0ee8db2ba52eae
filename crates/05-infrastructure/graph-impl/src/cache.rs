//! 作用域缓存实现
//!
//! 每个作用域一个缓存实例，维护能力键到（实例，引用计数）的映射

use parking_lot::Mutex;
use runtime_common::{CapabilityKey, GraphError, GraphResult, ManagedComponent, ScopeDescriptor};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

/// 缓存条目
///
/// 不变量：在表中的条目引用计数恒大于零，计数归零的条目立即逐出。
pub struct CacheEntry {
    /// 实例，由条目独占持有
    instance: Arc<dyn ManagedComponent>,
    /// 引用计数
    ref_count: usize,
}

/// 作用域缓存
///
/// 获取时创建的闭包不得重入本缓存：对象图先解析依赖再物化当前实例，
/// 因此工厂只接触已解析的依赖集。
pub struct ScopeCache {
    /// 作用域名称
    name: String,
    /// 作用域实例ID
    id: uuid::Uuid,
    /// 创建时间
    created_at: chrono::DateTime<chrono::Utc>,
    /// 缓存条目
    entries: Mutex<HashMap<CapabilityKey, CacheEntry>>,
}

impl ScopeCache {
    /// 创建新的作用域缓存
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug!("创建作用域缓存: {}", name);

        Self {
            name,
            id: uuid::Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// 作用域名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 生成作用域描述符
    pub fn descriptor(&self) -> ScopeDescriptor {
        ScopeDescriptor {
            name: self.name.clone(),
            id: self.id,
            created_at: self.created_at,
            entry_count: self.entries.lock().len(),
        }
    }

    /// 获取实例
    ///
    /// 首次获取时通过 `create` 创建并以引用计数 1 入表；
    /// 再次获取返回已有实例并递增计数。返回值第二项表示是否发生了真实创建。
    pub fn acquire<F>(
        &self,
        key: &CapabilityKey,
        create: F,
    ) -> GraphResult<(Arc<dyn ManagedComponent>, bool)>
    where
        F: FnOnce() -> GraphResult<Arc<dyn ManagedComponent>>,
    {
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get_mut(key) {
            entry.ref_count += 1;
            debug!("复用 {} (作用域 {}), 引用计数 {}", key, self.name, entry.ref_count);
            return Ok((entry.instance.clone(), false));
        }

        let instance = create()?;
        entries.insert(
            key.clone(),
            CacheEntry {
                instance: instance.clone(),
                ref_count: 1,
            },
        );
        debug!("创建 {} (作用域 {})", key, self.name);

        Ok((instance, true))
    }

    /// 释放实例
    ///
    /// 递减引用计数；归零时逐出条目、调用清理钩子并返回被逐出的实例。
    /// 释放不存在的键意味着释放没有匹配的注入，属编程错误，立即失败。
    pub fn release(&self, key: &CapabilityKey) -> GraphResult<Option<Arc<dyn ManagedComponent>>> {
        let evicted = {
            let mut entries = self.entries.lock();

            let Some(entry) = entries.get_mut(key) else {
                error!("引用计数下溢: {} (作用域 {})", key, self.name);
                return Err(GraphError::RefCountUnderflow {
                    key: key.to_string(),
                });
            };

            entry.ref_count -= 1;
            if entry.ref_count == 0 {
                entries.remove(key).map(|entry| entry.instance)
            } else {
                debug!("释放 {} (作用域 {}), 引用计数 {}", key, self.name, entry.ref_count);
                None
            }
        };

        if let Some(instance) = &evicted {
            debug!("逐出 {} (作用域 {})", key, self.name);
            instance.on_disposed();
        }

        Ok(evicted)
    }

    /// 强制逐出全部条目
    ///
    /// 作用域所有者被销毁时调用，无视引用计数清空缓存并逐条调用清理钩子。
    pub fn purge(&self) -> Vec<(CapabilityKey, Arc<dyn ManagedComponent>)> {
        let drained: Vec<(CapabilityKey, Arc<dyn ManagedComponent>)> = {
            let mut entries = self.entries.lock();
            entries
                .drain()
                .map(|(key, entry)| (key, entry.instance))
                .collect()
        };

        for (key, instance) in &drained {
            debug!("强制逐出 {} (作用域 {})", key, self.name);
            instance.on_disposed();
        }

        drained
    }

    /// 查询某个键当前的引用计数
    pub fn ref_count_of(&self, key: &CapabilityKey) -> Option<usize> {
        self.entries.lock().get(key).map(|entry| entry.ref_count)
    }

    /// 当前条目数量
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// 缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl std::fmt::Debug for ScopeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeCache")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct TracedComponent {
        disposals: AtomicUsize,
    }

    impl ManagedComponent for TracedComponent {
        fn component_name(&self) -> &str {
            "TracedComponent"
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }

        fn on_disposed(&self) {
            self.disposals.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn acquire_traced(cache: &ScopeCache, key: &CapabilityKey) -> (Arc<dyn ManagedComponent>, bool) {
        cache
            .acquire(key, || Ok(Arc::new(TracedComponent::default())))
            .unwrap()
    }

    #[test]
    fn second_acquire_returns_same_instance() {
        let cache = ScopeCache::new("test");
        let key = CapabilityKey::of::<TracedComponent>();

        let (first, created_first) = acquire_traced(&cache, &key);
        let (second, created_second) = acquire_traced(&cache, &key);

        assert!(created_first);
        assert!(!created_second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.ref_count_of(&key), Some(2));
    }

    #[test]
    fn release_evicts_only_at_zero() {
        let cache = ScopeCache::new("test");
        let key = CapabilityKey::of::<TracedComponent>();

        acquire_traced(&cache, &key);
        acquire_traced(&cache, &key);

        assert!(cache.release(&key).unwrap().is_none());
        assert_eq!(cache.ref_count_of(&key), Some(1));

        let evicted = cache.release(&key).unwrap().unwrap();
        let traced = evicted.into_any().downcast::<TracedComponent>().unwrap();
        assert_eq!(traced.disposals.load(Ordering::SeqCst), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn release_without_entry_underflows() {
        let cache = ScopeCache::new("test");
        let key = CapabilityKey::of::<TracedComponent>();

        assert!(matches!(
            cache.release(&key),
            Err(GraphError::RefCountUnderflow { .. })
        ));
    }

    #[test]
    fn purge_evicts_regardless_of_ref_count() {
        let cache = ScopeCache::new("screen");
        let key = CapabilityKey::of::<TracedComponent>();

        acquire_traced(&cache, &key);
        acquire_traced(&cache, &key);

        let purged = cache.purge();
        assert_eq!(purged.len(), 1);
        assert!(cache.is_empty());

        let traced = purged[0].1.clone().into_any().downcast::<TracedComponent>().unwrap();
        assert_eq!(traced.disposals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_creation_leaves_no_entry() {
        let cache = ScopeCache::new("test");
        let key = CapabilityKey::of::<TracedComponent>();

        let result = cache.acquire(&key, || {
            Err(GraphError::creation_failed(&key, "factory exploded"))
        });

        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
