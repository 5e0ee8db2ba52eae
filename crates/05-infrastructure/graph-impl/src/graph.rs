//! 对象图实现
//!
//! 编排注入与释放：深度优先解析传递闭包、维护作用域缓存中的引用计数、
//! 在部分失败时回滚到调用前状态，并向监视器通报真实的创建与销毁。

use crate::cache::ScopeCache;
use async_trait::async_trait;
use dashmap::DashMap;
use graph_abstractions::{
    CapabilityRegistry, DependencyBundle, GraphConfig, GraphMonitor, GraphStats, InjectionRoot,
    ObjectGraph, ResolutionChain,
};
use parking_lot::{Mutex, RwLock};
use runtime_common::{
    CapabilityKey, GraphError, GraphResult, ManagedComponent, ProviderScope, ScopeDescriptor,
    GLOBAL_SCOPE,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 注入记录条目
struct RecordEntry {
    /// 被获取的能力键
    key: CapabilityKey,
    /// 获取时的生效作用域
    scope: ProviderScope,
    /// 非缓存实例由记录持有，供释放时触发清理
    unscoped_instance: Option<Arc<dyn ManagedComponent>>,
}

/// 注入记录
///
/// 按根对象身份保存注入时解析的能力键序列，释放时据此做镜像递减。
struct InjectionRecord {
    /// 根对象名称（诊断用）
    root_name: String,
    /// 获取顺序的条目列表
    entries: Vec<RecordEntry>,
}

impl InjectionRecord {
    fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            entries: Vec::new(),
        }
    }
}

/// 对象图实现
///
/// 所有变更操作（注入、释放、作用域销毁）串行化在同一把互斥锁下，
/// 同一作用域上的并发注入/释放不会交错出部分状态。
pub struct ObjectGraphImpl {
    /// 能力注册表
    registry: Arc<dyn CapabilityRegistry>,
    /// 作用域名称到缓存的映射
    caches: DashMap<String, Arc<ScopeCache>>,
    /// 根对象身份到注入记录的映射
    records: Mutex<HashMap<usize, InjectionRecord>>,
    /// 图监视器
    monitors: RwLock<Vec<Arc<dyn GraphMonitor>>>,
    /// 变更操作串行化锁
    mutation_lock: tokio::sync::Mutex<()>,
    /// 图配置
    config: GraphConfig,
    /// 累计创建实例数量
    created: AtomicUsize,
    /// 累计销毁实例数量
    disposed: AtomicUsize,
}

impl ObjectGraphImpl {
    /// 创建使用默认配置的对象图
    pub fn new(registry: Arc<dyn CapabilityRegistry>) -> Self {
        Self::with_config(registry, GraphConfig::default())
    }

    /// 创建使用指定配置的对象图
    ///
    /// 全局作用域缓存在构造时创建，与图同生命周期。
    pub fn with_config(registry: Arc<dyn CapabilityRegistry>, config: GraphConfig) -> Self {
        let caches = DashMap::new();
        caches.insert(
            GLOBAL_SCOPE.to_string(),
            Arc::new(ScopeCache::new(GLOBAL_SCOPE)),
        );

        Self {
            registry,
            caches,
            records: Mutex::new(HashMap::new()),
            monitors: RwLock::new(Vec::new()),
            mutation_lock: tokio::sync::Mutex::new(()),
            config,
            created: AtomicUsize::new(0),
            disposed: AtomicUsize::new(0),
        }
    }

    /// 获取能力注册表
    pub fn registry(&self) -> &Arc<dyn CapabilityRegistry> {
        &self.registry
    }

    /// 根对象身份
    fn root_identity(root: &Arc<dyn InjectionRoot>) -> usize {
        Arc::as_ptr(root) as *const () as usize
    }

    /// 按名称取作用域缓存，不存在则创建
    fn cache_for(&self, scope: &str) -> Arc<ScopeCache> {
        self.caches
            .entry(scope.to_string())
            .or_insert_with(|| Arc::new(ScopeCache::new(scope)))
            .clone()
    }

    /// 深度优先获取单个能力及其声明依赖
    fn acquire_into(
        &self,
        key: &CapabilityKey,
        record: &mut InjectionRecord,
        bundle: &mut DependencyBundle,
        chain: &mut ResolutionChain,
    ) -> GraphResult<()> {
        chain.push(key)?;
        let result = self.acquire_inner(key, record, bundle, chain);
        chain.pop();
        result
    }

    fn acquire_inner(
        &self,
        key: &CapabilityKey,
        record: &mut InjectionRecord,
        bundle: &mut DependencyBundle,
        chain: &mut ResolutionChain,
    ) -> GraphResult<()> {
        let provider = self.registry.resolve(key)?;

        // 先解析声明的依赖，再物化当前实例
        for dependency in provider.dependencies() {
            self.acquire_into(dependency, record, bundle, chain)?;
        }

        match provider.effective_scope() {
            ProviderScope::Unscoped => {
                let instance = provider
                    .create(bundle)
                    .map_err(|e| map_creation_error(key, e))?;
                self.notify_created(key, &instance);
                bundle.insert(key.clone(), instance.clone());
                record.entries.push(RecordEntry {
                    key: key.clone(),
                    scope: ProviderScope::Unscoped,
                    unscoped_instance: Some(instance),
                });
            }
            scope @ ProviderScope::Scoped(_) => {
                let cache = self.cache_for(scope.name().unwrap_or(GLOBAL_SCOPE));
                let (instance, created) = cache.acquire(key, || {
                    provider.create(bundle).map_err(|e| map_creation_error(key, e))
                })?;

                if created {
                    self.notify_created(key, &instance);
                }
                bundle.insert(key.clone(), instance);
                record.entries.push(RecordEntry {
                    key: key.clone(),
                    scope,
                    unscoped_instance: None,
                });
            }
        }

        Ok(())
    }

    /// 释放单个记录条目
    fn release_entry(&self, entry: &RecordEntry) -> GraphResult<()> {
        match &entry.scope {
            ProviderScope::Unscoped => {
                if let Some(instance) = &entry.unscoped_instance {
                    instance.on_disposed();
                    self.notify_disposed(&entry.key, instance);
                }
                Ok(())
            }
            ProviderScope::Scoped(name) => {
                let Some(cache) = self.caches.get(name).map(|cache| cache.clone()) else {
                    // 作用域已被强制销毁，其中的实例早已清理完毕
                    debug!("作用域 {} 已销毁，跳过释放 {}", name, entry.key);
                    return Ok(());
                };

                if let Some(instance) = cache.release(&entry.key)? {
                    self.notify_disposed(&entry.key, &instance);
                }
                Ok(())
            }
        }
    }

    /// 回滚部分完成的注入
    fn rollback(&self, record: InjectionRecord) {
        for entry in record.entries.iter().rev() {
            if let Err(e) = self.release_entry(entry) {
                error!("回滚 {} 期间释放 {} 失败: {}", record.root_name, entry.key, e);
            }
        }
    }

    fn notify_created(&self, key: &CapabilityKey, instance: &Arc<dyn ManagedComponent>) {
        self.created.fetch_add(1, Ordering::SeqCst);

        let monitors: Vec<Arc<dyn GraphMonitor>> = self.monitors.read().clone();
        for monitor in monitors {
            monitor.on_instance_created(key, instance);
        }
    }

    fn notify_disposed(&self, key: &CapabilityKey, instance: &Arc<dyn ManagedComponent>) {
        self.disposed.fetch_add(1, Ordering::SeqCst);

        let monitors: Vec<Arc<dyn GraphMonitor>> = self.monitors.read().clone();
        for monitor in monitors {
            monitor.on_instance_disposed(key, instance);
        }
    }
}

/// 把工厂错误归一为实例创建失败
fn map_creation_error(key: &CapabilityKey, error: GraphError) -> GraphError {
    match error {
        // 传递依赖的解析失败原样上抛
        e @ (GraphError::UnresolvedCapability { .. }
        | GraphError::CircularDependency { .. }
        | GraphError::ResolutionTooDeep { .. }
        | GraphError::InstanceCreationFailed { .. }) => e,
        other => GraphError::creation_failed(key, other.to_string()),
    }
}

#[async_trait]
impl ObjectGraph for ObjectGraphImpl {
    async fn inject(&self, root: &Arc<dyn InjectionRoot>) -> GraphResult<DependencyBundle> {
        let _guard = self.mutation_lock.lock().await;
        debug!("注入根对象: {}", root.root_name());

        let mut record = InjectionRecord::new(root.root_name());
        let mut bundle = DependencyBundle::new();
        let mut chain = ResolutionChain::new(self.config.clone());

        for key in root.required_capabilities() {
            if let Err(cause) = self.acquire_into(&key, &mut record, &mut bundle, &mut chain) {
                warn!("注入根对象 {} 失败，回滚 {} 个条目", root.root_name(), record.entries.len());
                self.rollback(record);
                return Err(GraphError::InjectionFailed {
                    root: root.root_name().to_string(),
                    source: Box::new(cause),
                });
            }
        }

        for key in root.optional_capabilities() {
            // 未注册的可选能力不是错误；已注册的可选能力照常获取，
            // 其闭包内的失败仍然回滚整次注入
            if !self.registry.is_registered(&key) {
                debug!("可选能力 {} 未注册，跳过", key);
                continue;
            }

            if let Err(cause) = self.acquire_into(&key, &mut record, &mut bundle, &mut chain) {
                warn!("注入根对象 {} 失败，回滚 {} 个条目", root.root_name(), record.entries.len());
                self.rollback(record);
                return Err(GraphError::InjectionFailed {
                    root: root.root_name().to_string(),
                    source: Box::new(cause),
                });
            }
        }

        info!("根对象 {} 注入完成，解析 {} 个能力", root.root_name(), record.entries.len());
        self.records.lock().insert(Self::root_identity(root), record);
        Ok(bundle)
    }

    async fn release(&self, root: &Arc<dyn InjectionRoot>) -> GraphResult<()> {
        let _guard = self.mutation_lock.lock().await;

        let Some(record) = self.records.lock().remove(&Self::root_identity(root)) else {
            // 外部生命周期可能重复释放同一个根，保持幂等
            debug!("根对象 {} 没有注入记录，忽略释放", root.root_name());
            return Ok(());
        };

        debug!("释放根对象 {}: {} 个条目", record.root_name, record.entries.len());

        let mut first_error = None;
        for entry in &record.entries {
            if let Err(e) = self.release_entry(entry) {
                error!("释放根对象 {} 的 {} 失败: {}", record.root_name, entry.key, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn purge_scope(&self, scope: &str) -> GraphResult<()> {
        let _guard = self.mutation_lock.lock().await;

        let Some((_, cache)) = self.caches.remove(scope) else {
            return Err(GraphError::ScopeNotFound {
                scope: scope.to_string(),
            });
        };

        let purged = cache.purge();
        for (key, instance) in &purged {
            self.notify_disposed(key, instance);
        }

        info!("作用域 {} 已销毁，逐出 {} 个条目", scope, purged.len());
        Ok(())
    }

    fn add_monitor(&self, monitor: Arc<dyn GraphMonitor>) {
        self.monitors.write().push(monitor);
    }

    fn stats(&self) -> GraphStats {
        let created = self.created.load(Ordering::SeqCst);
        let disposed = self.disposed.load(Ordering::SeqCst);

        GraphStats {
            instances_created: created,
            instances_disposed: disposed,
            live_instances: created.saturating_sub(disposed),
            injected_roots: self.records.lock().len(),
        }
    }

    fn active_scopes(&self) -> Vec<ScopeDescriptor> {
        self.caches.iter().map(|cache| cache.descriptor()).collect()
    }
}

impl std::fmt::Debug for ObjectGraphImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectGraphImpl")
            .field("scopes", &self.caches.len())
            .field("stats", &self.stats())
            .finish()
    }
}
