//! 能力注册表实现

use graph_abstractions::{CapabilityRegistry, DependencyBundle, Provider};
use parking_lot::RwLock;
use runtime_common::{
    CapabilityKey, ConventionRules, GraphError, GraphResult, ManagedComponent,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 能力注册表实现
///
/// 显式覆盖层优先于约定默认层。同键重复注册原子替换旧提供者；
/// 已物化的缓存条目不随注册表变更失效。
pub struct CapabilityRegistryImpl {
    /// 显式注册的提供者
    overrides: RwLock<HashMap<CapabilityKey, Provider>>,
    /// 约定默认提供者
    defaults: RwLock<HashMap<CapabilityKey, Provider>>,
    /// 注册期约定规范
    conventions: ConventionRules,
}

impl CapabilityRegistryImpl {
    /// 创建带默认约定的注册表
    pub fn new() -> Self {
        Self::with_conventions(ConventionRules::new())
    }

    /// 创建使用指定约定的注册表
    pub fn with_conventions(conventions: ConventionRules) -> Self {
        Self {
            overrides: RwLock::new(HashMap::new()),
            defaults: RwLock::new(HashMap::new()),
            conventions,
        }
    }

    /// 按约定批量注册入口
    ///
    /// 从类型简称推导默认作用域后注册到约定默认层。
    /// 约定只在此处求值，解析路径不做名称推导。
    pub fn register_by_convention<T, F>(&self, factory: F) -> CapabilityKey
    where
        T: ManagedComponent,
        F: Fn(&DependencyBundle) -> GraphResult<Arc<T>> + Send + Sync + 'static,
    {
        let key = CapabilityKey::of::<T>();
        let scope = self.conventions.scope_for(key.short_name());
        debug!("按约定注册 {}: 作用域 {}", key, scope);

        self.register_default(Provider::new(factory).with_scope(scope));
        key
    }
}

impl Default for CapabilityRegistryImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityRegistry for CapabilityRegistryImpl {
    fn register(&self, provider: Provider) {
        debug!("显式注册提供者: {}", provider.key());
        self.overrides.write().insert(provider.key().clone(), provider);
    }

    fn register_default(&self, provider: Provider) {
        self.defaults.write().insert(provider.key().clone(), provider);
    }

    fn resolve(&self, key: &CapabilityKey) -> GraphResult<Provider> {
        if let Some(provider) = self.overrides.read().get(key) {
            return Ok(provider.clone());
        }

        self.defaults
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| GraphError::UnresolvedCapability {
                key: key.to_string(),
            })
    }

    fn unregister(&self, key: &CapabilityKey) {
        self.overrides.write().remove(key);
        self.defaults.write().remove(key);
    }

    fn is_registered(&self, key: &CapabilityKey) -> bool {
        self.overrides.read().contains_key(key) || self.defaults.read().contains_key(key)
    }

    fn registered_keys(&self) -> Vec<CapabilityKey> {
        let mut keys: Vec<CapabilityKey> = self.overrides.read().keys().cloned().collect();
        keys.extend(self.defaults.read().keys().cloned());

        let mut seen = std::collections::HashSet::new();
        keys.retain(|key| seen.insert(key.clone()));
        keys
    }
}

impl std::fmt::Debug for CapabilityRegistryImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistryImpl")
            .field("overrides", &self.overrides.read().len())
            .field("defaults", &self.defaults.read().len())
            .finish()
    }
}
