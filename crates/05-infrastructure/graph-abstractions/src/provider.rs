//! 提供者与依赖集定义
//!
//! 提供者把能力键绑定到工厂函数、作用域与显式声明的依赖列表。
//! 传递闭包完全由声明的依赖计算得出，不做任何字段扫描。

use runtime_common::{
    CapabilityKey, GraphError, GraphResult, ManagedComponent, ProviderScope,
};
use std::collections::HashMap;
use std::sync::Arc;

/// 提供者工厂函数类型
pub type ProviderFactoryFn =
    Arc<dyn Fn(&DependencyBundle) -> GraphResult<Arc<dyn ManagedComponent>> + Send + Sync>;

/// 能力提供者
///
/// 注册表中长期存活，可被显式注册原子替换（同键后注册者生效）。
#[derive(Clone)]
pub struct Provider {
    /// 绑定的能力键
    key: CapabilityKey,
    /// 作用域标识
    scope: ProviderScope,
    /// 显式单例标记
    singleton: bool,
    /// 声明的依赖能力
    dependencies: Vec<CapabilityKey>,
    /// 实例工厂
    factory: ProviderFactoryFn,
}

impl Provider {
    /// 为具体组件类型创建提供者
    pub fn new<T, F>(factory: F) -> Self
    where
        T: ManagedComponent,
        F: Fn(&DependencyBundle) -> GraphResult<Arc<T>> + Send + Sync + 'static,
    {
        Self {
            key: CapabilityKey::of::<T>(),
            scope: ProviderScope::Unscoped,
            singleton: false,
            dependencies: Vec::new(),
            factory: Arc::new(move |deps| {
                let instance = factory(deps)?;
                Ok(instance as Arc<dyn ManagedComponent>)
            }),
        }
    }

    /// 设置命名限定符
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.key = self.key.with_qualifier(qualifier);
        self
    }

    /// 设置作用域
    pub fn with_scope(mut self, scope: ProviderScope) -> Self {
        self.scope = scope;
        self
    }

    /// 声明依赖能力列表
    pub fn with_dependencies(mut self, dependencies: Vec<CapabilityKey>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// 标记为显式单例
    ///
    /// 未指定作用域的单例提升到全局作用域。
    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    /// 获取能力键
    pub fn key(&self) -> &CapabilityKey {
        &self.key
    }

    /// 获取声明的作用域
    pub fn scope(&self) -> &ProviderScope {
        &self.scope
    }

    /// 获取声明的依赖
    pub fn dependencies(&self) -> &[CapabilityKey] {
        &self.dependencies
    }

    /// 是否显式单例
    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    /// 计算生效作用域
    pub fn effective_scope(&self) -> ProviderScope {
        if self.singleton && !self.scope.is_scoped() {
            ProviderScope::global()
        } else {
            self.scope.clone()
        }
    }

    /// 用已解析的依赖创建实例
    pub fn create(&self, dependencies: &DependencyBundle) -> GraphResult<Arc<dyn ManagedComponent>> {
        (self.factory)(dependencies)
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("key", &self.key.to_string())
            .field("scope", &self.scope)
            .field("singleton", &self.singleton)
            .field("dependencies", &self.dependencies)
            .field("factory", &"<function>")
            .finish()
    }
}

/// 已解析依赖集
///
/// 注入操作的返回值：根对象闭包中每个能力键到实例的映射。
#[derive(Default)]
pub struct DependencyBundle {
    entries: HashMap<CapabilityKey, Arc<dyn ManagedComponent>>,
}

impl DependencyBundle {
    /// 创建空依赖集
    pub fn new() -> Self {
        Self::default()
    }

    /// 放入实例
    pub fn insert(&mut self, key: CapabilityKey, instance: Arc<dyn ManagedComponent>) {
        self.entries.insert(key, instance);
    }

    /// 按键获取未转型的实例
    pub fn get_raw(&self, key: &CapabilityKey) -> Option<Arc<dyn ManagedComponent>> {
        self.entries.get(key).cloned()
    }

    /// 按类型获取实例
    pub fn get<T: ManagedComponent>(&self) -> GraphResult<Arc<T>> {
        self.downcast::<T>(&CapabilityKey::of::<T>())
    }

    /// 按类型和限定符获取实例
    pub fn get_qualified<T: ManagedComponent>(&self, qualifier: impl Into<String>) -> GraphResult<Arc<T>> {
        self.downcast::<T>(&CapabilityKey::qualified::<T>(qualifier))
    }

    /// 按类型获取可选实例
    ///
    /// 可选能力未被解析时返回 `None`；类型不匹配仍视为 `None`。
    pub fn try_get<T: ManagedComponent>(&self) -> Option<Arc<T>> {
        self.get::<T>().ok()
    }

    fn downcast<T: ManagedComponent>(&self, key: &CapabilityKey) -> GraphResult<Arc<T>> {
        let instance = self
            .get_raw(key)
            .ok_or_else(|| GraphError::UnresolvedCapability {
                key: key.to_string(),
            })?;

        instance
            .into_any()
            .downcast::<T>()
            .map_err(|_| GraphError::TypeMismatch {
                expected: key.type_name().to_string(),
            })
    }

    /// 依赖数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 枚举全部能力键
    pub fn keys(&self) -> impl Iterator<Item = &CapabilityKey> {
        self.entries.keys()
    }
}

impl std::fmt::Debug for DependencyBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyBundle")
            .field("keys", &self.entries.keys().map(ToString::to_string).collect::<Vec<_>>())
            .finish()
    }
}
