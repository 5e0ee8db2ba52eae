//! 提供者作用域定义
//!
//! 描述实例在对象图中的共享范围

use std::fmt;

/// 默认全局作用域名称
///
/// 全局作用域的缓存与进程同生命周期，更窄的命名作用域由其创建者负责销毁。
pub const GLOBAL_SCOPE: &str = "global";

/// 提供者作用域
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProviderScope {
    /// 不缓存，每次获取都创建新实例
    Unscoped,
    /// 在命名作用域内共享单一实例
    Scoped(String),
}

impl ProviderScope {
    /// 创建全局作用域
    pub fn global() -> Self {
        Self::Scoped(GLOBAL_SCOPE.to_string())
    }

    /// 创建命名作用域
    pub fn named(name: impl Into<String>) -> Self {
        Self::Scoped(name.into())
    }

    /// 获取作用域名称
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Unscoped => None,
            Self::Scoped(name) => Some(name),
        }
    }

    /// 是否为缓存作用域
    pub fn is_scoped(&self) -> bool {
        matches!(self, Self::Scoped(_))
    }
}

impl Default for ProviderScope {
    fn default() -> Self {
        Self::Unscoped
    }
}

impl fmt::Display for ProviderScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unscoped => write!(f, "unscoped"),
            Self::Scoped(name) => write!(f, "{name}"),
        }
    }
}

/// 活跃作用域描述符
///
/// 用于诊断输出，枚举对象图当前持有的作用域缓存。
#[derive(Debug, Clone)]
pub struct ScopeDescriptor {
    /// 作用域名称
    pub name: String,
    /// 作用域实例ID
    pub id: uuid::Uuid,
    /// 创建时间
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// 当前缓存条目数量
    pub entry_count: usize,
}
