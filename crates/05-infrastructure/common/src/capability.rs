//! 能力查找键定义
//!
//! 提供对象图中所有查找操作使用的不可变键

use std::any::TypeId;
use std::fmt;

/// 能力查找键
///
/// 标识一个被请求的组件类型，可附带命名限定符以区分同一类型的多个变体。
/// 相等性和哈希只考虑类型和限定符，类型名称仅用于诊断输出。
#[derive(Debug, Clone)]
pub struct CapabilityKey {
    /// 类型ID
    type_id: TypeId,
    /// 类型名称（诊断用）
    type_name: &'static str,
    /// 命名限定符
    qualifier: Option<String>,
}

impl CapabilityKey {
    /// 从类型创建能力键
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            qualifier: None,
        }
    }

    /// 从类型和限定符创建能力键
    pub fn qualified<T: ?Sized + 'static>(qualifier: impl Into<String>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            qualifier: Some(qualifier.into()),
        }
    }

    /// 替换限定符，保留类型
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// 获取类型ID
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// 获取完整类型名称
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// 获取限定符
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// 获取简短类型名称（不含模块路径）
    pub fn short_name(&self) -> &'static str {
        self.type_name.rsplit("::").next().unwrap_or(self.type_name)
    }
}

impl PartialEq for CapabilityKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.qualifier == other.qualifier
    }
}

impl Eq for CapabilityKey {}

impl std::hash::Hash for CapabilityKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}@{}", self.short_name(), qualifier),
            None => write!(f, "{}", self.short_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ServiceA;
    struct ServiceB;

    #[test]
    fn keys_of_same_type_are_equal() {
        assert_eq!(CapabilityKey::of::<ServiceA>(), CapabilityKey::of::<ServiceA>());
        assert_ne!(CapabilityKey::of::<ServiceA>(), CapabilityKey::of::<ServiceB>());
    }

    #[test]
    fn qualifier_distinguishes_variants() {
        let plain = CapabilityKey::of::<ServiceA>();
        let named = CapabilityKey::qualified::<ServiceA>("primary");

        assert_ne!(plain, named);
        assert_eq!(named, CapabilityKey::qualified::<ServiceA>("primary"));
        assert_ne!(named, CapabilityKey::qualified::<ServiceA>("secondary"));
    }

    #[test]
    fn display_renders_short_name_and_qualifier() {
        let named = CapabilityKey::qualified::<ServiceA>("primary");
        assert_eq!(named.to_string(), "ServiceA@primary");
        assert_eq!(CapabilityKey::of::<ServiceB>().to_string(), "ServiceB");
    }
}
