//! 能力注册表抽象接口

use crate::provider::Provider;
use runtime_common::{CapabilityKey, GraphResult};

/// 能力注册表 trait
///
/// 维护能力键到提供者的映射，分显式覆盖与约定默认两层。
/// 解析顺序：显式注册优先，其次约定默认，两者皆无则解析失败。
pub trait CapabilityRegistry: Send + Sync {
    /// 显式注册提供者
    ///
    /// 同键后注册者原子替换先注册者，供测试环境替换真实实现。
    /// 已物化的缓存条目不受注册表变更影响。
    fn register(&self, provider: Provider);

    /// 注册约定默认提供者
    fn register_default(&self, provider: Provider);

    /// 解析提供者
    fn resolve(&self, key: &CapabilityKey) -> GraphResult<Provider>;

    /// 注销能力键的全部提供者
    fn unregister(&self, key: &CapabilityKey);

    /// 检查能力键是否已注册
    fn is_registered(&self, key: &CapabilityKey) -> bool;

    /// 枚举所有已注册的能力键
    fn registered_keys(&self) -> Vec<CapabilityKey>;
}
