//! 图监视器抽象接口

use runtime_common::{CapabilityKey, ManagedComponent};
use std::sync::Arc;

/// 图监视器 trait
///
/// 每次真实的实例创建和销毁各通知一次，而不是每次 acquire/release 调用。
/// 状态协调器据此增量维护存活实例集合，无需全量重扫缓存。
pub trait GraphMonitor: Send + Sync {
    /// 实例被创建
    fn on_instance_created(&self, key: &CapabilityKey, instance: &Arc<dyn ManagedComponent>);

    /// 实例被销毁
    fn on_instance_disposed(&self, key: &CapabilityKey, instance: &Arc<dyn ManagedComponent>);
}
