//! 受管组件基础接口定义
//!
//! 提供所有由对象图管理的组件必须实现的基础 trait

use crate::errors::StateResult;
use std::any::Any;
use std::sync::Arc;

/// 受管组件基础 trait
///
/// 所有由对象图创建和释放的组件都必须实现此 trait。
/// 消费方通过 [`ManagedComponent::into_any`] 将共享实例还原为具体类型。
pub trait ManagedComponent: Send + Sync + 'static {
    /// 组件名称
    fn component_name(&self) -> &str;

    /// 转换为 `Any` 以支持向下转型
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// 实例被逐出缓存时的清理钩子
    fn on_disposed(&self) {}

    /// 组件的可持久化状态能力
    ///
    /// 携带可持久化模型的组件返回 `Some`，状态协调器据此跟踪实例。
    fn as_stateful(&self) -> Option<&dyn StatefulComponent> {
        None
    }
}

/// 可持久化状态组件 trait
///
/// 模型以结构化值进出，具体序列化格式由可替换的编解码器决定。
pub trait StatefulComponent: Send + Sync {
    /// 导出当前模型
    fn export_model(&self) -> StateResult<serde_json::Value>;

    /// 将恢复的模型装载到组件上
    ///
    /// 在恢复检查点期间、实例开始处理业务调用之前调用。
    fn import_model(&self, model: serde_json::Value) -> StateResult<()>;

    /// 将模型重置为默认构造状态
    ///
    /// 单个条目解码失败后的降级路径。
    fn reset_model(&self);
}
