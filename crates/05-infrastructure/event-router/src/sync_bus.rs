//! 横向同步总线
//!
//! 发布即投递：`post` 在发布者自己的线程上同步调用全部匹配的处理器，
//! 返回前投递完毕。阻塞的处理器会阻塞发布者。

use crate::dispatcher::{Dispatcher, ErrorSink, SubscriberHandle, SubscriberSpec};
use crate::event::RoutedEvent;
use std::sync::Arc;
use tracing::trace;

/// 横向同步事件总线
///
/// 运行时装配两条实例：控制器间协调与视图间协调各一条。
#[derive(Clone, Debug)]
pub struct SyncEventBus {
    dispatcher: Arc<Dispatcher>,
}

impl SyncEventBus {
    /// 创建新的同步总线
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(name)),
        }
    }

    /// 总线名称
    pub fn name(&self) -> &str {
        self.dispatcher.bus_name()
    }

    /// 注册订阅者
    pub fn register(&self, spec: SubscriberSpec) -> SubscriberHandle {
        self.dispatcher.register(spec)
    }

    /// 注销订阅者
    pub fn unregister(&self, handle: SubscriberHandle) {
        self.dispatcher.unregister(handle)
    }

    /// 替换错误接收器
    pub fn set_error_sink(&self, sink: ErrorSink) {
        self.dispatcher.set_error_sink(sink)
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.dispatcher.subscriber_count()
    }

    /// 在调用者线程上同步投递事件
    pub fn post(&self, event: &dyn RoutedEvent) {
        trace!("总线 {} 同步投递 {}", self.name(), event.event_name());
        self.dispatcher.dispatch(event);
    }
}
