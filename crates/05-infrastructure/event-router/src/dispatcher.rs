//! 共享分发机制
//!
//! 三条总线复用同一套订阅登记与特异性匹配逻辑，仅投递线程策略不同。

use crate::event::RoutedEvent;
use parking_lot::RwLock;
use runtime_common::{EventError, EventResult};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::error;

/// 擦除类型的事件处理器
type ErasedHandler = Arc<dyn Fn(&dyn RoutedEvent) -> EventResult<()> + Send + Sync>;

/// 路由器级错误接收器
pub type ErrorSink = Arc<dyn Fn(&EventError) + Send + Sync>;

/// 订阅者声明
///
/// 每个事件类型至多登记一个回调；对同一类型重复登记是配置错误。
pub struct SubscriberSpec {
    /// 订阅者名称
    name: String,
    /// 事件类型到处理器的映射
    handlers: HashMap<TypeId, ErasedHandler>,
}

impl SubscriberSpec {
    /// 创建新的订阅者声明
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: HashMap::new(),
        }
    }

    /// 登记一个事件类型的回调
    pub fn on<E, F>(mut self, handler: F) -> EventResult<Self>
    where
        E: RoutedEvent,
        F: Fn(&E) -> EventResult<()> + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<E>();
        if self.handlers.contains_key(&type_id) {
            return Err(EventError::DuplicateHandler {
                subscriber: self.name.clone(),
                event: std::any::type_name::<E>().to_string(),
            });
        }

        let subscriber = self.name.clone();
        self.handlers.insert(
            type_id,
            Arc::new(move |event: &dyn RoutedEvent| {
                let Some(typed) = event.as_any().downcast_ref::<E>() else {
                    return Err(EventError::HandlerFailed {
                        subscriber: subscriber.clone(),
                        event: event.event_name().to_string(),
                        message: "事件类型与处理器签名不匹配".to_string(),
                    });
                };
                handler(typed)
            }),
        );

        Ok(self)
    }

    /// 订阅者名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 已登记的处理器数量
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl std::fmt::Debug for SubscriberSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberSpec")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// 订阅句柄
///
/// 注销订阅者的唯一方式；句柄按注册顺序单调递增。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberHandle(u64);

struct SubscriberEntry {
    handle: SubscriberHandle,
    spec: Arc<SubscriberSpec>,
}

/// 事件分发器
///
/// 订阅者按注册顺序投递；投递遍历发布时刻的稳定快照，
/// 处理器内发起的注销在本轮投递结束后才生效。
pub struct Dispatcher {
    /// 所属总线名称
    bus_name: String,
    /// 注册顺序的订阅者列表
    subscribers: RwLock<Vec<SubscriberEntry>>,
    /// 错误接收器
    error_sink: RwLock<ErrorSink>,
    /// 下一个句柄值
    next_handle: AtomicU64,
}

impl Dispatcher {
    /// 创建新的分发器
    pub fn new(bus_name: impl Into<String>) -> Self {
        let bus_name = bus_name.into();
        let sink_bus = bus_name.clone();
        let default_sink: ErrorSink = Arc::new(move |e| {
            error!("总线 {} 投递错误: {}", sink_bus, e);
        });

        Self {
            bus_name,
            subscribers: RwLock::new(Vec::new()),
            error_sink: RwLock::new(default_sink),
            next_handle: AtomicU64::new(0),
        }
    }

    /// 所属总线名称
    pub fn bus_name(&self) -> &str {
        &self.bus_name
    }

    /// 注册订阅者
    pub fn register(&self, spec: SubscriberSpec) -> SubscriberHandle {
        let handle = SubscriberHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.subscribers.write().push(SubscriberEntry {
            handle,
            spec: Arc::new(spec),
        });
        handle
    }

    /// 注销订阅者的全部处理器
    pub fn unregister(&self, handle: SubscriberHandle) {
        self.subscribers.write().retain(|entry| entry.handle != handle);
    }

    /// 替换错误接收器
    pub fn set_error_sink(&self, sink: ErrorSink) {
        *self.error_sink.write() = sink;
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// 向匹配的订阅者投递事件
    ///
    /// 每个订阅者只收到谱系中最特异的一个处理器调用；
    /// 单个订阅者的失败交给错误接收器，不影响后续订阅者。
    pub fn dispatch(&self, event: &dyn RoutedEvent) {
        let snapshot: Vec<Arc<SubscriberSpec>> = self
            .subscribers
            .read()
            .iter()
            .map(|entry| entry.spec.clone())
            .collect();

        let lineage = event.type_lineage();

        for spec in snapshot {
            let Some(handler) = lineage.iter().find_map(|type_id| spec.handlers.get(type_id))
            else {
                continue;
            };

            if let Err(e) = handler(event) {
                let sink = self.error_sink.read().clone();
                sink(&e);
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("bus_name", &self.bus_name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
