//! 下行总线
//!
//! 发布与投递解耦：`post` 可以在任意线程调用并立即返回，
//! 投递汇集到唯一的消费任务上，即概念上的"UI 线程"。
//! 顺序保证是按发布线程的 FIFO，不是跨发布线程的全局 FIFO。

use crate::dispatcher::{Dispatcher, ErrorSink, SubscriberHandle, SubscriberSpec};
use crate::event::RoutedEvent;
use parking_lot::Mutex;
use runtime_common::{EventError, EventResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// 下行事件总线
///
/// 控制器向视图发布通知的通道。必须在 tokio 运行时上下文中创建。
pub struct UiThreadBus {
    /// 总线名称
    name: String,
    /// 共享分发器
    dispatcher: Arc<Dispatcher>,
    /// 发布端，关闭后置空
    sender: Mutex<Option<mpsc::UnboundedSender<Box<dyn RoutedEvent>>>>,
    /// 投递任务
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl UiThreadBus {
    /// 创建总线并启动投递任务
    pub fn spawn(name: impl Into<String>) -> Self {
        let name = name.into();
        let dispatcher = Arc::new(Dispatcher::new(name.clone()));
        let (sender, mut receiver) = mpsc::unbounded_channel::<Box<dyn RoutedEvent>>();

        // 单一消费任务即固定的逻辑投递线程
        let worker_dispatcher = dispatcher.clone();
        let worker_name = name.clone();
        let worker = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                worker_dispatcher.dispatch(event.as_ref());
            }
            debug!("总线 {} 投递任务退出", worker_name);
        });

        Self {
            name,
            dispatcher,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// 总线名称
    pub fn name(&self) -> &str {
        &self.name
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

    /// 发布事件
    ///
    /// 立即返回；投递相对发布者异步进行。
    pub fn post(&self, event: Box<dyn RoutedEvent>) -> EventResult<()> {
        trace!("总线 {} 发布 {}", self.name, event.event_name());

        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(EventError::DeliveryChannelClosed {
                bus: self.name.clone(),
            });
        };

        sender.send(event).map_err(|_| EventError::DeliveryChannelClosed {
            bus: self.name.clone(),
        })
    }

    /// 关闭总线
    ///
    /// 关闭发布通道，排空剩余事件后等待投递任务结束。
    pub async fn shutdown(&self) {
        let sender = self.sender.lock().take();
        drop(sender);

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
        debug!("总线 {} 已关闭", self.name);
    }
}

impl std::fmt::Debug for UiThreadBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiThreadBus")
            .field("name", &self.name)
            .field("subscribers", &self.subscriber_count())
            .field("open", &self.sender.lock().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routed_event;

    struct StepEvent {
        sequence: u32,
    }

    struct FlushEvent {
        done: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
    }

    routed_event!(StepEvent);
    routed_event!(FlushEvent);

    /// 发布一个冲刷事件并等待它被投递，确保之前的事件都已处理
    async fn flush(bus: &UiThreadBus) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        bus.post(Box::new(FlushEvent {
            done: Mutex::new(Some(tx)),
        }))
        .unwrap();
        rx.await.unwrap();
    }

    fn register_flush_listener(bus: &UiThreadBus) {
        bus.register(
            SubscriberSpec::new("flush")
                .on::<FlushEvent, _>(|event| {
                    if let Some(done) = event.done.lock().take() {
                        let _ = done.send(());
                    }
                    Ok(())
                })
                .unwrap(),
        );
    }

    #[tokio::test]
    async fn post_returns_immediately_and_delivers_async() {
        let bus = UiThreadBus::spawn("downstream");
        let received = Arc::new(Mutex::new(Vec::new()));

        let sink = received.clone();
        bus.register(
            SubscriberSpec::new("view")
                .on::<StepEvent, _>(move |event| {
                    sink.lock().push(event.sequence);
                    Ok(())
                })
                .unwrap(),
        );
        register_flush_listener(&bus);

        for sequence in 1..=3 {
            bus.post(Box::new(StepEvent { sequence })).unwrap();
        }
        flush(&bus).await;

        // 同一发布线程的事件按 FIFO 到达
        assert_eq!(*received.lock(), vec![1, 2, 3]);
        bus.shutdown().await;
    }

    #[tokio::test]
    async fn events_from_many_publishers_all_arrive() {
        let bus = Arc::new(UiThreadBus::spawn("downstream"));
        let received = Arc::new(Mutex::new(Vec::new()));

        let sink = received.clone();
        bus.register(
            SubscriberSpec::new("view")
                .on::<StepEvent, _>(move |event| {
                    sink.lock().push(event.sequence);
                    Ok(())
                })
                .unwrap(),
        );
        register_flush_listener(&bus);

        let mut publishers = Vec::new();
        for base in 0..4u32 {
            let bus = bus.clone();
            publishers.push(tokio::spawn(async move {
                for offset in 0..8u32 {
                    bus.post(Box::new(StepEvent {
                        sequence: base * 100 + offset,
                    }))
                    .unwrap();
                }
            }));
        }
        for publisher in publishers {
            publisher.await.unwrap();
        }
        flush(&bus).await;

        let received = received.lock();
        assert_eq!(received.len(), 32);

        // 每个发布任务内部保持 FIFO
        for base in 0..4u32 {
            let per_publisher: Vec<u32> = received
                .iter()
                .copied()
                .filter(|sequence| sequence / 100 == base)
                .collect();
            let expected: Vec<u32> = (0..8u32).map(|offset| base * 100 + offset).collect();
            assert_eq!(per_publisher, expected);
        }

        bus.shutdown().await;
    }

    #[tokio::test]
    async fn post_after_shutdown_reports_closed_channel() {
        let bus = UiThreadBus::spawn("downstream");
        bus.shutdown().await;

        let result = bus.post(Box::new(StepEvent { sequence: 1 }));
        assert!(matches!(
            result,
            Err(EventError::DeliveryChannelClosed { .. })
        ));
    }
}
