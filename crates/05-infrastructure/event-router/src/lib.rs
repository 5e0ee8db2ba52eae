//! # Event Router
//!
//! 类型化的多总线事件路由。三条总线共享同一套分发机制，
//! 仅投递线程契约不同：
//!
//! - [`UiThreadBus`] - 下行总线，发布立即返回，投递汇集到单一逻辑线程
//! - [`SyncEventBus`] - 横向总线（控制器间、视图间各一条），在发布者线程上同步投递
//!
//! 订阅者通过 [`SubscriberSpec`] 显式注册每个事件类型的回调，
//! 特异性由事件自身声明的线性类型谱系决定，不做运行时类型扫描。

pub mod dispatcher;
pub mod event;
pub mod sync_bus;
pub mod ui_bus;

pub use dispatcher::{Dispatcher, ErrorSink, SubscriberHandle, SubscriberSpec};
pub use event::RoutedEvent;
pub use sync_bus::SyncEventBus;
pub use ui_bus::UiThreadBus;
