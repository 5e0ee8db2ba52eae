//! 路由事件定义
//!
//! 事件自身携带显式声明的类型谱系，路由器据此做特异性匹配。

use std::any::{Any, TypeId};

/// 可路由事件 trait
///
/// 类型谱系是一条线性链：自身类型在前，随后是声明的父类型，
/// 特异性递减。路由器对每个订阅者只投递谱系中第一个命中的处理器，
/// 因此同时订阅了父类型和精确类型的订阅者只收到精确类型那一次。
pub trait RoutedEvent: Any + Send + Sync {
    /// 事件名称（诊断用）
    fn event_name(&self) -> &'static str;

    /// 转换为 `Any` 以支持处理器向下转型
    fn as_any(&self) -> &dyn Any;

    /// 声明的类型谱系，自身类型在前
    fn type_lineage(&self) -> Vec<TypeId>;
}

/// 为具体事件类型实现 [`RoutedEvent`]
///
/// 不带父类型时谱系只含自身；`=>` 之后按特异性递减列出父事件类型。
///
/// ```
/// use event_router::routed_event;
///
/// struct TaskEvent;
/// struct TaskFinishedEvent;
///
/// routed_event!(TaskEvent);
/// routed_event!(TaskFinishedEvent => TaskEvent);
/// ```
#[macro_export]
macro_rules! routed_event {
    ($event:ty) => {
        impl $crate::RoutedEvent for $event {
            fn event_name(&self) -> &'static str {
                ::std::any::type_name::<$event>()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn type_lineage(&self) -> ::std::vec::Vec<::std::any::TypeId> {
                ::std::vec![::std::any::TypeId::of::<$event>()]
            }
        }
    };
    ($event:ty => $($parent:ty),+ $(,)?) => {
        impl $crate::RoutedEvent for $event {
            fn event_name(&self) -> &'static str {
                ::std::any::type_name::<$event>()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn type_lineage(&self) -> ::std::vec::Vec<::std::any::TypeId> {
                ::std::vec![
                    ::std::any::TypeId::of::<$event>(),
                    $(::std::any::TypeId::of::<$parent>()),+
                ]
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BaseEvent;
    struct RefinedEvent;

    routed_event!(BaseEvent);
    routed_event!(RefinedEvent => BaseEvent);

    #[test]
    fn lineage_starts_with_own_type() {
        let event = RefinedEvent;
        let lineage = event.type_lineage();

        assert_eq!(
            lineage,
            vec![TypeId::of::<RefinedEvent>(), TypeId::of::<BaseEvent>()]
        );
    }

    #[test]
    fn plain_event_has_single_entry_lineage() {
        let event = BaseEvent;
        assert_eq!(event.type_lineage(), vec![TypeId::of::<BaseEvent>()]);
    }
}
