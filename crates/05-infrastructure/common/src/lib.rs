//! # Runtime Common
//!
//! 这个 crate 提供了 Mvc 运行时的公共 traits 和基础类型。
//!
//! ## 核心组件
//!
//! - [`CapabilityKey`] - 能力查找键
//! - [`ManagedComponent`] - 受管组件基础 trait
//! - [`StatefulComponent`] - 可持久化状态组件 trait
//! - [`ProviderScope`] - 提供者作用域
//! - [`ConventionRules`] - 注册期约定规范
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的编译时安全
//! - 显式注册优于运行时反射
//! - 错误按关注点分类，可恢复错误不中断整体流程

pub mod capability;
pub mod component;
pub mod conventions;
pub mod errors;
pub mod scope;

pub use capability::*;
pub use component::*;
pub use conventions::*;
pub use errors::*;
pub use scope::*;
