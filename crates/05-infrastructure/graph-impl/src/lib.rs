//! # 对象图具体实现
//!
//! 提供能力注册表、作用域缓存和对象图的具体实现。
//!
//! - [`CapabilityRegistryImpl`] - 两层（显式覆盖/约定默认）提供者注册表
//! - [`ScopeCache`] - 按作用域共享实例的引用计数缓存
//! - [`ObjectGraphImpl`] - 带回滚保证的传递闭包注入

pub mod cache;
pub mod graph;
pub mod registry;

pub use cache::{CacheEntry, ScopeCache};
pub use graph::ObjectGraphImpl;
pub use registry::CapabilityRegistryImpl;
