//! # Composition
//!
//! Mvc 运行时的组合根：加载运行时选项、装配对象图、状态协调器与
//! 三条事件总线，并提供可选的进程级运行时上下文。
//!
//! 运行时实例显式构造、显式传递；测试环境各自构造独立实例。

pub mod builder;
pub mod options;
pub mod runtime;

pub use builder::RuntimeBuilder;
pub use options::{EventOptions, GraphOptions, PersistenceOptions, RuntimeOptions};
pub use runtime::{
    clear_process_runtime, install_process_runtime, process_runtime, MvcRuntime,
};

use runtime_common::{EventError, GraphError, StateError};
use thiserror::Error;

/// 运行时装配与门面错误类型
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: config::ConfigError,
    },

    #[error("对象图错误: {source}")]
    GraphError {
        #[from]
        source: GraphError,
    },

    #[error("状态持久化错误: {source}")]
    StateError {
        #[from]
        source: StateError,
    },

    #[error("事件路由错误: {source}")]
    EventError {
        #[from]
        source: EventError,
    },

    #[error("未知的状态编解码器: {name}")]
    UnknownCodec { name: String },
}

/// 结果类型别名
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// 初始化日志订阅器
///
/// 过滤级别取自 `RUST_LOG` 环境变量，缺省为 `info`。
/// 重复调用是无操作，方便测试环境随意调用。
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
