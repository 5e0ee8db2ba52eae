//! 错误类型定义

use crate::capability::CapabilityKey;
use thiserror::Error;

/// 对象图错误类型
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("无法解析能力: {key}")]
    UnresolvedCapability { key: String },

    #[error("注入失败: {root}, 原因: {source}")]
    InjectionFailed {
        root: String,
        #[source]
        source: Box<GraphError>,
    },

    #[error("引用计数下溢: {key}, 释放操作没有匹配的注入")]
    RefCountUnderflow { key: String },

    #[error("检测到循环依赖: {chain}")]
    CircularDependency { chain: String },

    #[error("解析深度超过上限: {max_depth}")]
    ResolutionTooDeep { max_depth: usize },

    #[error("组件实例创建失败: {key}, 原因: {message}")]
    InstanceCreationFailed { key: String, message: String },

    #[error("类型不匹配: 期望 {expected}")]
    TypeMismatch { expected: String },

    #[error("作用域不存在: {scope}")]
    ScopeNotFound { scope: String },
}

impl GraphError {
    /// 创建实例创建失败错误
    pub fn creation_failed(key: &CapabilityKey, message: impl Into<String>) -> Self {
        Self::InstanceCreationFailed {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// 状态持久化错误类型
#[derive(Error, Debug)]
pub enum StateError {
    #[error("模型编码失败: {key}, 原因: {message}")]
    EncodeFailed { key: String, message: String },

    #[error("模型解码失败: {key}, 原因: {message}")]
    DecodeFailed { key: String, message: String },

    #[error("模型导出失败: {message}")]
    ExportFailed { message: String },

    #[error("模型装载失败: {message}")]
    ImportFailed { message: String },

    #[error("序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },
}

/// 单个条目的状态恢复降级
///
/// 可恢复错误：该条目的模型已重置为默认构造状态，恢复过程继续处理其余条目。
#[derive(Error, Debug)]
#[error("状态恢复降级: {key}, 原因: {cause}")]
pub struct StateRestoreDegraded {
    /// 降级条目的能力键
    pub key: CapabilityKey,
    /// 降级原因
    #[source]
    pub cause: StateError,
}

/// 事件路由错误类型
#[derive(Error, Debug)]
pub enum EventError {
    #[error("订阅者 {subscriber} 对事件类型 {event} 重复注册处理器")]
    DuplicateHandler { subscriber: String, event: String },

    #[error("订阅者 {subscriber} 处理事件 {event} 失败: {message}")]
    HandlerFailed {
        subscriber: String,
        event: String,
        message: String,
    },

    #[error("投递通道已关闭: {bus}")]
    DeliveryChannelClosed { bus: String },
}

/// 结果类型别名
pub type GraphResult<T> = Result<T, GraphError>;
pub type StateResult<T> = Result<T, StateError>;
pub type EventResult<T> = Result<T, EventError>;
