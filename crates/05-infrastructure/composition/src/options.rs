//! 运行时选项
//!
//! 分层加载：内置默认值 <- 可选的 TOML 配置文件 <- `MVC_` 前缀环境变量

use config::{Config, Environment, File};
use graph_abstractions::GraphConfig;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// 对象图选项
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    /// 是否启用循环依赖检测
    pub enable_circular_dependency_detection: bool,
    /// 最大解析深度
    pub max_resolution_depth: usize,
}

impl Default for GraphOptions {
    fn default() -> Self {
        let config = GraphConfig::default();
        Self {
            enable_circular_dependency_detection: config.enable_circular_dependency_detection,
            max_resolution_depth: config.max_resolution_depth,
        }
    }
}

impl GraphOptions {
    /// 转换为对象图配置
    pub fn to_graph_config(&self) -> GraphConfig {
        GraphConfig {
            enable_circular_dependency_detection: self.enable_circular_dependency_detection,
            max_resolution_depth: self.max_resolution_depth,
        }
    }
}

/// 事件总线选项
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventOptions {
    /// 下行总线名称
    pub downstream_bus_name: String,
    /// 控制器间总线名称
    pub controller_bus_name: String,
    /// 视图间总线名称
    pub view_bus_name: String,
}

impl Default for EventOptions {
    fn default() -> Self {
        Self {
            downstream_bus_name: "controller-to-view".to_string(),
            controller_bus_name: "controller-to-controller".to_string(),
            view_bus_name: "view-to-view".to_string(),
        }
    }
}

/// 状态持久化选项
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceOptions {
    /// 编解码器名称
    pub codec: String,
}

impl Default for PersistenceOptions {
    fn default() -> Self {
        Self {
            codec: "json".to_string(),
        }
    }
}

/// 运行时选项
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeOptions {
    /// 对象图选项
    pub graph: GraphOptions,
    /// 事件总线选项
    pub events: EventOptions,
    /// 状态持久化选项
    pub persistence: PersistenceOptions,
}

impl RuntimeOptions {
    /// 分层加载运行时选项
    ///
    /// `path` 为空时只叠加环境变量；文件存在性由调用方保证。
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!("加载运行时配置文件: {}", path.display());
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(Environment::with_prefix("MVC").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
