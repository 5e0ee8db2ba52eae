//! 对象图抽象接口
//!
//! 提供注入、释放与作用域管理的核心契约

use crate::monitor::GraphMonitor;
use crate::provider::DependencyBundle;
use async_trait::async_trait;
use runtime_common::{CapabilityKey, GraphError, GraphResult, ScopeDescriptor};
use std::sync::Arc;

/// 注入根 trait
///
/// 外部生命周期持有者（如一个正在挂载的界面）实现此 trait 声明自身需要的能力。
pub trait InjectionRoot: Send + Sync {
    /// 根对象名称（诊断用）
    fn root_name(&self) -> &str;

    /// 声明需要的能力
    fn required_capabilities(&self) -> Vec<CapabilityKey>;

    /// 声明可选的能力
    ///
    /// 未注册的可选能力在注入时静默跳过，不会导致注入失败；
    /// 依赖集里将不含对应条目。
    fn optional_capabilities(&self) -> Vec<CapabilityKey> {
        Vec::new()
    }
}

/// 对象图 trait
#[async_trait]
pub trait ObjectGraph: Send + Sync {
    /// 注入根对象
    ///
    /// 深度优先解析根对象声明能力的传递闭包并返回完整接线的依赖集。
    /// 闭包中任一获取失败时，已获取的条目全部回滚，缓存恢复到调用前状态。
    async fn inject(&self, root: &Arc<dyn InjectionRoot>) -> GraphResult<DependencyBundle>;

    /// 释放根对象
    ///
    /// 按注入记录逐项递减引用计数。无记录的释放是幂等空操作，
    /// 以容忍不确定的外部生命周期触发的重复释放。
    async fn release(&self, root: &Arc<dyn InjectionRoot>) -> GraphResult<()>;

    /// 强制销毁命名作用域
    ///
    /// 作用域所有者被销毁时调用，无视引用计数逐出并清理全部条目。
    async fn purge_scope(&self, scope: &str) -> GraphResult<()>;

    /// 添加图监视器
    fn add_monitor(&self, monitor: Arc<dyn GraphMonitor>);

    /// 获取图统计信息
    fn stats(&self) -> GraphStats;

    /// 枚举活跃作用域
    fn active_scopes(&self) -> Vec<ScopeDescriptor>;
}

/// 对象图配置
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// 是否启用循环依赖检测
    pub enable_circular_dependency_detection: bool,
    /// 最大解析深度
    pub max_resolution_depth: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            enable_circular_dependency_detection: true,
            max_resolution_depth: 100,
        }
    }
}

/// 对象图统计信息
#[derive(Debug, Clone, Default)]
pub struct GraphStats {
    /// 累计创建实例数量
    pub instances_created: usize,
    /// 累计销毁实例数量
    pub instances_disposed: usize,
    /// 当前存活实例数量
    pub live_instances: usize,
    /// 当前持有注入记录的根数量
    pub injected_roots: usize,
}

/// 解析链
///
/// 跟踪当前深度优先解析路径，用于检测循环依赖与深度越界。
#[derive(Debug)]
pub struct ResolutionChain {
    chain: Vec<CapabilityKey>,
    config: GraphConfig,
}

impl ResolutionChain {
    /// 创建新的解析链
    pub fn new(config: GraphConfig) -> Self {
        Self {
            chain: Vec::new(),
            config,
        }
    }

    /// 将能力键压入解析链
    pub fn push(&mut self, key: &CapabilityKey) -> GraphResult<()> {
        if self.chain.len() >= self.config.max_resolution_depth {
            return Err(GraphError::ResolutionTooDeep {
                max_depth: self.config.max_resolution_depth,
            });
        }

        if self.config.enable_circular_dependency_detection && self.chain.contains(key) {
            let rendered: Vec<String> = self.chain.iter().map(ToString::to_string).collect();
            return Err(GraphError::CircularDependency {
                chain: format!("{} -> {}", rendered.join(" -> "), key),
            });
        }

        self.chain.push(key.clone());
        Ok(())
    }

    /// 从解析链弹出最近的能力键
    pub fn pop(&mut self) {
        self.chain.pop();
    }
}
