//! 运行时门面
//!
//! 把对象图、状态协调器与三条总线聚合为一个显式构造的运行时实例。

use event_router::{SyncEventBus, UiThreadBus};
use graph_abstractions::{DependencyBundle, GraphStats, InjectionRoot, ObjectGraph};
use graph_impl::{CapabilityRegistryImpl, ObjectGraphImpl};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use runtime_common::{CapabilityKey, GraphError, GraphResult, GLOBAL_SCOPE};
use state_keeper::{StateBlob, StateKeeper, StateRestoreReport};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Mvc 运行时
///
/// 进程启动时构造，进程结束时调用 [`MvcRuntime::shutdown`] 拆除。
/// 没有隐藏的全局实例；需要进程级共享时使用 [`install_process_runtime`]。
pub struct MvcRuntime {
    registry: Arc<CapabilityRegistryImpl>,
    graph: Arc<ObjectGraphImpl>,
    state_keeper: Arc<StateKeeper>,
    controller_bus: SyncEventBus,
    view_bus: SyncEventBus,
    downstream_bus: Arc<UiThreadBus>,
}

impl MvcRuntime {
    pub(crate) fn new(
        registry: Arc<CapabilityRegistryImpl>,
        graph: Arc<ObjectGraphImpl>,
        state_keeper: Arc<StateKeeper>,
        controller_bus: SyncEventBus,
        view_bus: SyncEventBus,
        downstream_bus: Arc<UiThreadBus>,
    ) -> Self {
        Self {
            registry,
            graph,
            state_keeper,
            controller_bus,
            view_bus,
            downstream_bus,
        }
    }

    /// 能力注册表
    pub fn registry(&self) -> &Arc<CapabilityRegistryImpl> {
        &self.registry
    }

    /// 对象图
    pub fn graph(&self) -> &Arc<ObjectGraphImpl> {
        &self.graph
    }

    /// 状态协调器
    pub fn state_keeper(&self) -> &Arc<StateKeeper> {
        &self.state_keeper
    }

    /// 控制器间总线
    pub fn controller_bus(&self) -> &SyncEventBus {
        &self.controller_bus
    }

    /// 视图间总线
    pub fn view_bus(&self) -> &SyncEventBus {
        &self.view_bus
    }

    /// 下行总线
    pub fn downstream_bus(&self) -> &Arc<UiThreadBus> {
        &self.downstream_bus
    }

    /// 注入根对象
    pub async fn inject(&self, root: &Arc<dyn InjectionRoot>) -> GraphResult<DependencyBundle> {
        self.graph.inject(root).await
    }

    /// 释放根对象
    pub async fn release(&self, root: &Arc<dyn InjectionRoot>) -> GraphResult<()> {
        self.graph.release(root).await
    }

    /// 保存检查点：快照全部可持久化实例
    ///
    /// 调用方保证检查点期间图处于静止状态。
    pub fn snapshot_all(&self) -> HashMap<CapabilityKey, StateBlob> {
        self.state_keeper.snapshot_all()
    }

    /// 恢复检查点：把快照装载回存活实例
    pub fn restore_all(&self, blobs: HashMap<CapabilityKey, StateBlob>) -> StateRestoreReport {
        self.state_keeper.restore_all(blobs)
    }

    /// 图统计信息
    pub fn stats(&self) -> GraphStats {
        self.graph.stats()
    }

    /// 拆除运行时
    ///
    /// 销毁全局作用域并停止下行总线的投递任务。
    pub async fn shutdown(&self) {
        info!("拆除 Mvc 运行时");

        match self.graph.purge_scope(GLOBAL_SCOPE).await {
            Ok(()) => {}
            Err(GraphError::ScopeNotFound { .. }) => {
                debug!("全局作用域已销毁");
            }
            Err(e) => {
                debug!("销毁全局作用域失败: {}", e);
            }
        }

        self.downstream_bus.shutdown().await;
    }
}

impl std::fmt::Debug for MvcRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MvcRuntime")
            .field("stats", &self.graph.stats())
            .field("tracked_state", &self.state_keeper.tracked_count())
            .finish()
    }
}

/// 进程级运行时槽位
static PROCESS_RUNTIME: Lazy<RwLock<Option<Arc<MvcRuntime>>>> = Lazy::new(|| RwLock::new(None));

/// 安装进程级运行时
///
/// 窄的进程生命周期上下文：进程启动时安装一次，结束时清除。
pub fn install_process_runtime(runtime: Arc<MvcRuntime>) {
    *PROCESS_RUNTIME.write() = Some(runtime);
}

/// 获取进程级运行时
pub fn process_runtime() -> Option<Arc<MvcRuntime>> {
    PROCESS_RUNTIME.read().clone()
}

/// 清除进程级运行时
pub fn clear_process_runtime() {
    *PROCESS_RUNTIME.write() = None;
}
