//! # Navigation Controller
//!
//! 位置栈导航控制器：一个骑在对象图上的受管单例。
//! 每次成功的栈变更都在下行总线上发布携带新当前位置的事件；
//! 位置栈本身是可持久化模型，随保存/恢复检查点整体往返。

use event_router::{routed_event, UiThreadBus};
use graph_abstractions::Provider;
use parking_lot::Mutex;
use runtime_common::{
    EventResult, ManagedComponent, StatefulComponent, StateError, StateResult,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// 位置栈条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavLocation {
    /// 位置标识
    pub location_id: String,
    /// 附带数据
    pub data: Option<serde_json::Value>,
}

/// 导航模型
///
/// 由导航控制器独占持有，只经控制器自身变更。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationModel {
    /// 位置栈，栈顶即当前位置
    pub stack: Vec<NavLocation>,
    /// 当前位置下标
    pub current_index: usize,
}

/// 导航变更事件
///
/// 携带变更后的当前位置，发布在下行总线上。
#[derive(Debug, Clone)]
pub struct NavigationChangedEvent {
    /// 新的当前位置
    pub location_id: String,
}

routed_event!(NavigationChangedEvent);

/// 导航操作结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// 已导航到新的当前位置
    Navigated(String),
    /// 栈深不足，保持原状
    ///
    /// 预期内的无操作结果，不是错误。
    AtRoot,
}

/// 导航控制器
///
/// 非重入状态机：模型互斥锁串行化并发导航调用。
pub struct NavigationController {
    /// 导航模型
    model: Mutex<NavigationModel>,
    /// 下行总线
    downstream: Arc<UiThreadBus>,
}

impl NavigationController {
    /// 创建新的导航控制器
    pub fn new(downstream: Arc<UiThreadBus>) -> Self {
        Self {
            model: Mutex::new(NavigationModel::default()),
            downstream,
        }
    }

    /// 构造注册用的单例提供者
    pub fn provider(downstream: Arc<UiThreadBus>) -> Provider {
        Provider::new(move |_| Ok(Arc::new(Self::new(downstream.clone())))).singleton()
    }

    /// 导航到新位置
    ///
    /// 压栈并把当前位置指向新栈顶，随后在下行总线上发布变更事件。
    pub fn navigate_to(
        &self,
        location_id: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> EventResult<()> {
        let location_id = location_id.into();

        {
            let mut model = self.model.lock();
            model.stack.push(NavLocation {
                location_id: location_id.clone(),
                data,
            });
            model.current_index = model.stack.len() - 1;
        }

        debug!("导航到 {}", location_id);
        self.publish_changed(location_id)
    }

    /// 返回上一个位置
    ///
    /// 栈深大于一时弹出栈顶并发布变更事件；否则不做任何变更，
    /// 返回 [`NavigationOutcome::AtRoot`]。
    pub fn navigate_back(&self) -> EventResult<NavigationOutcome> {
        let new_current = {
            let mut model = self.model.lock();
            if model.stack.len() <= 1 {
                debug!("已在根位置，忽略返回");
                return Ok(NavigationOutcome::AtRoot);
            }

            model.stack.pop();
            model.current_index = model.stack.len() - 1;
            model
                .stack
                .last()
                .map(|location| location.location_id.clone())
                .unwrap_or_default()
        };

        debug!("返回到 {}", new_current);
        self.publish_changed(new_current.clone())?;
        Ok(NavigationOutcome::Navigated(new_current))
    }

    /// 当前位置
    pub fn current_location(&self) -> Option<String> {
        let model = self.model.lock();
        model
            .stack
            .get(model.current_index)
            .map(|location| location.location_id.clone())
    }

    /// 当前栈深
    pub fn depth(&self) -> usize {
        self.model.lock().stack.len()
    }

    fn publish_changed(&self, location_id: String) -> EventResult<()> {
        self.downstream
            .post(Box::new(NavigationChangedEvent { location_id }))
    }
}

impl ManagedComponent for NavigationController {
    fn component_name(&self) -> &str {
        "NavigationController"
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn as_stateful(&self) -> Option<&dyn StatefulComponent> {
        Some(self)
    }
}

impl StatefulComponent for NavigationController {
    fn export_model(&self) -> StateResult<serde_json::Value> {
        Ok(serde_json::to_value(self.model.lock().clone())?)
    }

    fn import_model(&self, model: serde_json::Value) -> StateResult<()> {
        let restored: NavigationModel =
            serde_json::from_value(model).map_err(|e| StateError::ImportFailed {
                message: e.to_string(),
            })?;
        *self.model.lock() = restored;
        Ok(())
    }

    fn reset_model(&self) {
        *self.model.lock() = NavigationModel::default();
    }
}

impl std::fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let model = self.model.lock();
        f.debug_struct("NavigationController")
            .field("depth", &model.stack.len())
            .field("current_index", &model.current_index)
            .finish()
    }
}
