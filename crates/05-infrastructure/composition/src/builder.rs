//! 运行时装配器
//!
//! 协调各基础设施组件的装配顺序：注册表、对象图、状态协调器与三条总线。

use crate::options::RuntimeOptions;
use crate::runtime::MvcRuntime;
use crate::{RuntimeError, RuntimeResult};
use event_router::{SyncEventBus, UiThreadBus};
use graph_abstractions::{
    CapabilityRegistry, DependencyBundle, GraphMonitor, ObjectGraph, Provider,
};
use graph_impl::{CapabilityRegistryImpl, ObjectGraphImpl};
use runtime_common::{ConventionRules, GraphResult, ManagedComponent};
use state_keeper::{StateCodec, StateKeeper};
use std::sync::Arc;
use tracing::info;

/// 延迟到注册表构造后执行的约定注册
type ConventionRegistration = Box<dyn FnOnce(&CapabilityRegistryImpl) + Send>;

/// 运行时装配器
pub struct RuntimeBuilder {
    /// 运行时选项
    options: RuntimeOptions,
    /// 显式指定的编解码器，优先于选项中的名称
    codec: Option<Arc<dyn StateCodec>>,
    /// 预注册的提供者
    providers: Vec<Provider>,
    /// 按约定批量注册的工厂
    convention_registrations: Vec<ConventionRegistration>,
    /// 自定义约定规范
    conventions: Option<ConventionRules>,
}

impl RuntimeBuilder {
    /// 创建使用默认选项的装配器
    pub fn new() -> Self {
        Self {
            options: RuntimeOptions::default(),
            codec: None,
            providers: Vec::new(),
            convention_registrations: Vec::new(),
            conventions: None,
        }
    }

    /// 设置运行时选项
    pub fn with_options(mut self, options: RuntimeOptions) -> Self {
        self.options = options;
        self
    }

    /// 设置状态编解码器
    pub fn with_codec(mut self, codec: Arc<dyn StateCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// 设置约定规范
    pub fn with_conventions(mut self, conventions: ConventionRules) -> Self {
        self.conventions = Some(conventions);
        self
    }

    /// 预注册提供者
    ///
    /// 在首次解析之前生效的配置面，测试环境用它替换真实实现。
    pub fn register_provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    /// 按约定预注册组件工厂
    ///
    /// 默认作用域由约定规范从类型简称推导，注册到约定默认层，
    /// 显式注册的同键提供者仍然优先。
    pub fn register_by_convention<T, F>(mut self, factory: F) -> Self
    where
        T: ManagedComponent,
        F: Fn(&DependencyBundle) -> GraphResult<Arc<T>> + Send + Sync + 'static,
    {
        self.convention_registrations.push(Box::new(move |registry| {
            registry.register_by_convention(factory);
        }));
        self
    }

    /// 装配运行时
    pub async fn build(self) -> RuntimeResult<MvcRuntime> {
        info!("开始装配 Mvc 运行时");

        // 第一步：能力注册表与预注册提供者
        let registry = Arc::new(match self.conventions {
            Some(conventions) => CapabilityRegistryImpl::with_conventions(conventions),
            None => CapabilityRegistryImpl::new(),
        });
        for register in self.convention_registrations {
            register(registry.as_ref());
        }
        for provider in self.providers {
            registry.register(provider);
        }

        // 第二步：对象图
        let graph = Arc::new(ObjectGraphImpl::with_config(
            registry.clone(),
            self.options.graph.to_graph_config(),
        ));

        // 第三步：状态协调器，作为图监视器接入
        let state_keeper = Arc::new(match self.codec {
            Some(codec) => StateKeeper::with_codec(codec),
            None => match self.options.persistence.codec.as_str() {
                "json" => StateKeeper::new(),
                other => {
                    return Err(RuntimeError::UnknownCodec {
                        name: other.to_string(),
                    })
                }
            },
        });
        graph.add_monitor(state_keeper.clone() as Arc<dyn GraphMonitor>);

        // 第四步：三条事件总线
        let downstream_bus = Arc::new(UiThreadBus::spawn(
            self.options.events.downstream_bus_name.clone(),
        ));
        let controller_bus = SyncEventBus::new(self.options.events.controller_bus_name.clone());
        let view_bus = SyncEventBus::new(self.options.events.view_bus_name.clone());

        info!("Mvc 运行时装配完成");
        Ok(MvcRuntime::new(
            registry,
            graph,
            state_keeper,
            controller_bus,
            view_bus,
            downstream_bus,
        ))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
