//! Mvc 运行时的端到端集成测试

use composition::RuntimeBuilder;
use event_router::{routed_event, SubscriberSpec, UiThreadBus};
use graph_abstractions::{CapabilityRegistry, InjectionRoot, Provider};
use navigation_controller::{NavigationChangedEvent, NavigationController, NavigationOutcome};
use parking_lot::Mutex;
use runtime_common::{
    CapabilityKey, ManagedComponent, ProviderScope, StatefulComponent, StateResult,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

/// 测试用注入根
struct TestRoot {
    name: String,
    requires: Vec<CapabilityKey>,
}

impl TestRoot {
    fn new(name: impl Into<String>, requires: Vec<CapabilityKey>) -> Arc<dyn InjectionRoot> {
        Arc::new(Self {
            name: name.into(),
            requires,
        })
    }
}

impl InjectionRoot for TestRoot {
    fn root_name(&self) -> &str {
        &self.name
    }

    fn required_capabilities(&self) -> Vec<CapabilityKey> {
        self.requires.clone()
    }
}

/// 带可持久化模型的测试控制器
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct ProfileModel {
    visits: u32,
    last_screen: Option<String>,
}

#[derive(Debug)]
struct ProfileController {
    label: &'static str,
    model: Mutex<ProfileModel>,
}

impl ProfileController {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            model: Mutex::new(ProfileModel::default()),
        }
    }

    fn record_visit(&self, screen: &str) {
        let mut model = self.model.lock();
        model.visits += 1;
        model.last_screen = Some(screen.to_string());
    }

    fn model(&self) -> ProfileModel {
        self.model.lock().clone()
    }
}

impl ManagedComponent for ProfileController {
    fn component_name(&self) -> &str {
        "ProfileController"
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn as_stateful(&self) -> Option<&dyn StatefulComponent> {
        Some(self)
    }
}

impl StatefulComponent for ProfileController {
    fn export_model(&self) -> StateResult<serde_json::Value> {
        Ok(serde_json::to_value(self.model.lock().clone())?)
    }

    fn import_model(&self, model: serde_json::Value) -> StateResult<()> {
        *self.model.lock() = serde_json::from_value(model)?;
        Ok(())
    }

    fn reset_model(&self) {
        *self.model.lock() = ProfileModel::default();
    }
}

fn profile_provider(label: &'static str) -> Provider {
    Provider::new(move |_| Ok(Arc::new(ProfileController::new(label))))
        .with_scope(ProviderScope::global())
}

/// 冲刷事件：等待下行总线排空之前的事件
struct FlushEvent {
    done: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
}

routed_event!(FlushEvent);

async fn flush(bus: &UiThreadBus) {
    let (tx, rx) = tokio::sync::oneshot::channel();
    bus.post(Box::new(FlushEvent {
        done: Mutex::new(Some(tx)),
    }))
    .unwrap();
    rx.await.unwrap();
}

fn register_flush_listener(bus: &UiThreadBus) {
    bus.register(
        SubscriberSpec::new("flush")
            .on::<FlushEvent, _>(|event| {
                if let Some(done) = event.done.lock().take() {
                    let _ = done.send(());
                }
                Ok(())
            })
            .unwrap(),
    );
}

#[tokio::test]
async fn shared_singleton_ref_counting_scenario() {
    let runtime = RuntimeBuilder::new()
        .register_provider(profile_provider("shared"))
        .build()
        .await
        .unwrap();

    let key = CapabilityKey::of::<ProfileController>();
    let root1 = TestRoot::new("screen-1", vec![key.clone()]);
    let root2 = TestRoot::new("screen-2", vec![key.clone()]);

    // 注入第一个根：创建实例
    let bundle1 = runtime.inject(&root1).await.unwrap();
    assert_eq!(runtime.stats().instances_created, 1);

    // 注入第二个根：共享同一实例
    let bundle2 = runtime.inject(&root2).await.unwrap();
    assert_eq!(runtime.stats().instances_created, 1);

    let first = bundle1.get::<ProfileController>().unwrap();
    let second = bundle2.get::<ProfileController>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // 释放第一个根：实例保留
    runtime.release(&root1).await.unwrap();
    assert_eq!(runtime.stats().instances_disposed, 0);

    // 释放第二个根：实例销毁，销毁恰好通知一次
    runtime.release(&root2).await.unwrap();
    assert_eq!(runtime.stats().instances_disposed, 1);
    assert_eq!(runtime.state_keeper().tracked_count(), 0);

    runtime.shutdown().await;
}

#[tokio::test]
async fn checkpoint_round_trip_restores_model_state() -> anyhow::Result<()> {
    // 第一个"进程"：业务操作后做保存检查点
    let runtime = RuntimeBuilder::new()
        .register_provider(profile_provider("original"))
        .build()
        .await?;

    let key = CapabilityKey::of::<ProfileController>();
    let root = TestRoot::new("screen", vec![key.clone()]);
    let bundle = runtime.inject(&root).await?;

    let controller = bundle.get::<ProfileController>()?;
    controller.record_visit("home");
    controller.record_visit("detail");

    let snapshot = runtime.snapshot_all();
    assert_eq!(snapshot.len(), 1);
    let expected = controller.model();
    runtime.shutdown().await;

    // 第二个"进程"：先重建实例，再在其处理业务前恢复状态
    let runtime = RuntimeBuilder::new()
        .register_provider(profile_provider("recreated"))
        .build()
        .await?;

    let root = TestRoot::new("screen", vec![key.clone()]);
    let bundle = runtime.inject(&root).await?;

    let report = runtime.restore_all(snapshot);
    assert!(report.is_clean());
    assert_eq!(report.restored, vec![key]);

    let recreated = bundle.get::<ProfileController>()?;
    assert_eq!(recreated.model(), expected);
    assert_eq!(recreated.label, "recreated");

    runtime.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn restore_silently_drops_entries_nobody_recreated() -> anyhow::Result<()> {
    let runtime = RuntimeBuilder::new()
        .register_provider(profile_provider("original"))
        .build()
        .await?;

    let key = CapabilityKey::of::<ProfileController>();
    let root = TestRoot::new("screen", vec![key.clone()]);
    let bundle = runtime.inject(&root).await?;
    bundle.get::<ProfileController>()?.record_visit("home");

    let snapshot = runtime.snapshot_all();
    runtime.shutdown().await;

    // 新进程里没有任何根请求重建该组件
    let runtime = RuntimeBuilder::new().build().await?;
    let report = runtime.restore_all(snapshot);

    assert!(report.restored.is_empty());
    assert_eq!(report.dropped, vec![key]);
    assert!(report.degraded.is_empty());

    runtime.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn navigation_controller_rides_on_graph_and_downstream_bus() {
    let runtime = RuntimeBuilder::new().build().await.unwrap();

    // 导航控制器作为受管单例注册并注入
    runtime
        .registry()
        .register(NavigationController::provider(runtime.downstream_bus().clone()));

    let key = CapabilityKey::of::<NavigationController>();
    let root = TestRoot::new("host-shell", vec![key]);
    let bundle = runtime.inject(&root).await.unwrap();
    let navigation = bundle.get::<NavigationController>().unwrap();

    let locations = Arc::new(Mutex::new(Vec::new()));
    let sink = locations.clone();
    runtime.downstream_bus().register(
        SubscriberSpec::new("view")
            .on::<NavigationChangedEvent, _>(move |event| {
                sink.lock().push(event.location_id.clone());
                Ok(())
            })
            .unwrap(),
    );
    register_flush_listener(runtime.downstream_bus());

    navigation.navigate_to("A", None).unwrap();
    navigation.navigate_to("B", None).unwrap();
    assert_eq!(
        navigation.navigate_back().unwrap(),
        NavigationOutcome::Navigated("A".to_string())
    );
    assert_eq!(navigation.current_location(), Some("A".to_string()));

    // 单条目栈上的返回是无操作结果
    assert_eq!(
        navigation.navigate_back().unwrap(),
        NavigationOutcome::AtRoot
    );
    assert_eq!(navigation.current_location(), Some("A".to_string()));

    flush(runtime.downstream_bus()).await;
    assert_eq!(*locations.lock(), vec!["A", "B", "A"]);

    // 导航模型参与检查点
    let snapshot = runtime.snapshot_all();
    assert_eq!(snapshot.len(), 1);

    runtime.release(&root).await.unwrap();
    runtime.shutdown().await;
}

#[tokio::test]
async fn explicit_registration_overrides_convention_default() {
    let runtime = RuntimeBuilder::new().build().await.unwrap();

    // 约定默认注册
    runtime
        .registry()
        .register_by_convention(|_| Ok(Arc::new(ProfileController::new("real"))));

    // 测试环境在首次解析前替换实现
    runtime.registry().register(profile_provider("test-double"));

    let root = TestRoot::new("screen", vec![CapabilityKey::of::<ProfileController>()]);
    let bundle = runtime.inject(&root).await.unwrap();

    let controller = bundle.get::<ProfileController>().unwrap();
    assert_eq!(controller.label, "test-double");

    runtime.release(&root).await.unwrap();
    runtime.shutdown().await;
}

#[tokio::test]
async fn lateral_bus_delivers_on_the_publishing_thread() {
    let runtime = RuntimeBuilder::new().build().await.unwrap();

    struct RefreshRequested {
        reason: &'static str,
    }
    routed_event!(RefreshRequested);

    let observed = Arc::new(Mutex::new(None));
    let sink = observed.clone();
    runtime.controller_bus().register(
        SubscriberSpec::new("peer-controller")
            .on::<RefreshRequested, _>(move |event| {
                *sink.lock() = Some(event.reason);
                Ok(())
            })
            .unwrap(),
    );

    runtime.controller_bus().post(&RefreshRequested { reason: "pull" });

    // 同步投递：post 返回时已送达
    assert_eq!(*observed.lock(), Some("pull"));

    runtime.shutdown().await;
}
