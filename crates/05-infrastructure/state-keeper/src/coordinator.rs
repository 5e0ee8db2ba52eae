//! 状态持久化协调器
//!
//! 通过图监视器增量维护可持久化实例集合，在外部检查点对其
//! 统一做快照或恢复。单个条目的失败彼此隔离，不中断整个检查点。

use crate::codec::{JsonStateCodec, StateBlob, StateCodec};
use dashmap::DashMap;
use graph_abstractions::GraphMonitor;
use parking_lot::RwLock;
use runtime_common::{CapabilityKey, ManagedComponent, StateRestoreDegraded};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 状态恢复结果报告
#[derive(Debug, Default)]
pub struct StateRestoreReport {
    /// 成功恢复的条目
    pub restored: Vec<CapabilityKey>,
    /// 无存活实例而被丢弃的条目
    pub dropped: Vec<CapabilityKey>,
    /// 降级为默认模型的条目
    pub degraded: Vec<StateRestoreDegraded>,
}

impl StateRestoreReport {
    /// 是否全部条目都成功恢复
    pub fn is_clean(&self) -> bool {
        self.degraded.is_empty()
    }
}

/// 状态持久化协调器
///
/// 两个检查点操作都要求图处于静止状态：外部生命周期负责保证
/// 快照/恢复期间没有并发的业务调用落在被跟踪的实例上，
/// 协调器本身不对业务方法加锁。
pub struct StateKeeper {
    /// 被跟踪的可持久化实例
    tracked: DashMap<CapabilityKey, Arc<dyn ManagedComponent>>,
    /// 可替换的编解码器
    codec: RwLock<Arc<dyn StateCodec>>,
}

impl StateKeeper {
    /// 创建使用默认文本编解码器的协调器
    pub fn new() -> Self {
        Self::with_codec(Arc::new(JsonStateCodec))
    }

    /// 创建使用指定编解码器的协调器
    pub fn with_codec(codec: Arc<dyn StateCodec>) -> Self {
        Self {
            tracked: DashMap::new(),
            codec: RwLock::new(codec),
        }
    }

    /// 替换编解码器
    pub fn set_codec(&self, codec: Arc<dyn StateCodec>) {
        info!("替换状态编解码器: {}", codec.codec_name());
        *self.codec.write() = codec;
    }

    /// 当前被跟踪的实例数量
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// 对全部被跟踪实例做快照
    ///
    /// 单个条目的导出或编码失败只丢弃该条目并记录错误日志，
    /// 不会中断外部触发的保存检查点。
    pub fn snapshot_all(&self) -> HashMap<CapabilityKey, StateBlob> {
        let codec = self.codec.read().clone();
        let mut snapshot = HashMap::new();

        for entry in self.tracked.iter() {
            let Some(stateful) = entry.value().as_stateful() else {
                continue;
            };

            match stateful.export_model().and_then(|model| codec.encode(&model)) {
                Ok(blob) => {
                    snapshot.insert(entry.key().clone(), blob);
                }
                Err(e) => {
                    warn!("快照 {} 失败，跳过该条目: {}", entry.key(), e);
                }
            }
        }

        info!("快照完成: {} / {} 个条目", snapshot.len(), self.tracked.len());
        snapshot
    }

    /// 把快照恢复到存活实例上
    ///
    /// 必须在恢复检查点后、实例开始处理业务调用之前调用。
    /// 实例已不存在的条目静默丢弃；解码失败的条目把模型重置为
    /// 默认构造状态并记入报告，恢复过程继续处理其余条目。
    pub fn restore_all(&self, blobs: HashMap<CapabilityKey, StateBlob>) -> StateRestoreReport {
        let codec = self.codec.read().clone();
        let mut report = StateRestoreReport::default();

        for (key, blob) in blobs {
            let Some(entry) = self.tracked.get(&key) else {
                debug!("条目 {} 没有存活实例，丢弃", key);
                report.dropped.push(key);
                continue;
            };

            let Some(stateful) = entry.value().as_stateful() else {
                report.dropped.push(key.clone());
                continue;
            };

            match codec.decode(&blob).and_then(|model| stateful.import_model(model)) {
                Ok(()) => report.restored.push(key.clone()),
                Err(cause) => {
                    warn!("恢复 {} 失败，模型降级为默认状态: {}", key, cause);
                    stateful.reset_model();
                    report.degraded.push(StateRestoreDegraded {
                        key: key.clone(),
                        cause,
                    });
                }
            }
        }

        info!(
            "恢复完成: {} 恢复, {} 丢弃, {} 降级",
            report.restored.len(),
            report.dropped.len(),
            report.degraded.len()
        );
        report
    }
}

impl Default for StateKeeper {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphMonitor for StateKeeper {
    fn on_instance_created(&self, key: &CapabilityKey, instance: &Arc<dyn ManagedComponent>) {
        if instance.as_stateful().is_some() {
            debug!("跟踪可持久化实例: {}", key);
            self.tracked.insert(key.clone(), instance.clone());
        }
    }

    fn on_instance_disposed(&self, key: &CapabilityKey, instance: &Arc<dyn ManagedComponent>) {
        let removed = self
            .tracked
            .remove_if(key, |_, tracked| Arc::ptr_eq(tracked, instance));

        if removed.is_some() {
            debug!("停止跟踪: {}", key);
        }
    }
}

impl std::fmt::Debug for StateKeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateKeeper")
            .field("tracked", &self.tracked.len())
            .field("codec", &self.codec.read().codec_name())
            .finish()
    }
}
