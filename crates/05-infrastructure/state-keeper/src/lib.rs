//! # State Keeper
//!
//! 围绕外部保存/恢复检查点的状态持久化协调器。
//!
//! 协调器通过对象图监视器增量跟踪携带可持久化模型的存活实例，
//! 在检查点到来时经由可替换的编解码器序列化/反序列化全部模型。

pub mod codec;
pub mod coordinator;

pub use codec::{JsonStateCodec, StateBlob, StateCodec};
pub use coordinator::{StateKeeper, StateRestoreReport};
