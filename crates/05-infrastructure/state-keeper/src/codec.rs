//! 状态编解码器
//!
//! 快照的字节格式对运行时核心不透明，由可替换的编解码器决定。
//! 默认实现是通用的结构化文本编码，宿主可以换成自有的二进制编码。

use runtime_common::StateResult;

/// 不透明的状态快照
#[derive(Clone, PartialEq, Eq)]
pub struct StateBlob(Vec<u8>);

impl StateBlob {
    /// 从字节创建快照
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// 快照字节视图
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// 取出快照字节
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// 快照大小
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 快照是否为空
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for StateBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for StateBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateBlob").field("len", &self.0.len()).finish()
    }
}

/// 状态编解码器 trait
#[cfg_attr(test, mockall::automock)]
pub trait StateCodec: Send + Sync {
    /// 编解码器名称
    fn codec_name(&self) -> &str;

    /// 把结构化模型编码为快照
    fn encode(&self, model: &serde_json::Value) -> StateResult<StateBlob>;

    /// 把快照解码为结构化模型
    fn decode(&self, blob: &StateBlob) -> StateResult<serde_json::Value>;
}

/// 默认的结构化文本编解码器
#[derive(Debug, Default)]
pub struct JsonStateCodec;

impl StateCodec for JsonStateCodec {
    fn codec_name(&self) -> &str {
        "json"
    }

    fn encode(&self, model: &serde_json::Value) -> StateResult<StateBlob> {
        Ok(StateBlob::new(serde_json::to_vec(model)?))
    }

    fn decode(&self, blob: &StateBlob) -> StateResult<serde_json::Value> {
        Ok(serde_json::from_slice(blob.as_bytes())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_codec_round_trips_structured_values() {
        let codec = JsonStateCodec;
        let model = serde_json::json!({ "count": 3, "label": "home" });

        let blob = codec.encode(&model).unwrap();
        assert!(!blob.is_empty());

        let decoded = codec.decode(&blob).unwrap();
        assert_eq!(decoded, model);
    }

    #[test]
    fn decode_rejects_malformed_bytes() {
        let codec = JsonStateCodec;
        let blob = StateBlob::new(b"not json at all".to_vec());

        assert!(codec.decode(&blob).is_err());
    }
}
