mod kuwo;
mod netease;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::NetworkConfig;
use crate::error::{DeckError, Result};
use crate::lyrics::Candidate;

pub use kuwo::KuwoProvider;
pub use netease::NeteaseProvider;

/// 带时间标签的歌词源
#[async_trait]
pub trait LyricsSource: Send + Sync {
    /// 获取提供者名称
    fn name(&self) -> &str;

    /// 搜索歌曲，歌手为空时只按歌名搜索
    async fn search(&self, artist: &str, song: &str) -> Result<Vec<Candidate>>;

    /// 按歌曲ID获取LRC原文
    async fn lyric(&self, id: &str) -> Result<String>;
}

/// 歌曲元数据源（词曲署名、专辑封面）
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// 获取提供者名称
    fn name(&self) -> &str;

    /// 搜索歌曲
    async fn search(&self, artist: &str, song: &str) -> Result<Vec<Candidate>>;

    /// 按歌曲ID获取歌词行（含署名行），没有歌词时返回 `None`
    async fn credit_lines(&self, id: &str) -> Result<Option<Vec<String>>>;

    /// 下载专辑封面，没有封面时返回 `None`
    async fn cover_image(&self, candidate: &Candidate) -> Result<Option<Vec<u8>>>;
}

/// 按网络配置创建 HTTP 客户端
pub(crate) fn build_client(network: &NetworkConfig) -> reqwest::Client {
    let mut builder = reqwest::Client::builder().user_agent(network.user_agent.clone());
    if let Some(secs) = network.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().unwrap_or_default()
}

/// 按 JSON 指针取字段
pub(crate) fn pointer<'a>(json: &'a Value, path: &str) -> Result<&'a Value> {
    json.pointer(path)
        .ok_or_else(|| DeckError::JsonNoSuchField(path.to_string()))
}

/// 字段为字符串或数字时都转为字符串
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}
