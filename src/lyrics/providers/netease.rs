use async_trait::async_trait;
use reqwest::header::REFERER;
use serde_json::Value;
use tracing::{debug, error};

use super::{build_client, pointer, value_to_string, LyricsSource};
use crate::config::{NetworkConfig, NeteaseConfig};
use crate::error::{DeckError, Result};
use crate::lyrics::Candidate;

/// 网易云音乐歌词提供者
pub struct NeteaseProvider {
    client: reqwest::Client,
    config: NeteaseConfig,
}

impl NeteaseProvider {
    /// 创建新的网易云音乐歌词提供者
    pub fn new(config: NeteaseConfig, network: &NetworkConfig) -> Self {
        Self {
            client: build_client(network),
            config,
        }
    }

    /// 搜索关键词：歌手加带引号的歌名
    fn keyword(artist: &str, song: &str) -> String {
        format!("{} \"{}\"", artist, song).trim().to_string()
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .header(REFERER, "https://music.163.com/")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            error!("网易云音乐请求失败: HTTP {}", status);
            return Err(DeckError::HttpStatus {
                source_name: "网易云音乐",
                status,
            });
        }

        Ok(resp.json().await?)
    }
}

/// 解析搜索结果
///
/// 没有结果时接口不返回 `songs`，视为空列表。
pub(crate) fn parse_search(json: &Value) -> Result<Vec<Candidate>> {
    let result = pointer(json, "/result")?;
    let Some(songs) = result.get("songs").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    Ok(songs
        .iter()
        .map(|song| Candidate {
            id: value_to_string(&song["id"]),
            name: song["name"].as_str().unwrap_or_default().to_string(),
            artist: song
                .pointer("/artists/0/name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            has_video: song["mvid"].as_u64().is_some_and(|id| id != 0),
            cover: None,
            ..Default::default()
        })
        .collect())
}

#[async_trait]
impl LyricsSource for NeteaseProvider {
    fn name(&self) -> &str {
        "网易云音乐"
    }

    async fn search(&self, artist: &str, song: &str) -> Result<Vec<Candidate>> {
        let keyword = Self::keyword(artist, song);
        debug!("网易云音乐搜索关键词: '{}'", keyword);

        let query = [
            ("csrf_token", String::new()),
            ("s", keyword),
            ("type", "1".to_string()),
            ("offset", "0".to_string()),
            ("limit", self.config.search_limit.to_string()),
        ];
        let json = self.get_json(&self.config.search_url, &query).await?;
        let candidates = parse_search(&json)?;

        debug!("网易云音乐搜索结果数量: {}", candidates.len());
        Ok(candidates)
    }

    async fn lyric(&self, id: &str) -> Result<String> {
        debug!("获取网易云音乐歌词, ID: {}", id);

        let json = self
            .get_json(&self.config.lyric_url, &[("id", id.to_string())])
            .await?;
        let lyric = pointer(&json, "/lyric")?.as_str().unwrap_or_default();

        Ok(lyric.to_string())
    }
}
