use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::{build_client, pointer, value_to_string, MetadataSource};
use crate::config::{KuwoConfig, NetworkConfig};
use crate::error::{DeckError, Result};
use crate::lyrics::Candidate;

/// 酷我音乐元数据提供者
pub struct KuwoProvider {
    client: reqwest::Client,
    config: KuwoConfig,
}

impl KuwoProvider {
    /// 创建新的酷我音乐元数据提供者
    pub fn new(config: KuwoConfig, network: &NetworkConfig) -> Self {
        Self {
            client: build_client(network),
            config,
        }
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let resp = self.client.get(url).query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            error!("酷我音乐请求失败: HTTP {}", status);
            return Err(DeckError::HttpStatus {
                source_name: "酷我音乐",
                status,
            });
        }
        Ok(resp)
    }

    /// 专辑封面地址，换成 700*700 的大图
    fn cover_url(&self, short: &str) -> String {
        format!("{}{}", self.config.album_cover_url, short).replace("/120/", "/700/")
    }
}

/// 解析搜索结果
pub(crate) fn parse_search(json: &Value) -> Result<Vec<Candidate>> {
    let list = pointer(json, "/abslist")?
        .as_array()
        .ok_or_else(|| DeckError::JsonNoSuchField("/abslist[]".to_string()))?;

    Ok(list
        .iter()
        .map(|item| Candidate {
            id: value_to_string(&item["DC_TARGETID"]),
            name: item["SONGNAME"].as_str().unwrap_or_default().to_string(),
            artist: item["FARTIST"].as_str().unwrap_or_default().to_string(),
            has_video: value_to_string(&item["MVFLAG"]) == "1",
            cover: item["web_albumpic_short"]
                .as_str()
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            ..Default::default()
        })
        .collect())
}

/// 解析歌词接口，没有 `lrclist` 时返回 `None`
pub(crate) fn parse_lyric_lines(json: &Value) -> Result<Option<Vec<String>>> {
    let data = pointer(json, "/data")?;
    let Some(list) = data.get("lrclist").and_then(Value::as_array) else {
        return Ok(None);
    };

    Ok(Some(
        list.iter()
            .map(|item| item["lineLyric"].as_str().unwrap_or_default().to_string())
            .collect(),
    ))
}

#[async_trait]
impl MetadataSource for KuwoProvider {
    fn name(&self) -> &str {
        "酷我音乐"
    }

    async fn search(&self, artist: &str, song: &str) -> Result<Vec<Candidate>> {
        let keyword = format!("{} {}", song, artist).trim().to_string();
        debug!("酷我音乐搜索关键词: '{}'", keyword);

        let mut query: Vec<(&str, String)> = [
            ("vipver", "1"),
            ("client", "kt"),
            ("ft", "music"),
            ("cluster", "0"),
            ("strategy", "2012"),
            ("encoding", "utf8"),
            ("rformat", "json"),
            ("mobi", "1"),
            ("issubtitle", "1"),
            ("show_copyright_off", "1"),
            ("pn", "0"),
            ("rn", "20"),
        ]
        .iter()
        .map(|(k, v)| (*k, v.to_string()))
        .collect();
        query.push(("all", keyword));

        let json: Value = self.get(&self.config.search_url, &query).await?.json().await?;
        let mut candidates = parse_search(&json)?;
        candidates.truncate(self.config.candidate_limit);

        debug!("酷我音乐搜索结果数量: {}", candidates.len());
        Ok(candidates)
    }

    async fn credit_lines(&self, id: &str) -> Result<Option<Vec<String>>> {
        debug!("获取酷我音乐歌词, ID: {}", id);
        let json: Value = self
            .get(&self.config.lyric_url, &[("musicId", id.to_string())])
            .await?
            .json()
            .await?;
        parse_lyric_lines(&json)
    }

    async fn cover_image(&self, candidate: &Candidate) -> Result<Option<Vec<u8>>> {
        let Some(short) = candidate.cover.as_deref() else {
            warn!("酷我音乐歌曲 {} 没有专辑封面", candidate.id);
            return Ok(None);
        };

        let url = self.cover_url(short);
        debug!("下载专辑封面: {}", url);
        let bytes = self.get(&url, &[]).await?.bytes().await?;
        Ok(Some(bytes.to_vec()))
    }
}
