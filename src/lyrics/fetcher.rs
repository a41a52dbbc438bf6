use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::LyricsConfig;
use crate::error::{DeckError, Result};
use crate::lyrics::matcher::{self, MatchMode, Target};
use crate::lyrics::{LyricLine, LyricsSource};
use crate::utils::{split_singer, split_stamps, string_similarity, synthetic_stamp};

/// 歌词中额外排除的署名
const EXTRA_CREDIT_ROLES: [&str; 2] = ["作词", "作曲"];

/// 一组歌词替换：与 `old` 足够相似的行替换为 `new`
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    pub old: String,
    pub new: String,
}

impl Substitution {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

/// 修正歌词源常见的括号和空格问题
pub fn prepare_raw_text(raw: &str) -> String {
    raw.replace("（(", "（")
        .replace('（', "(")
        .replace('）', ")")
        .replace("\\u3000", " ")
}

/// 按行收集带时间标签的歌词，没有时间标签的文本行补上按行号区分的 `00:00.NN`
///
/// 返回 `(时间标签列表, 文本)`，文本已把全角空格转为半角并去掉首尾空白。
pub fn collect_stamped(raw: &str) -> Vec<(Vec<String>, String)> {
    let mut result = Vec::new();
    let line_count = raw.split('\n').count();

    for (i, line) in raw.split('\n').enumerate() {
        if let Some((stamps, text)) = split_stamps(line) {
            let text = text.replace('　', " ").trim().to_string();
            if text.is_empty() {
                continue;
            }
            result.push((stamps, text));
        } else if !line.trim().is_empty() && !line.contains('[') {
            let text = line.replace('　', " ").trim().to_string();
            result.push((vec![synthetic_stamp(i, line_count)], text));
        }
    }

    result
}

/// 判断是否为署名行，如 `编曲：Johnny Yim`
///
/// 冒号前的部分以排除角色开头才算；没有冒号的行不是署名行。
pub fn is_credit_line(text: &str, excluded_roles: &[String]) -> bool {
    let parts = split_singer(text);
    if parts.len() < 2 {
        return false;
    }
    let head = parts[0].trim();
    excluded_roles.iter().any(|role| head.starts_with(role.as_str()))
        || EXTRA_CREDIT_ROLES.iter().any(|role| head.starts_with(role))
}

/// 替换第一条相似度达到阈值的歌词
pub fn apply_substitutions(text: &str, substitutions: &[Substitution], threshold: f64) -> String {
    for sub in substitutions {
        if string_similarity(&sub.old, text) >= threshold {
            debug!("替换歌词: '{}' -> '{}'", text, sub.new);
            return sub.new.clone();
        }
    }
    text.to_string()
}

/// 把歌词源原文整理为按时间标签排序的歌词行
pub fn build_lines(raw: &str, config: &LyricsConfig, substitutions: &[Substitution]) -> Vec<LyricLine> {
    let prepared = prepare_raw_text(raw);
    let mut lines = Vec::new();

    for (stamps, text) in collect_stamped(&prepared) {
        if is_credit_line(&text, &config.excluded_roles) {
            debug!("排除署名行: {}", text);
            continue;
        }

        let text = apply_substitutions(&text, substitutions, config.substitution_threshold);
        for stamp in stamps {
            match LyricLine::new(&stamp, &text) {
                Some(line) => lines.push(line),
                None => warn!("无法解析时间标签: [{}]{}", stamp, text),
            }
        }
    }

    lines.sort_by_cached_key(LyricLine::sort_key);
    lines
}

/// 歌词获取器：搜索歌曲、获取歌词并整理
pub struct LyricFetcher {
    source: Arc<dyn LyricsSource>,
    config: LyricsConfig,
}

impl LyricFetcher {
    pub fn new(source: Arc<dyn LyricsSource>, config: LyricsConfig) -> Self {
        Self { source, config }
    }

    /// 获取整理好的歌词行
    ///
    /// 指定了歌曲ID时直接获取，否则先搜索再匹配。
    pub async fn fetch(
        &self,
        artist: &str,
        song: &str,
        explicit_id: Option<&str>,
        substitutions: &[Substitution],
    ) -> Result<Vec<LyricLine>> {
        let song_id = match explicit_id {
            Some(id) => {
                debug!("使用指定的{}歌曲ID: {}", self.source.name(), id);
                id.to_string()
            }
            None => self.resolve_id(artist, song).await?,
        };

        let raw = self.source.lyric(&song_id).await?;
        let lines = build_lines(&raw, &self.config, substitutions);

        info!(
            "获取{}歌词: {} - {} (ID: {}), 共{}行",
            self.source.name(),
            artist,
            song,
            song_id,
            lines.len()
        );
        Ok(lines)
    }

    /// 先用歌手+歌名搜索，没有匹配时只用歌名再搜一次
    async fn resolve_id(&self, artist: &str, song: &str) -> Result<String> {
        let target = Target { artist, song };

        let candidates = self.source.search(artist, song).await?;
        if let Some(i) = matcher::best_match(&candidates, target, MatchMode::Strict) {
            return Ok(candidates[i].id.clone());
        }

        // 有些歌加上歌手反而搜不到，去掉歌手再找一次
        warn!("{}没有歌名和歌手都匹配的结果，只用歌名重新搜索: {}", self.source.name(), song);
        let candidates = self.source.search("", song).await?;
        matcher::best_match(&candidates, target, MatchMode::SongOnly)
            .map(|i| candidates[i].id.clone())
            .ok_or_else(|| DeckError::NoMatch {
                artist: artist.to_string(),
                song: song.to_string(),
            })
    }
}
