//! 搜索结果匹配
//!
//! 先用相似度筛出候选，再按规则打分选出最佳结果。

use std::cmp::Reverse;

use tracing::debug;

use crate::utils::{normalize_title, string_similarity};

/// 歌名、歌手都要达到的相似度
pub const STRICT_THRESHOLD: f64 = 0.4;
/// 只按歌名重试时的相似度
pub const LOOSE_THRESHOLD: f64 = 0.1;

/// 候选筛选方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// 歌名和歌手都要相似
    Strict,
    /// 只看歌名
    SongOnly,
}

/// 要查找的歌曲
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub artist: &'a str,
    pub song: &'a str,
}

/// 候选歌曲的歌词署名情况
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LyricPayload {
    /// 没有检查过，不影响评分
    #[default]
    Unchecked,
    /// 没有歌词
    Missing,
    /// 有歌词，记录是否有作词、作曲署名
    Present {
        has_lyricist: bool,
        has_composer: bool,
    },
}

/// 搜索结果中的一首歌
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    /// 歌曲在平台上的ID
    pub id: String,
    /// 歌名
    pub name: String,
    /// 歌手
    pub artist: String,
    /// 平台是否有MV
    pub has_video: bool,
    /// 专辑封面标识
    pub cover: Option<String>,
    /// 歌词署名情况
    pub payload: LyricPayload,
}

impl Candidate {
    /// 数字ID，用于同分时取最小；非数字ID排在最后
    pub fn numeric_id(&self) -> u64 {
        self.id.trim().parse().unwrap_or(u64::MAX)
    }
}

/// 候选是否满足相似度要求
pub fn is_eligible(candidate: &Candidate, target: Target<'_>, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Strict => {
            string_similarity(&candidate.name, target.song) >= STRICT_THRESHOLD
                && string_similarity(&candidate.artist, target.artist) >= STRICT_THRESHOLD
        }
        MatchMode::SongOnly => string_similarity(&candidate.name, target.song) >= LOOSE_THRESHOLD,
    }
}

/// 满足相似度要求的候选下标
pub fn eligible_indices(candidates: &[Candidate], target: Target<'_>, mode: MatchMode) -> Vec<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| is_eligible(c, target, mode))
        .map(|(i, _)| i)
        .collect()
}

/// 歌手集合是否一致（忽略大小写和顺序，以 `&` 分隔）
pub fn artists_match(a: &str, b: &str) -> bool {
    let split = |s: &str| {
        let mut names: Vec<String> = s.to_uppercase().split('&').map(|n| n.trim().to_string()).collect();
        names.sort();
        names
    };
    split(a) == split(b)
}

/// 候选得分
///
/// 没有歌词或缺少词曲署名的得 -1；否则歌手一致、歌名一致、有MV各加 1 分。
pub fn score(candidate: &Candidate, target: Target<'_>) -> i32 {
    match candidate.payload {
        LyricPayload::Missing => return -1,
        LyricPayload::Present {
            has_lyricist,
            has_composer,
        } if !(has_lyricist && has_composer) => return -1,
        _ => {}
    }

    let mut points = 0;
    if artists_match(target.artist, &candidate.artist) {
        points += 1;
    }
    if normalize_title(target.song) == normalize_title(&candidate.name) {
        points += 1;
    }
    if candidate.has_video {
        points += 1;
    }
    points
}

/// 所有候选的得分，下标与候选列表一致
pub fn score_all(candidates: &[Candidate], target: Target<'_>) -> Vec<i32> {
    candidates.iter().map(|c| score(c, target)).collect()
}

/// 在给定下标中选出得分最高的候选，同分取ID最小
pub fn pick_best(candidates: &[Candidate], pool: &[usize], target: Target<'_>) -> Option<usize> {
    let scores = score_all(candidates, target);
    for &i in pool {
        let c = &candidates[i];
        debug!(
            "候选 #{}: ID: {}, 歌名: '{}', 歌手: '{}', MV: {}, 评分: {}",
            i + 1,
            c.id,
            c.name,
            c.artist,
            c.has_video,
            scores[i]
        );
    }

    pool.iter()
        .copied()
        .max_by_key(|&i| (scores[i], Reverse(candidates[i].numeric_id())))
}

/// 按筛选方式选出最佳候选
pub fn best_match(candidates: &[Candidate], target: Target<'_>, mode: MatchMode) -> Option<usize> {
    let pool = eligible_indices(candidates, target, mode);
    pick_best(candidates, &pool, target)
}

/// 在候选中查找指定ID
pub fn find_explicit(candidates: &[Candidate], id: &str) -> Option<usize> {
    candidates.iter().position(|c| c.id.trim() == id.trim())
}
