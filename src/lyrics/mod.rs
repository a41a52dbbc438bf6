pub mod fetcher;
pub mod matcher;
pub mod metadata;
pub mod normalizer;
pub mod providers;

use crate::utils::time_to_seconds;

pub use fetcher::{LyricFetcher, Substitution};
pub use matcher::{Candidate, LyricPayload, MatchMode, Target};
pub use metadata::{MetadataLookup, SongMetadata};
pub use normalizer::{DuetNormalizer, NormalizedLyrics};
pub use providers::{LyricsSource, MetadataSource};

/// 未指定歌手（独唱）的占位标记
pub const DEFAULT_SINGER: &str = "默";
/// 合唱标记
pub const CHORUS_SINGER: &str = "合";
/// 歌手与歌词之间使用的中文冒号
pub const SINGER_COLON: char = '：';
/// 一行有两个歌手时的分隔符
pub const MULTIPLE_SINGER_SPLITTER: &str = "___";

/// 表示单行歌词
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    /// 时间标签原文，如 `01:50.67`
    pub stamp: String,
    /// 开始时间（秒）
    pub timestamp_seconds: f64,
    /// 歌词文本
    pub raw_text: String,
}

impl LyricLine {
    /// 由时间标签和文本构建，时间标签无法解析时返回 `None`
    pub fn new(stamp: &str, raw_text: &str) -> Option<Self> {
        Some(Self {
            stamp: stamp.to_string(),
            timestamp_seconds: time_to_seconds(stamp)?,
            raw_text: raw_text.to_string(),
        })
    }

    /// 排序用的完整行文本 `[stamp]text`
    pub fn sort_key(&self) -> String {
        format!("[{}]{}", self.stamp, self.raw_text)
    }
}

/// 歌手标记
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingerTag {
    /// 未指定歌手
    Default,
    /// 所有歌手合唱
    Chorus,
    /// 具名歌手
    Named(String),
}

impl SingerTag {
    pub fn from_label(label: &str) -> Self {
        match label {
            DEFAULT_SINGER => SingerTag::Default,
            CHORUS_SINGER => SingerTag::Chorus,
            name => SingerTag::Named(name.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SingerTag::Default => DEFAULT_SINGER,
            SingerTag::Chorus => CHORUS_SINGER,
            SingerTag::Named(name) => name,
        }
    }
}

/// 一个歌手唱的一段歌词
#[derive(Debug, Clone, PartialEq)]
pub struct SingerSegment {
    pub singer: SingerTag,
    pub text: String,
}

/// 整理后的一行歌词
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedLyric {
    /// 显示时间（秒）
    pub sec: f64,
    /// 去掉歌手标记后的文本，用于计算长度
    pub trimmed_lyric: String,
    /// 一段或两段歌手歌词
    pub segments: Vec<SingerSegment>,
}

impl FormattedLyric {
    /// 编码为 `歌手：歌词`，两个歌手时用 `___` 连接
    pub fn singer_lyric(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("{}{}{}", s.singer.label(), SINGER_COLON, s.text))
            .collect::<Vec<_>>()
            .join(MULTIPLE_SINGER_SPLITTER)
    }
}

/// 歌曲元数据（从署名行中提取）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongInfo {
    pub song_name: Option<String>,
    pub lyricist: Option<String>,
    pub composer: Option<String>,
}
