//! 错误类型定义

use thiserror::Error;

/// 生成歌词幻灯片过程中的错误
#[derive(Debug, Error)]
pub enum DeckError {
    /// HTTP 请求失败
    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    /// 接口返回的 JSON 缺少字段
    #[error("JSON 缺少字段: {0}")]
    JsonNoSuchField(String),

    /// 接口返回非成功状态码
    #[error("{source_name} 请求失败: HTTP {status}")]
    HttpStatus {
        source_name: &'static str,
        status: reqwest::StatusCode,
    },

    /// 搜索结果中没有可用的歌曲
    #[error("未找到匹配的歌曲: {artist} - {song}")]
    NoMatch { artist: String, song: String },

    /// 表格读取失败
    #[error("表格读取失败: {0}")]
    Sheet(String),

    /// 表格缺少列
    #[error("表格 {sheet} 缺少列: {column}")]
    MissingColumn { sheet: String, column: String },

    /// 颜色格式错误
    #[error("无法解析颜色: {0}")]
    Color(String),

    /// 歌词中出现的歌手多于设置的歌手数量
    #[error("{song} 中出现了 {found} 个歌手，但只设置了 {configured} 种颜色")]
    SingerOverflow {
        song: String,
        found: usize,
        configured: usize,
    },

    /// 要修改的歌词与修改后歌词数量不一致
    #[error("{song} 的要修改歌词有 {old} 行，修改后歌词有 {new} 行")]
    SubstitutionMismatch { song: String, old: usize, new: usize },

    /// 模板文件错误
    #[error("模板错误: {0}")]
    Template(String),

    /// 配置文件解析失败
    #[error("配置解析失败: {0}")]
    Toml(#[from] toml::de::Error),

    /// 配置序列化失败
    #[error("配置序列化失败: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON 序列化失败
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 文件读写失败
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl From<calamine::Error> for DeckError {
    fn from(e: calamine::Error) -> Self {
        DeckError::Sheet(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
