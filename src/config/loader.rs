use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::Result;

/// 默认排除的署名角色，行首为这些关键字加冒号的歌词会被丢弃
pub const DEFAULT_EXCLUDED_ROLES: &[&str] = &[
    "编曲",
    "制作人",
    "监制",
    "OP",
    "SP",
    "和音",
    "录音",
    "混音",
    "Mastering",
    "编程",
    "键盘",
    "吉他",
    "电吉他",
    "电结他",
    "贝斯",
    "鼓",
    "弦乐编写",
    "铜管乐编写",
    "和声编写",
    "和声",
    "混音师",
    "录音室",
    "混音室",
    "录音工程师",
    "母带后期处理录音师",
    "母带后期处理录音室",
    "基本轨录音工程",
    "演唱",
    "主唱",
];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// 网络请求设置
    pub network: NetworkConfig,

    /// 歌词源特定配置
    pub sources: SourcesConfig,

    /// 歌词处理设置
    pub lyrics: LyricsConfig,

    /// 版面设置
    pub layout: LayoutConfig,

    /// 输出设置
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkConfig {
    /// 请求超时（秒），不设置则一直等待
    pub timeout_secs: Option<u64>,

    /// 请求使用的 User-Agent
    pub user_agent: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SourcesConfig {
    /// 网易云音乐API配置
    pub netease: NeteaseConfig,

    /// 酷我音乐API配置
    pub kuwo: KuwoConfig,
}

/// 网易云音乐配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NeteaseConfig {
    /// 搜索接口
    pub search_url: String,
    /// 歌词接口
    pub lyric_url: String,
    /// 每次搜索返回的条数
    pub search_limit: u32,
}

/// 酷我音乐配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KuwoConfig {
    /// 搜索接口
    pub search_url: String,
    /// 歌词（含词曲署名）接口
    pub lyric_url: String,
    /// 专辑封面地址前缀
    pub album_cover_url: String,
    /// 参与评分的搜索结果条数
    pub candidate_limit: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LyricsConfig {
    /// 排除的署名角色
    pub excluded_roles: Vec<String>,

    /// 歌词替换的相似度阈值
    pub substitution_threshold: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LayoutConfig {
    /// 模板字体不可用时使用的字体
    pub fallback_font: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    /// 专辑封面临时文件，每首歌覆盖一次
    pub cover_image_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            network: NetworkConfig {
                timeout_secs: None,
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string(),
            },
            sources: SourcesConfig {
                netease: NeteaseConfig {
                    search_url: "https://music.163.com/api/search/get/web".to_string(),
                    lyric_url: "http://music.163.com/api/song/media".to_string(),
                    search_limit: 5,
                },
                kuwo: KuwoConfig {
                    search_url: "https://yinyue.kuwo.cn/search/searchMusicBykeyWord".to_string(),
                    lyric_url: "https://yinyue.kuwo.cn/openapi/v1/www/lyric/getlyric".to_string(),
                    album_cover_url: "https://img1.kuwo.cn/star/albumcover/".to_string(),
                    candidate_limit: 5,
                },
            },
            lyrics: LyricsConfig {
                excluded_roles: DEFAULT_EXCLUDED_ROLES.iter().map(|s| s.to_string()).collect(),
                substitution_threshold: 0.8,
            },
            layout: LayoutConfig {
                fallback_font: "宋体".to_string(),
            },
            output: OutputConfig {
                cover_image_path: PathBuf::from("tmp.jpg"),
            },
        }
    }
}

impl Config {
    /// 加载配置，支持从指定路径或默认路径加载
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = path.unwrap_or_else(Self::default_path);

        debug!("尝试从 {:?} 加载配置文件", config_path);

        if !config_path.exists() {
            debug!("配置文件 {:?} 不存在，将创建默认配置", config_path);
            let default_config = Config::default();
            let toml = toml::to_string_pretty(&default_config)?;

            if let Some(parent) = config_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                    debug!("已确保目录 {:?} 存在", parent);
                }
            }

            fs::write(&config_path, toml)?;
            info!("已创建默认配置文件: {:?}", config_path);
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = match toml::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("解析配置文件 {:?} 失败: {}", config_path, e);
                warn!("由于解析错误，将加载默认配置");
                Config::default()
            }
        };

        debug!("已成功加载配置文件");
        Ok(config)
    }

    /// 默认配置文件路径
    pub fn default_path() -> PathBuf {
        let pkg_name = env!("CARGO_PKG_NAME");
        dirs::config_dir()
            .map(|p| p.join(pkg_name).join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(format!("{}-config.toml", pkg_name)))
    }
}
