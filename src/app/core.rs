use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{debug, info};

use crate::config::Config;
use crate::lyrics::providers::{KuwoProvider, NeteaseProvider};
use crate::lyrics::{DuetNormalizer, LyricFetcher, LyricsSource, MetadataLookup, MetadataSource};
use crate::sheet::{SongRow, Workbook};
use crate::slides::{PlanHost, Presentation, PresentationHost, SlideComposer};

/// 一次批量生成任务
#[derive(Debug, Clone)]
pub struct Job {
    /// 输出文件夹名，通常是演出日期
    pub date_label: String,
    pub spreadsheet: PathBuf,
    pub template: PathBuf,
    /// 输出文件夹所在目录
    pub output_root: PathBuf,
}

pub struct App<H: PresentationHost> {
    config: Arc<Config>,
    host: H,
    metadata: MetadataLookup,
    fetcher: LyricFetcher,
}

impl App<PlanHost> {
    /// 创建新应用实例：酷我提供元数据和封面，网易云提供歌词
    pub fn new(config: Arc<Config>) -> Self {
        let kuwo = Arc::new(KuwoProvider::new(
            config.sources.kuwo.clone(),
            &config.network,
        ));
        let netease = Arc::new(NeteaseProvider::new(
            config.sources.netease.clone(),
            &config.network,
        ));
        Self::with_sources(config, PlanHost, kuwo, netease)
    }
}

impl<H: PresentationHost> App<H> {
    pub fn with_sources(
        config: Arc<Config>,
        host: H,
        metadata_source: Arc<dyn MetadataSource>,
        lyrics_source: Arc<dyn LyricsSource>,
    ) -> Self {
        let metadata = MetadataLookup::new(metadata_source, config.lyrics.excluded_roles.clone());
        let fetcher = LyricFetcher::new(lyrics_source, config.lyrics.clone());
        Self {
            config,
            host,
            metadata,
            fetcher,
        }
    }

    /// 读取表格并生成全部幻灯片，返回写出的文件
    pub async fn run(&self, job: &Job) -> Result<Vec<PathBuf>> {
        let workbook = Workbook::open(&job.spreadsheet)
            .with_context(|| format!("无法读取表格 {:?}", job.spreadsheet))?;
        self.run_workbook(job, &workbook).await
    }

    /// 按行顺序生成，任何一首出错都会中止整批
    pub async fn run_workbook(&self, job: &Job, workbook: &Workbook) -> Result<Vec<PathBuf>> {
        let out_dir = job.output_root.join(&job.date_label);
        tokio::fs::create_dir_all(&out_dir)
            .await
            .with_context(|| format!("无法创建输出目录 {:?}", out_dir))?;

        let composer = SlideComposer::new(
            workbook.settings.clone(),
            self.config.layout.fallback_font.clone(),
        );
        let total = workbook.rows.len();
        let mut saved = Vec::new();

        if workbook.settings.dynamic_lyrics {
            // 动态歌词所有歌放在同一个文件
            let stem = out_dir.join(Local::now().format("%Y%m%d-%H%M%S").to_string());
            let mut deck = self.open_template(job)?;
            for (i, row) in workbook.rows.iter().enumerate() {
                info!("[{}/{}] {} - {}", i + 1, total, row.artist, row.song);
                self.generate(&mut deck, &composer, row)
                    .await
                    .with_context(|| format!("生成 {} 失败", row.song))?;
            }
            saved.push(deck.save(&stem)?);
        } else {
            // 静态歌词每首歌一个文件
            for (i, row) in workbook.rows.iter().enumerate() {
                info!("[{}/{}] {} - {}", i + 1, total, row.artist, row.song);
                let mut deck = self.open_template(job)?;
                self.generate(&mut deck, &composer, row)
                    .await
                    .with_context(|| format!("生成 {} 失败", row.song))?;
                saved.push(deck.save(&out_dir.join(&row.song))?);
            }
        }

        Ok(saved)
    }

    fn open_template(&self, job: &Job) -> Result<H::Deck> {
        self.host
            .open(&job.template)
            .with_context(|| format!("无法打开模板 {:?}", job.template))
    }

    /// 生成一首歌：封面页（仅动态歌词）和歌词页
    async fn generate(&self, deck: &mut H::Deck, composer: &SlideComposer, row: &SongRow) -> Result<()> {
        let settings = composer.settings();

        if settings.dynamic_lyrics {
            let meta = self
                .metadata
                .lookup(&row.artist, &row.song, row.kuwo_id.as_deref())
                .await?;
            let cover = self
                .metadata
                .download_cover(&meta.candidate, &self.config.output.cover_image_path)
                .await?;
            composer.compose_cover(deck, &row.artist, &meta.info, &row.palette, cover.as_deref());

            if settings.cover_only {
                debug!("只生成封面，跳过歌词: {}", row.song);
                return Ok(());
            }
        }

        let lines = self
            .fetcher
            .fetch(
                &row.artist,
                &row.song,
                row.netease_id.as_deref(),
                &row.substitutions,
            )
            .await?;
        let lyrics = DuetNormalizer::normalize(&lines);
        debug!("{} 的歌手: {:?}", row.song, lyrics.singers);

        composer.compose_lyrics(deck, &row.song, &lyrics, &row.palette)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;

    use super::*;
    use crate::config::DeckSettings;
    use crate::error::Result as DeckResult;
    use crate::lyrics::Candidate;
    use crate::slides::{Rgb, SongPalette};

    const TEMPLATE: &str = r##"
slide_width = 960.0
slide_height = 540.0

[[cover]]
type = "text"
rect = { left = 0.0, top = 300.0, width = 960.0, height = 60.0 }
text = "<歌名> <作词人>"
font = { name = "宋体", size = 40.0 }

[[cover]]
type = "picture"
rect = { left = 380.0, top = 40.0, width = 200.0, height = 200.0 }

[lyric]
rect = { left = 0.0, top = 0.0, width = 960.0, height = 72.0 }
text = "歌词"
font = { name = "宋体", size = 54.0 }
"##;

    struct FakeKuwo;

    #[async_trait]
    impl MetadataSource for FakeKuwo {
        fn name(&self) -> &str {
            "酷我"
        }

        async fn search(&self, artist: &str, song: &str) -> DeckResult<Vec<Candidate>> {
            Ok(vec![Candidate {
                id: "7".to_string(),
                name: song.to_string(),
                artist: artist.to_string(),
                ..Default::default()
            }])
        }

        async fn credit_lines(&self, _id: &str) -> DeckResult<Option<Vec<String>>> {
            Ok(Some(vec![
                "勇 - 杨千嬅".to_string(),
                "作词：林夕".to_string(),
                "作曲：陈辉阳".to_string(),
            ]))
        }

        async fn cover_image(&self, _candidate: &Candidate) -> DeckResult<Option<Vec<u8>>> {
            Ok(Some(b"jpeg".to_vec()))
        }
    }

    struct FakeNetease;

    #[async_trait]
    impl LyricsSource for FakeNetease {
        fn name(&self) -> &str {
            "网易云"
        }

        async fn search(&self, artist: &str, song: &str) -> DeckResult<Vec<Candidate>> {
            Ok(vec![Candidate {
                id: "9".to_string(),
                name: song.to_string(),
                artist: artist.to_string(),
                ..Default::default()
            }])
        }

        async fn lyric(&self, _id: &str) -> DeckResult<String> {
            Ok("[00:00.00]作词 : 林夕\n[00:01.00]P：你好\n[00:03.00]K：世界\n[00:05.00]合唱：大家好".to_string())
        }
    }

    fn row(song: &str) -> SongRow {
        SongRow {
            song: song.to_string(),
            artist: "杨千嬅".to_string(),
            singer_count: 2,
            palette: SongPalette {
                cover: Rgb::new(255, 255, 255),
                chorus: Rgb::new(255, 215, 0),
                singers: vec![Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)],
            },
            substitutions: Vec::new(),
            kuwo_id: None,
            netease_id: None,
        }
    }

    fn setup(dir: &Path) -> (App<PlanHost>, Job) {
        let template = dir.join("template.toml");
        std::fs::write(&template, TEMPLATE).unwrap();

        let mut config = Config::default();
        config.output.cover_image_path = dir.join("tmp.jpg");
        let app = App::with_sources(
            Arc::new(config),
            PlanHost,
            Arc::new(FakeKuwo),
            Arc::new(FakeNetease),
        );
        let job = Job {
            date_label: "20240101".to_string(),
            spreadsheet: dir.join("songs.xlsx"),
            template,
            output_root: dir.to_path_buf(),
        };
        (app, job)
    }

    fn read_plan(path: &Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_dynamic_mode_writes_single_deck() {
        let dir = tempfile::tempdir().unwrap();
        let (app, job) = setup(dir.path());
        let workbook = Workbook {
            settings: DeckSettings::default(),
            rows: vec![row("勇"), row("小城大事")],
        };

        let saved = app.run_workbook(&job, &workbook).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].starts_with(dir.path().join("20240101")));

        let plan = read_plan(&saved[0]);
        let slides = plan["slides"].as_array().unwrap();
        // 每首歌一页封面一页歌词
        assert_eq!(slides.len(), 4);
        assert_eq!(slides[0]["shapes"][0]["text"], "勇 林夕");
        assert_eq!(slides[0]["shapes"][1]["type"], "picture");
        let lyric_shapes = slides[1]["shapes"].as_array().unwrap();
        assert_eq!(lyric_shapes.len(), 3);
        assert_eq!(lyric_shapes[0]["text"], "你好");
        assert_eq!(std::fs::read(dir.path().join("tmp.jpg")).unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn test_cover_only_mode() {
        let dir = tempfile::tempdir().unwrap();
        let (app, job) = setup(dir.path());
        let workbook = Workbook {
            settings: DeckSettings {
                cover_only: true,
                ..Default::default()
            },
            rows: vec![row("勇")],
        };

        let saved = app.run_workbook(&job, &workbook).await.unwrap();
        let plan = read_plan(&saved[0]);
        assert_eq!(plan["slides"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_static_mode_writes_deck_per_song() {
        let dir = tempfile::tempdir().unwrap();
        let (app, job) = setup(dir.path());
        let workbook = Workbook {
            settings: DeckSettings {
                dynamic_lyrics: false,
                ..Default::default()
            },
            rows: vec![row("勇"), row("小城大事")],
        };

        let saved = app.run_workbook(&job, &workbook).await.unwrap();
        assert_eq!(
            saved,
            vec![
                dir.path().join("20240101").join("勇.json"),
                dir.path().join("20240101").join("小城大事.json"),
            ]
        );

        let plan = read_plan(&saved[0]);
        let slides = plan["slides"].as_array().unwrap();
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0]["shapes"][0]["text"], "勇（歌手及颜色：P K 合唱）");
        assert!(slides[0]["animations"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_singer_overflow_aborts_batch() {
        let dir = tempfile::tempdir().unwrap();
        let (app, job) = setup(dir.path());
        let mut solo = row("勇");
        solo.palette.singers.truncate(1);
        let workbook = Workbook {
            settings: DeckSettings::default(),
            rows: vec![solo],
        };

        let err = app.run_workbook(&job, &workbook).await.unwrap_err();
        assert!(err.to_string().contains("勇"));
    }
}
