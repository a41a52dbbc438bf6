use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use karaoke_deck_rs::app::{App, Job};
use karaoke_deck_rs::config::Config;

#[derive(Debug, Parser)]
#[command(name = "karaoke-deck-rs", version, about = "根据歌曲清单生成卡拉OK歌词幻灯片")]
struct Cli {
    /// 输出文件夹名（通常是日期）
    date: String,

    /// 歌曲清单表格
    spreadsheet: PathBuf,

    /// 幻灯片模板
    template: PathBuf,

    /// 配置文件路径
    #[arg(long)]
    config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

/// `--help` 和 `--version` 照常输出
fn wants_output(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if wants_output(e.kind()) => e.exit(),
        // 参数不对时直接退出，不输出任何内容
        Err(_) => return Ok(()),
    };

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config = Config::load(cli.config.clone()).context("加载配置失败")?;
    let job = Job {
        date_label: cli.date,
        spreadsheet: cli.spreadsheet,
        template: cli.template,
        output_root: std::env::current_dir().context("无法获取当前目录")?,
    };

    let start = Instant::now();
    let app = App::new(Arc::new(config));
    let saved = app.run(&job).await?;
    for path in &saved {
        info!("输出: {:?}", path);
    }
    info!("用时：{:.2}秒", start.elapsed().as_secs_f64());

    Ok(())
}
