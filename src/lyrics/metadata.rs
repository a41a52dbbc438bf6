use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{DeckError, Result};
use crate::lyrics::matcher::{self, LyricPayload, MatchMode, Target};
use crate::lyrics::{Candidate, MetadataSource, SongInfo};
use crate::utils::split_singer;

/// 元数据查找结果
#[derive(Debug, Clone)]
pub struct SongMetadata {
    /// 选中的歌曲
    pub candidate: Candidate,
    /// 从署名行提取的歌名、作词、作曲
    pub info: SongInfo,
}

/// 从署名行中提取歌名、作词、作曲
///
/// `歌名 - 歌手` 形式的行给出歌名；冒号分隔的行中含 `词` 的是作词，含 `曲` 的是作曲。
pub fn extract_song_info(lines: &[String], excluded_roles: &[String]) -> SongInfo {
    let mut info = SongInfo::default();

    for line in lines {
        if let Some((name, _)) = line.split_once(" - ") {
            info.song_name = Some(name.to_string());
            continue;
        }

        let words = split_singer(line);
        if words.len() < 2 {
            continue;
        }

        let role = words[0].split(' ').next().unwrap_or_default().trim();
        if excluded_roles.iter().any(|r| role.contains(r.as_str())) {
            continue;
        }

        let value = words[1].trim().to_string();
        if line.contains('词') {
            info.lyricist = Some(value);
        } else if line.contains('曲') {
            info.composer = Some(value);
        }
    }

    info
}

/// 歌词署名情况
pub fn credit_payload(lines: Option<&[String]>) -> LyricPayload {
    match lines {
        None => LyricPayload::Missing,
        Some(lines) => LyricPayload::Present {
            has_lyricist: lines.iter().any(|l| l.contains('词')),
            has_composer: lines.iter().any(|l| l.contains('曲')),
        },
    }
}

/// 歌曲元数据查找：选出署名完整、最匹配的一首
pub struct MetadataLookup {
    source: Arc<dyn MetadataSource>,
    excluded_roles: Vec<String>,
}

impl MetadataLookup {
    pub fn new(source: Arc<dyn MetadataSource>, excluded_roles: Vec<String>) -> Self {
        Self {
            source,
            excluded_roles,
        }
    }

    /// 查找歌曲元数据
    ///
    /// 指定ID出现在搜索结果中时直接采用；否则在相似度合格的候选里逐个获取署名并评分。
    pub async fn lookup(&self, artist: &str, song: &str, explicit_id: Option<&str>) -> Result<SongMetadata> {
        let target = Target { artist, song };
        let mut candidates = self.source.search(artist, song).await?;
        if candidates.is_empty() {
            return Err(DeckError::NoMatch {
                artist: artist.to_string(),
                song: song.to_string(),
            });
        }

        let mut fetched: HashMap<usize, Option<Vec<String>>> = HashMap::new();
        let explicit = explicit_id.and_then(|id| {
            let found = matcher::find_explicit(&candidates, id);
            if found.is_none() {
                warn!("指定的{}歌曲ID {} 不在搜索结果中，改为自动匹配", self.source.name(), id);
            }
            found
        });

        let chosen = match explicit {
            Some(i) => i,
            None => {
                let pool = self.candidate_pool(&candidates, target);
                for &i in &pool {
                    let lines = self.source.credit_lines(&candidates[i].id).await?;
                    candidates[i].payload = credit_payload(lines.as_deref());
                    fetched.insert(i, lines);
                }
                matcher::pick_best(&candidates, &pool, target).unwrap_or(pool[0])
            }
        };

        let lines = match fetched.remove(&chosen) {
            Some(lines) => lines,
            None => self.source.credit_lines(&candidates[chosen].id).await?,
        };
        let info = lines
            .as_deref()
            .map(|l| extract_song_info(l, &self.excluded_roles))
            .unwrap_or_default();

        let candidate = candidates.swap_remove(chosen);
        info!(
            "{}匹配: {} - {} (ID: {}), 作词: {:?}, 作曲: {:?}",
            self.source.name(),
            candidate.name,
            candidate.artist,
            candidate.id,
            info.lyricist,
            info.composer
        );
        Ok(SongMetadata { candidate, info })
    }

    /// 参与评分的候选：先严格匹配，再只看歌名，都没有时全部参与
    fn candidate_pool(&self, candidates: &[Candidate], target: Target<'_>) -> Vec<usize> {
        for mode in [MatchMode::Strict, MatchMode::SongOnly] {
            let pool = matcher::eligible_indices(candidates, target, mode);
            if !pool.is_empty() {
                return pool;
            }
            debug!("{:?} 模式下没有合格的候选", mode);
        }
        (0..candidates.len()).collect()
    }

    /// 下载专辑封面到指定文件，没有封面时返回 `None`
    pub async fn download_cover(&self, candidate: &Candidate, path: &Path) -> Result<Option<PathBuf>> {
        let Some(bytes) = self.source.cover_image(candidate).await? else {
            return Ok(None);
        };
        tokio::fs::write(path, bytes).await?;
        debug!("专辑封面已保存到 {:?}", path);
        Ok(Some(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::config::DEFAULT_EXCLUDED_ROLES;

    fn roles() -> Vec<String> {
        DEFAULT_EXCLUDED_ROLES.iter().map(|s| s.to_string()).collect()
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_song_info() {
        let credits = lines(&[
            "稻香 - 周杰伦",
            "词：周杰伦",
            "曲：周杰伦 ",
            "编曲：黄雨勋",
            "对这个世界如果你有太多的抱怨",
        ]);
        let info = extract_song_info(&credits, &roles());
        assert_eq!(info.song_name.as_deref(), Some("稻香"));
        assert_eq!(info.lyricist.as_deref(), Some("周杰伦"));
        assert_eq!(info.composer.as_deref(), Some("周杰伦"));
    }

    #[test]
    fn test_credit_payload() {
        assert_eq!(credit_payload(None), LyricPayload::Missing);
        let only_lyricist = lines(&["作词：林夕"]);
        assert_eq!(
            credit_payload(Some(&only_lyricist)),
            LyricPayload::Present {
                has_lyricist: true,
                has_composer: false
            }
        );
    }

    struct FakeKuwo;

    #[async_trait]
    impl MetadataSource for FakeKuwo {
        fn name(&self) -> &str {
            "fake"
        }

        async fn search(&self, _artist: &str, _song: &str) -> Result<Vec<Candidate>> {
            let make = |id: &str, name: &str, video: bool| Candidate {
                id: id.to_string(),
                name: name.to_string(),
                artist: "杨千嬅".to_string(),
                has_video: video,
                ..Default::default()
            };
            Ok(vec![
                make("100", "勇", true),
                make("200", "勇", false),
                make("300", "勇 (Live)", false),
            ])
        }

        async fn credit_lines(&self, id: &str) -> Result<Option<Vec<String>>> {
            Ok(match id {
                // 有MV但没有词曲署名
                "100" => Some(lines(&["勇 - 杨千嬅"])),
                "200" => Some(lines(&["勇 - 杨千嬅", "作词：林夕", "作曲：陈辉阳"])),
                _ => None,
            })
        }

        async fn cover_image(&self, _candidate: &Candidate) -> Result<Option<Vec<u8>>> {
            Ok(Some(vec![0xff, 0xd8, 0xff]))
        }
    }

    #[tokio::test]
    async fn test_lookup_skips_candidates_without_credits() {
        let lookup = MetadataLookup::new(Arc::new(FakeKuwo), roles());
        let meta = lookup.lookup("杨千嬅", "勇", None).await.unwrap();
        assert_eq!(meta.candidate.id, "200");
        assert_eq!(meta.info.lyricist.as_deref(), Some("林夕"));
        assert_eq!(meta.info.composer.as_deref(), Some("陈辉阳"));
    }

    #[tokio::test]
    async fn test_lookup_uses_explicit_id() {
        let lookup = MetadataLookup::new(Arc::new(FakeKuwo), roles());
        let meta = lookup.lookup("杨千嬅", "勇", Some("300")).await.unwrap();
        assert_eq!(meta.candidate.id, "300");
        assert_eq!(meta.info, SongInfo::default());
    }

    #[tokio::test]
    async fn test_download_cover() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.jpg");
        let lookup = MetadataLookup::new(Arc::new(FakeKuwo), roles());

        let saved = lookup
            .download_cover(&Candidate::default(), &path)
            .await
            .unwrap();
        assert_eq!(saved, Some(path.clone()));
        assert_eq!(std::fs::read(path).unwrap(), vec![0xff, 0xd8, 0xff]);
    }
}
