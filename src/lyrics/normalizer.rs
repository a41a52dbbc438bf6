//! 合唱歌词整理
//!
//! 顺序扫描歌词行，识别每行的歌手：
//! - `歌手：歌词` 与 `(歌手)歌词` 两种写法
//! - 歌手名含 `&` 或为 `合唱` 时视为合唱
//! - 一行中有两个歌手时，第一段末尾是第二个歌手的简称
//! - 间隔很短的长句与下一句同时出现、同时消失

use tracing::debug;

use crate::lyrics::{
    FormattedLyric, LyricLine, SingerSegment, SingerTag, CHORUS_SINGER, DEFAULT_SINGER, SINGER_COLON,
};
use crate::utils::{last_chars, split_singer, strip_last_chars};

/// 前一句超过这个字数才考虑与本句同时显示
const CARRY_MIN_CHARS: usize = 6;
/// 与前一句间隔小于这个秒数才考虑同时显示
const CARRY_MAX_GAP_SECS: f64 = 2.0;
/// 表示合唱的歌手名
const CHORUS_WORD: &str = "合唱";

/// 整理结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedLyrics {
    /// 与输入一一对应的歌词
    pub lines: Vec<FormattedLyric>,
    /// 按首次出现顺序排列的具名歌手，不含合唱
    pub singers: Vec<String>,
    /// 字节数最多的一句（去掉歌手标记后）
    pub longest: String,
}

/// 合唱歌词整理状态机
#[derive(Debug)]
pub struct DuetNormalizer {
    current_singer: String,
    carry_over: bool,
    singers: Vec<String>,
    longest: String,
    lines: Vec<FormattedLyric>,
}

impl Default for DuetNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DuetNormalizer {
    pub fn new() -> Self {
        Self {
            current_singer: DEFAULT_SINGER.to_string(),
            carry_over: false,
            singers: Vec::new(),
            longest: String::new(),
            lines: Vec::new(),
        }
    }

    /// 整理全部歌词行
    pub fn normalize(lines: &[LyricLine]) -> NormalizedLyrics {
        let mut normalizer = Self::new();
        for i in 0..lines.len() {
            normalizer.step(lines, i);
        }
        normalizer.finish()
    }

    /// 处理第 `i` 行
    pub fn step(&mut self, lines: &[LyricLine], i: usize) {
        let sec = self.resolve_time(lines, i);
        let (trimmed_lyric, segments) = self.extract_singers(&lines[i].raw_text);

        if trimmed_lyric.len() > self.longest.len() {
            self.longest = trimmed_lyric.clone();
        }

        self.lines.push(FormattedLyric {
            sec,
            trimmed_lyric,
            segments,
        });
    }

    pub fn finish(self) -> NormalizedLyrics {
        NormalizedLyrics {
            lines: self.lines,
            singers: self.singers,
            longest: self.longest,
        }
    }

    /// 决定本行的显示时间
    fn resolve_time(&mut self, lines: &[LyricLine], i: usize) -> f64 {
        let own = lines[i].timestamp_seconds;
        let Some(prev) = self.lines.last() else {
            return own;
        };

        if self.carry_over {
            self.carry_over = false;
            return prev.sec;
        }

        // 前一句较长且与本句间隔很短，说明两句是同时唱的，本句改用下一句的时间
        if own - prev.sec < CARRY_MAX_GAP_SECS
            && prev.trimmed_lyric.chars().count() > CARRY_MIN_CHARS
            && i + 1 < lines.len()
        {
            self.carry_over = true;
            debug!("第 {} 行与前一句同时显示，使用下一句的时间", i + 1);
            return lines[i + 1].timestamp_seconds;
        }

        own
    }

    /// 提取歌手，返回 (去掉歌手的文本, 歌手歌词段)
    fn extract_singers(&mut self, text: &str) -> (String, Vec<SingerSegment>) {
        let colon = SINGER_COLON.to_string();
        let normalized = if text.starts_with('(') {
            // `(歌手)歌词` 转为 `歌手：歌词`
            text.replace('(', "").replace(')', &colon)
        } else {
            // 原来没有冒号时，括号开头处补一个冒号
            let separator = if split_singer(text).len() < 2 { colon.as_str() } else { "" };
            text.replace(')', "")
                .replace('(', separator)
                .replace(&format!("{colon}{colon}"), &colon)
        };

        let mut words: Vec<String> = split_singer(&normalized).into_iter().map(String::from).collect();
        if words.len() < 2 {
            let lyric = words.swap_remove(0);
            return (lyric.clone(), vec![self.segment(&self.current_singer, lyric)]);
        }

        let mut singer = if words[0].contains('&') {
            CHORUS_SINGER.to_string()
        } else {
            words[0].trim().to_string()
        };
        if singer == CHORUS_WORD {
            singer = CHORUS_SINGER.to_string();
        }
        singer = zhconv::zhconv(&singer, zhconv::Variant::ZhCN);

        if self.current_singer == DEFAULT_SINGER {
            self.current_singer = singer.clone();
        }

        // 歌手名长度与当前歌手不同，说明冒号其实是歌词的一部分
        if singer.chars().count() != self.current_singer.chars().count() && singer != CHORUS_SINGER {
            words = format!("{}{}{}", self.current_singer, colon, normalized)
                .split(SINGER_COLON)
                .map(String::from)
                .collect();
            singer = self.current_singer.clone();
        }
        let singer_len = singer.chars().count();

        if singer == CHORUS_SINGER {
            let lyric = words.swap_remove(1);
            return (lyric.clone(), vec![self.segment(CHORUS_SINGER, lyric)]);
        }

        if !self.singers.contains(&singer) {
            self.singers.push(singer.clone());
        }
        self.current_singer = singer;

        if words.len() == 2 {
            let lyric = words.swap_remove(1);
            return (lyric.clone(), vec![self.segment(&self.current_singer, lyric)]);
        }

        // 一行两个歌手：第一段末尾是第二个歌手的简称
        let mut first = words[1].clone();
        let mut second_singer = last_chars(&first, singer_len).to_string();
        if !self.singers.contains(&second_singer) {
            // 简称不是已知歌手时，取当前歌手之外的另一个
            let pos = self
                .singers
                .iter()
                .position(|s| *s == self.current_singer)
                .unwrap_or(0);
            second_singer = self.singers[self.singers.len() - pos - 1].clone();
            first.push_str(&second_singer);
        }

        let first_lyric = strip_last_chars(&first, singer_len).to_string();
        let second_lyric = words[2].clone();
        let trimmed = format!("{} {}", first_lyric, second_lyric);
        let segments = vec![
            self.segment(&self.current_singer, first_lyric),
            self.segment(&second_singer, second_lyric),
        ];
        (trimmed, segments)
    }

    fn segment(&self, singer: &str, text: String) -> SingerSegment {
        SingerSegment {
            singer: SingerTag::from_label(singer),
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lyric_lines(items: &[(&str, &str)]) -> Vec<LyricLine> {
        items
            .iter()
            .map(|(stamp, text)| LyricLine::new(stamp, text).unwrap())
            .collect()
    }

    fn encoded(result: &NormalizedLyrics) -> Vec<String> {
        result.lines.iter().map(FormattedLyric::singer_lyric).collect()
    }

    #[test]
    fn test_solo_then_chorus() {
        let lines = lyric_lines(&[("00:01.00", "张三:你好"), ("00:02.50", "张三&合唱:大家好")]);
        let result = DuetNormalizer::normalize(&lines);

        assert_eq!(encoded(&result), vec!["张三：你好", "合：大家好"]);
        assert_eq!(result.lines[0].segments[0].singer, SingerTag::Named("张三".to_string()));
        assert_eq!(result.lines[1].segments[0].singer, SingerTag::Chorus);
        assert_eq!(result.singers, vec!["张三"]);
        assert_eq!(result.lines[1].sec, 2.5);
    }

    #[test]
    fn test_plain_lyrics_use_default_singer() {
        let lines = lyric_lines(&[("00:01.00", "对这个世界"), ("00:05.00", "跌倒了就不敢")]);
        let result = DuetNormalizer::normalize(&lines);

        assert_eq!(encoded(&result), vec!["默：对这个世界", "默：跌倒了就不敢"]);
        assert!(result.singers.is_empty());
        assert_eq!(result.lines[1].trimmed_lyric, "跌倒了就不敢");
    }

    #[test]
    fn test_chorus_word_and_parenthesized_singer() {
        let lines = lyric_lines(&[
            ("00:01.00", "(甲乙)第一句"),
            ("00:05.00", "(丙丁)第二句"),
            ("00:09.00", "合唱：一起唱"),
        ]);
        let result = DuetNormalizer::normalize(&lines);

        assert_eq!(encoded(&result), vec!["甲乙：第一句", "丙丁：第二句", "合：一起唱"]);
        assert_eq!(result.singers, vec!["甲乙", "丙丁"]);
    }

    #[test]
    fn test_carry_over_borrows_next_timestamp() {
        let lines = lyric_lines(&[
            ("00:10.00", "这是一句很长很长的歌词"),
            ("00:11.00", "第二句"),
            ("00:13.00", "第三句"),
            ("00:20.00", "第四句"),
        ]);
        let result = DuetNormalizer::normalize(&lines);
        let secs: Vec<f64> = result.lines.iter().map(|l| l.sec).collect();

        // 第二句借用第三句的时间，第三句沿用第二句的时间
        assert_eq!(secs, vec![10.0, 13.0, 13.0, 20.0]);
    }

    #[test]
    fn test_no_carry_over_for_short_or_last_lines() {
        let short = lyric_lines(&[("00:10.00", "短句"), ("00:11.00", "第二句"), ("00:13.00", "第三句")]);
        let secs: Vec<f64> = DuetNormalizer::normalize(&short).lines.iter().map(|l| l.sec).collect();
        assert_eq!(secs, vec![10.0, 11.0, 13.0]);

        let last = lyric_lines(&[("00:10.00", "这是一句很长很长的歌词"), ("00:11.00", "最后一句")]);
        let secs: Vec<f64> = DuetNormalizer::normalize(&last).lines.iter().map(|l| l.sec).collect();
        assert_eq!(secs, vec![10.0, 11.0]);
    }

    #[test]
    fn test_two_singers_in_one_line() {
        let lines = lyric_lines(&[
            ("00:01.00", "(P)第一句"),
            ("00:05.00", "(K)第二句"),
            ("00:09.00", "(P)无非想 扮诚实来换舒畅(K)其实是我"),
        ]);
        let result = DuetNormalizer::normalize(&lines);

        assert_eq!(result.lines[2].singer_lyric(), "P：无非想 扮诚实来换舒畅___K：其实是我");
        assert_eq!(result.lines[2].trimmed_lyric, "无非想 扮诚实来换舒畅 其实是我");
        assert_eq!(result.singers, vec!["P", "K"]);
    }

    #[test]
    fn test_unnamed_second_singer_is_the_other_one() {
        let lines = lyric_lines(&[
            ("00:01.00", "(P)第一句"),
            ("00:05.00", "(K)第二句"),
            ("00:09.00", "(P)我先唱()你再唱"),
        ]);
        let result = DuetNormalizer::normalize(&lines);

        assert_eq!(result.lines[2].singer_lyric(), "P：我先唱___K：你再唱");
    }

    #[test]
    fn test_colon_inside_lyric_keeps_current_singer() {
        let lines = lyric_lines(&[("00:01.00", "甲乙：第一句"), ("00:05.00", "他说：我爱你呀")]);
        let result = DuetNormalizer::normalize(&lines);

        // "他说" 长度与 "甲乙" 相同，按歌手处理
        assert_eq!(result.lines[1].singer_lyric(), "他说：我爱你呀");

        let lines = lyric_lines(&[("00:01.00", "甲乙：第一句"), ("00:05.00", "她轻轻说：再见")]);
        let result = DuetNormalizer::normalize(&lines);
        assert_eq!(result.lines[1].segments[0].singer, SingerTag::Named("甲乙".to_string()));
        assert_eq!(result.singers, vec!["甲乙"]);
    }

    #[test]
    fn test_longest_line_by_bytes() {
        let lines = lyric_lines(&[("00:01.00", "abcdefgh"), ("00:09.00", "中文四字")]);
        let result = DuetNormalizer::normalize(&lines);
        assert_eq!(result.longest, "中文四字");
    }

    #[test]
    fn test_roster_is_stable() {
        let lines = lyric_lines(&[
            ("00:01.00", "(B)一"),
            ("00:05.00", "(A)二"),
            ("00:09.00", "(B)三"),
        ]);
        let first = DuetNormalizer::normalize(&lines);
        let second = DuetNormalizer::normalize(&lines);
        assert_eq!(first.singers, vec!["B", "A"]);
        assert_eq!(first, second);
    }
}
