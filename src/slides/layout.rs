use crate::config::DeckSettings;
use crate::lyrics::NormalizedLyrics;
use crate::utils::{has_chinese, show_len};

/// 静态歌词顶部留白（pt）
const STATIC_PADDING_TOP: f64 = 4.0;
/// 全英文歌词降档后的字体
const LATIN_REDUCED_FONT: f64 = 24.0;
/// 触发全英文降档的字体
const LATIN_REDUCE_FROM: f64 = 32.0;
/// 有中文时静态页高度的缩小倍数
const CJK_HEIGHT_DIVISOR: f64 = 2.4;

/// 按最长一句的显示宽度选字体
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontStep {
    /// 显示宽度达到此值才使用本档
    pub min_show_len: usize,
    pub font_pt: f64,
    pub line_pt: f64,
}

/// 厘米转 pt
pub fn cm_to_points(cm: f64) -> f64 {
    cm * 72.0 / 2.54
}

/// 字体档位，第一档由最大字体决定
pub fn font_steps(max_font_pt: f64) -> [FontStep; 4] {
    [
        FontStep {
            min_show_len: 0,
            font_pt: max_font_pt,
            line_pt: max_font_pt * 4.0 / 3.0,
        },
        FontStep {
            min_show_len: 22,
            font_pt: 45.0,
            line_pt: 60.0,
        },
        FontStep {
            min_show_len: 30,
            font_pt: 39.0,
            line_pt: 52.0,
        },
        FontStep {
            min_show_len: 38,
            font_pt: 32.0,
            line_pt: 36.0,
        },
    ]
}

/// 取显示宽度不超过的最后一档，返回 (字体, 行高)
pub fn pick_pts(show_len: usize, steps: &[FontStep]) -> (f64, f64) {
    steps
        .iter()
        .take_while(|step| step.min_show_len <= show_len)
        .last()
        .map_or((0.0, 0.0), |step| (step.font_pt, step.line_pt))
}

/// 歌词页的排版参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LyricLayout {
    /// 文本框字体
    pub font_pt: f64,
    /// 文本框高度
    pub line_pt: f64,
    /// 相邻两行的距离
    pub distance: f64,
    /// 静态页每行占用高度
    pub line_height: f64,
    /// 第一行之前的顶部位置
    pub padding_top: f64,
    /// 所有歌词都不含中文
    pub all_latin: bool,
}

impl LyricLayout {
    pub fn compute(lyrics: &NormalizedLyrics, settings: &DeckSettings) -> Self {
        let steps = font_steps(settings.max_font_pt);
        let (font_pt, line_pt) = pick_pts(show_len(&lyrics.longest), &steps);
        let all_latin = lyrics.lines.iter().all(|l| !has_chinese(&l.trimmed_lyric));

        let mut font = font_pt;
        let mut distance = line_pt + settings.line_spacing_pt;
        let line_height = distance + 4.0;

        if !(settings.dynamic_lyrics || all_latin) {
            // 静态中文歌词一行放两句，字体和行距减半
            font = font_pt / 2.0;
            distance = line_pt / 2.0 + settings.line_spacing_pt;
        } else if all_latin && font_pt == LATIN_REDUCE_FROM {
            font = LATIN_REDUCED_FONT;
        }

        let padding_top = if settings.dynamic_lyrics {
            cm_to_points(settings.header_height_cm)
        } else {
            STATIC_PADDING_TOP
        };

        Self {
            font_pt: font,
            line_pt,
            distance,
            line_height,
            padding_top,
            all_latin,
        }
    }

    /// 静态歌词页的高度
    pub fn static_slide_height(&self, line_count: usize) -> f64 {
        let height = self.line_height * line_count as f64;
        if self.all_latin {
            height
        } else {
            height / CJK_HEIGHT_DIVISOR
        }
    }
}
