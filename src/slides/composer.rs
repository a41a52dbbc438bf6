//! 根据整理后的歌词和元数据生成封面页和歌词页

use std::path::Path;

use tracing::{debug, warn};

use crate::config::DeckSettings;
use crate::error::{DeckError, Result};
use crate::lyrics::{FormattedLyric, NormalizedLyrics, SingerTag, SongInfo};
use crate::slides::layout::LyricLayout;
use crate::slides::{
    Alignment, AnimationEffect, ColorRun, EffectKind, FontStyle, Presentation, Rect, Rgb, ShapeId,
    SlideId, TemplateShape, TextBox, TextShape, Trigger,
};
use crate::utils::has_chinese;

/// 歌名图例中表示合唱的文字
const CHORUS_LABEL: &str = "合唱";
/// 最后一句一直显示
const LAST_LINE_HOLD_SECS: f64 = 9999.0;
/// 每次上移的距离比例
const MOVE_STEP_RATIO: f64 = 0.25;

/// 一首歌的配色
#[derive(Debug, Clone, PartialEq)]
pub struct SongPalette {
    /// 封面文字颜色
    pub cover: Rgb,
    /// 合唱歌词颜色
    pub chorus: Rgb,
    /// 按歌手顺序的歌词颜色
    pub singers: Vec<Rgb>,
}

impl SongPalette {
    fn solo(&self, index: usize) -> Rgb {
        self.singers.get(index).copied().unwrap_or(self.chorus)
    }
}

/// 幻灯片生成器
pub struct SlideComposer {
    settings: DeckSettings,
    fallback_font: String,
}

impl SlideComposer {
    pub fn new(settings: DeckSettings, fallback_font: impl Into<String>) -> Self {
        Self {
            settings,
            fallback_font: fallback_font.into(),
        }
    }

    pub fn settings(&self) -> &DeckSettings {
        &self.settings
    }

    fn convert(&self, text: &str) -> String {
        if self.settings.traditional {
            zhconv::zhconv(text, zhconv::Variant::ZhHK)
        } else {
            text.to_string()
        }
    }

    /// 模板字体不可用时换成后备字体
    fn font_for<P: Presentation>(&self, deck: &P, template: &FontStyle, size: f64) -> FontStyle {
        let mut font = template.clone();
        if !deck.has_font(&font.name) {
            debug!("字体 {} 不可用，改用 {}", font.name, self.fallback_font);
            font.name = self.fallback_font.clone();
        }
        font.size = size;
        font
    }

    /// 生成封面页：替换占位符、复制矩形、放入专辑封面
    pub fn compose_cover<P: Presentation>(
        &self,
        deck: &mut P,
        artist: &str,
        info: &SongInfo,
        palette: &SongPalette,
        cover_image: Option<&Path>,
    ) -> SlideId {
        let shapes = deck.template().cover.clone();
        let slide = deck.create_slide();

        for shape in &shapes {
            match shape {
                TemplateShape::Text(text_shape) => {
                    let text = fill_placeholders(&text_shape.text, artist, info);
                    let text_box = TextBox {
                        rect: text_shape.rect,
                        rotation: text_shape.rotation,
                        text: self.convert(text.trim()),
                        font: self.font_for(deck, &text_shape.font, text_shape.font.size),
                        color: palette.cover,
                        runs: Vec::new(),
                        alignment: text_shape.alignment,
                    };
                    deck.add_text_box(slide, text_box);
                }
                TemplateShape::Rectangle { rect, fill } => {
                    deck.add_rectangle(slide, *rect, *fill);
                }
                TemplateShape::Picture { rect } => match cover_image {
                    Some(path) => {
                        deck.add_picture(slide, path, *rect);
                    }
                    None => warn!("没有专辑封面，跳过封面图片"),
                },
            }
        }

        slide
    }

    /// 生成歌词页
    pub fn compose_lyrics<P: Presentation>(
        &self,
        deck: &mut P,
        song: &str,
        lyrics: &NormalizedLyrics,
        palette: &SongPalette,
    ) -> Result<SlideId> {
        if lyrics.singers.len() > palette.singers.len() {
            return Err(DeckError::SingerOverflow {
                song: song.to_string(),
                found: lyrics.singers.len(),
                configured: palette.singers.len(),
            });
        }

        let layout = LyricLayout::compute(lyrics, &self.settings);
        let template = deck.template().lyric.clone();
        let font = self.font_for(deck, &template.font, layout.font_pt);
        debug!(
            "{} 共 {} 句，字体 {}pt，行距 {}pt",
            song,
            lyrics.lines.len(),
            layout.font_pt,
            layout.distance
        );

        let slide = deck.create_slide();
        if self.settings.dynamic_lyrics {
            let shapes = self.place_dynamic(deck, slide, lyrics, palette, &layout, &template, &font);
            add_animations(deck, slide, &shapes, &lyrics.lines, layout.distance);
        } else {
            self.place_static(deck, slide, song, lyrics, palette, &layout, &template, &font);
        }

        Ok(slide)
    }

    /// 动态歌词：整页宽，逐行往下排
    #[allow(clippy::too_many_arguments)]
    fn place_dynamic<P: Presentation>(
        &self,
        deck: &mut P,
        slide: SlideId,
        lyrics: &NormalizedLyrics,
        palette: &SongPalette,
        layout: &LyricLayout,
        template: &TextShape,
        font: &FontStyle,
    ) -> Vec<ShapeId> {
        let width = deck.slide_width();
        let mut top = layout.padding_top;
        let mut shapes = Vec::with_capacity(lyrics.lines.len());

        for lyric in &lyrics.lines {
            top += layout.distance;
            let (text, color, runs) = self.lyric_text(lyric, &lyrics.singers, palette);
            let text_box = TextBox {
                rect: Rect {
                    left: 0.0,
                    top,
                    width,
                    height: layout.line_pt,
                },
                rotation: template.rotation,
                text,
                font: font.clone(),
                color,
                runs,
                alignment: template.alignment,
            };
            shapes.push(deck.add_text_box(slide, text_box));
        }

        shapes
    }

    /// 静态歌词：顶部歌名图例，中文歌词一行两句，英文歌词独占一行
    #[allow(clippy::too_many_arguments)]
    fn place_static<P: Presentation>(
        &self,
        deck: &mut P,
        slide: SlideId,
        song: &str,
        lyrics: &NormalizedLyrics,
        palette: &SongPalette,
        layout: &LyricLayout,
        template: &TextShape,
        font: &FontStyle,
    ) {
        let width = deck.slide_width();
        deck.set_slide_height(layout.static_slide_height(lyrics.lines.len()));

        let mut top = layout.padding_top;
        let (title, runs) = self.legend(song, &lyrics.singers, palette);
        deck.add_text_box(
            slide,
            TextBox {
                rect: Rect {
                    left: 0.0,
                    top,
                    width,
                    height: layout.line_pt,
                },
                rotation: template.rotation,
                text: title,
                font: font.clone(),
                color: palette.solo(0),
                runs,
                alignment: Alignment::Center,
            },
        );

        let mut column = 0usize;
        for lyric in &lyrics.lines {
            let (left, box_width) = if has_chinese(&lyric.trimmed_lyric) {
                let half = width / 2.0;
                let left = if column % 2 == 0 {
                    top += layout.distance;
                    0.0
                } else {
                    half
                };
                column += 1;
                (left, half)
            } else {
                top += layout.distance;
                column = 0;
                (0.0, width)
            };

            let (text, color, runs) = self.lyric_text(lyric, &lyrics.singers, palette);
            deck.add_text_box(
                slide,
                TextBox {
                    rect: Rect {
                        left,
                        top,
                        width: box_width,
                        height: layout.line_pt,
                    },
                    rotation: template.rotation,
                    text,
                    font: font.clone(),
                    color,
                    runs,
                    alignment: Alignment::Left,
                },
            );
        }
    }

    /// 一句歌词的文本和配色
    ///
    /// 未指定歌手时整句用第一个歌手的颜色；具名歌手用各自的颜色；其他都按合唱上色。
    fn lyric_text(
        &self,
        lyric: &FormattedLyric,
        roster: &[String],
        palette: &SongPalette,
    ) -> (String, Rgb, Vec<ColorRun>) {
        let mut texts = Vec::with_capacity(lyric.segments.len());
        let mut runs = Vec::new();
        let mut pos = 0;

        for segment in &lyric.segments {
            let text = self.convert(&segment.text);
            let len = text.chars().count();
            let color = match &segment.singer {
                SingerTag::Default => None,
                SingerTag::Named(name) => Some(
                    roster
                        .iter()
                        .position(|s| s == name)
                        .map_or(palette.chorus, |i| palette.solo(i)),
                ),
                SingerTag::Chorus => Some(palette.chorus),
            };
            if let Some(color) = color {
                runs.push(ColorRun {
                    start: pos,
                    len,
                    color,
                });
            }
            // 各段之间用一个空格连接
            pos += len + 1;
            texts.push(text);
        }

        (texts.join(" "), palette.solo(0), runs)
    }

    /// 歌名图例：`歌名（歌手及颜色：A B 合唱）`，只有一个歌手时只显示歌名
    fn legend(&self, song: &str, roster: &[String], palette: &SongPalette) -> (String, Vec<ColorRun>) {
        let song = song.trim();
        if roster.is_empty() {
            return (self.convert(song), Vec::new());
        }

        let mut text = format!("{song}（歌手及颜色：");
        let mut pos = text.chars().count();
        let mut runs = Vec::with_capacity(roster.len() + 1);
        for (i, singer) in roster.iter().enumerate() {
            let len = singer.chars().count();
            runs.push(ColorRun {
                start: pos,
                len,
                color: palette.solo(i),
            });
            text.push_str(singer);
            text.push(' ');
            pos += len + 1;
        }
        runs.push(ColorRun {
            start: pos,
            len: CHORUS_LABEL.chars().count(),
            color: palette.chorus,
        });
        text.push_str(CHORUS_LABEL);
        text.push('）');

        (self.convert(&text), runs)
    }
}

fn fill_placeholders(text: &str, artist: &str, info: &SongInfo) -> String {
    text.replace("<歌名>", info.song_name.as_deref().unwrap_or_default())
        .replace("<歌手>", artist)
        .replace("<作曲人>", info.composer.as_deref().unwrap_or_default())
        .replace("<作词人>", info.lyricist.as_deref().unwrap_or_default())
}

/// 第 `i` 句：显示到下一句开始后隐藏，随后的歌词整体上移
fn add_animations<P: Presentation>(
    deck: &mut P,
    slide: SlideId,
    shapes: &[ShapeId],
    lyrics: &[FormattedLyric],
    distance: f64,
) {
    for (i, &shape) in shapes.iter().enumerate() {
        let hold = match lyrics.get(i + 1) {
            Some(next) => next.sec - lyrics[i].sec,
            None => LAST_LINE_HOLD_SECS,
        };
        deck.add_animation(
            slide,
            AnimationEffect {
                shape,
                kind: EffectKind::Opacity,
                trigger: Trigger::AfterPrevious,
                duration: hold,
            },
        );
        deck.add_animation(
            slide,
            AnimationEffect {
                shape,
                kind: EffectKind::Visibility,
                trigger: if i == 0 {
                    Trigger::OnPageClick
                } else {
                    Trigger::AfterPrevious
                },
                duration: 0.0,
            },
        );

        let dy = -distance * (i + 1) as f64 * MOVE_STEP_RATIO;
        for &later in &shapes[i + 1..] {
            deck.add_animation(
                slide,
                AnimationEffect {
                    shape: later,
                    kind: EffectKind::MoveBy { dx: 0.0, dy },
                    trigger: Trigger::AfterPrevious,
                    duration: 0.0,
                },
            );
        }
    }
}
