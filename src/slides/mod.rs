//! 幻灯片生成
//!
//! 演示文稿软件只通过 [`Presentation`] 接口操作：新建幻灯片、添加文本框、图形、图片和动画。

pub mod composer;
pub mod layout;
pub mod plan;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DeckError, Result};

pub use composer::{SlideComposer, SongPalette};
pub use plan::{DeckPlan, PlanHost};

/// 幻灯片序号
pub type SlideId = usize;
/// 形状序号（幻灯片内）
pub type ShapeId = usize;

/// 位置和大小（pt）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// RGB 颜色，文本形式为 `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(DeckError::Color(s.to_string()));
        }
        // 表格导出的 ARGB（如 FF112233）只取后 6 位
        let hex = if hex.len() == 8 { &hex[2..] } else { hex };
        if hex.len() != 6 {
            return Err(DeckError::Color(s.to_string()));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| DeckError::Color(s.to_string()))
        };
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 段落对齐
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// 字体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontStyle {
    pub name: String,
    pub size: f64,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

/// 文本中一段字符的颜色（按字符计，从 0 开始）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRun {
    pub start: usize,
    pub len: usize,
    pub color: Rgb,
}

/// 要添加的文本框
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub rect: Rect,
    pub rotation: f64,
    pub text: String,
    pub font: FontStyle,
    /// 整个文本框的颜色
    pub color: Rgb,
    /// 覆盖在整体颜色之上的分段颜色
    pub runs: Vec<ColorRun>,
    pub alignment: Alignment,
}

/// 动画触发方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    OnPageClick,
    AfterPrevious,
}

/// 动画效果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    /// 保持显示（透明度动画），持续时间即显示时长
    Opacity,
    /// 隐藏
    Visibility,
    /// 沿路径移动
    MoveBy { dx: f64, dy: f64 },
}

/// 添加到幻灯片时间线上的动画
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationEffect {
    pub shape: ShapeId,
    pub kind: EffectKind,
    pub trigger: Trigger,
    /// 持续时间（秒）
    pub duration: f64,
}

/// 模板中的文本形状
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextShape {
    pub rect: Rect,
    #[serde(default)]
    pub rotation: f64,
    pub text: String,
    pub font: FontStyle,
    #[serde(default)]
    pub alignment: Alignment,
}

/// 模板封面页上的形状
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateShape {
    Text(TextShape),
    Rectangle { rect: Rect, fill: Rgb },
    Picture { rect: Rect },
}

/// 模板：封面页形状和歌词文本框样式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDeck {
    pub slide_width: f64,
    pub slide_height: f64,
    /// 渲染端可用的字体
    #[serde(default)]
    pub fonts: Vec<String>,
    pub cover: Vec<TemplateShape>,
    pub lyric: TextShape,
}

/// 演示文稿能力接口
pub trait Presentation {
    /// 模板幻灯片
    fn template(&self) -> &TemplateDeck;

    fn slide_width(&self) -> f64;

    fn slide_height(&self) -> f64;

    fn set_slide_height(&mut self, height: f64);

    /// 本机是否有该字体
    fn has_font(&self, name: &str) -> bool;

    /// 用模板最后使用的版式新建一页
    fn create_slide(&mut self) -> SlideId;

    fn add_text_box(&mut self, slide: SlideId, text_box: TextBox) -> ShapeId;

    fn add_rectangle(&mut self, slide: SlideId, rect: Rect, fill: Rgb) -> ShapeId;

    fn add_picture(&mut self, slide: SlideId, path: &Path, rect: Rect) -> ShapeId;

    fn add_animation(&mut self, slide: SlideId, effect: AnimationEffect);

    /// 删除模板页后保存，`stem` 不含扩展名，返回实际写出的文件
    fn save(&mut self, stem: &Path) -> Result<PathBuf>;
}

/// 打开模板得到演示文稿
pub trait PresentationHost {
    type Deck: Presentation;

    fn open(&self, template: &Path) -> Result<Self::Deck>;
}
