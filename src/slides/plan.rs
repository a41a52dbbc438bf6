//! 演示文稿计划
//!
//! 从 TOML 模板描述打开演示文稿，记录所有幻灯片操作，保存为 JSON 交给渲染端生成最终文件。

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{DeckError, Result};
use crate::slides::{
    AnimationEffect, Presentation, PresentationHost, Rect, Rgb, ShapeId, SlideId, TemplateDeck,
    TextBox,
};

/// 幻灯片上的一个形状
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlannedShape {
    Text(TextBox),
    Rectangle { rect: Rect, fill: Rgb },
    Picture { path: PathBuf, rect: Rect },
}

/// 一页幻灯片
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlannedSlide {
    pub shapes: Vec<PlannedShape>,
    pub animations: Vec<AnimationEffect>,
}

impl PlannedSlide {
    /// 页面上的所有文本框
    pub fn text_boxes(&self) -> impl Iterator<Item = &TextBox> {
        self.shapes.iter().filter_map(|s| match s {
            PlannedShape::Text(tb) => Some(tb),
            _ => None,
        })
    }
}

/// 记录操作的演示文稿
#[derive(Debug, Clone, Serialize)]
pub struct DeckPlan {
    #[serde(skip)]
    template: TemplateDeck,
    pub template_path: PathBuf,
    pub slide_width: f64,
    pub slide_height: f64,
    pub slides: Vec<PlannedSlide>,
}

impl DeckPlan {
    pub fn new(template: TemplateDeck, template_path: PathBuf) -> Self {
        Self {
            slide_width: template.slide_width,
            slide_height: template.slide_height,
            template,
            template_path,
            slides: Vec::new(),
        }
    }

    fn slide_mut(&mut self, slide: SlideId) -> &mut PlannedSlide {
        &mut self.slides[slide]
    }

    fn push_shape(&mut self, slide: SlideId, shape: PlannedShape) -> ShapeId {
        let shapes = &mut self.slide_mut(slide).shapes;
        shapes.push(shape);
        shapes.len() - 1
    }
}

impl Presentation for DeckPlan {
    fn template(&self) -> &TemplateDeck {
        &self.template
    }

    fn slide_width(&self) -> f64 {
        self.slide_width
    }

    fn slide_height(&self) -> f64 {
        self.slide_height
    }

    fn set_slide_height(&mut self, height: f64) {
        self.slide_height = height;
    }

    fn has_font(&self, name: &str) -> bool {
        self.template.fonts.iter().any(|f| f == name)
    }

    fn create_slide(&mut self) -> SlideId {
        self.slides.push(PlannedSlide::default());
        self.slides.len() - 1
    }

    fn add_text_box(&mut self, slide: SlideId, text_box: TextBox) -> ShapeId {
        self.push_shape(slide, PlannedShape::Text(text_box))
    }

    fn add_rectangle(&mut self, slide: SlideId, rect: Rect, fill: Rgb) -> ShapeId {
        self.push_shape(slide, PlannedShape::Rectangle { rect, fill })
    }

    fn add_picture(&mut self, slide: SlideId, path: &Path, rect: Rect) -> ShapeId {
        self.push_shape(
            slide,
            PlannedShape::Picture {
                path: path.to_path_buf(),
                rect,
            },
        )
    }

    fn add_animation(&mut self, slide: SlideId, effect: AnimationEffect) {
        self.slide_mut(slide).animations.push(effect);
    }

    fn save(&mut self, stem: &Path) -> Result<PathBuf> {
        // 歌名里可能有 `.`，不能用 with_extension
        let mut name = stem.as_os_str().to_owned();
        name.push(".json");
        let path = PathBuf::from(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&*self)?;
        std::fs::write(&path, content)?;
        info!("已保存 {} 页幻灯片到 {:?}", self.slides.len(), path);
        Ok(path)
    }
}

/// 读取 TOML 模板描述
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanHost;

impl PlanHost {
    /// 解析模板描述
    pub fn parse(content: &str) -> Result<TemplateDeck> {
        let template: TemplateDeck = toml::from_str(content)?;
        if template.slide_width <= 0.0 || template.slide_height <= 0.0 {
            return Err(DeckError::Template(format!(
                "幻灯片尺寸无效: {} x {}",
                template.slide_width, template.slide_height
            )));
        }
        Ok(template)
    }
}

impl PresentationHost for PlanHost {
    type Deck = DeckPlan;

    fn open(&self, template: &Path) -> Result<DeckPlan> {
        let content = std::fs::read_to_string(template)?;
        let deck = Self::parse(&content)?;
        debug!("已打开模板 {:?}，封面有 {} 个形状", template, deck.cover.len());
        Ok(DeckPlan::new(deck, template.to_path_buf()))
    }
}
