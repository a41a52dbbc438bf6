/// 表格中的全局设置，整个批次共用且不可变
#[derive(Debug, Clone, PartialEq)]
pub struct DeckSettings {
    /// 只生成歌曲封面
    pub cover_only: bool,
    /// 生成动态歌词（否则生成静态多栏歌词）
    pub dynamic_lyrics: bool,
    /// 歌词转为繁体
    pub traditional: bool,
    /// 页眉高度（厘米）
    pub header_height_cm: f64,
    /// 最大字体（pt）
    pub max_font_pt: f64,
    /// 歌词行间距离（pt）
    pub line_spacing_pt: f64,
}

impl Default for DeckSettings {
    fn default() -> Self {
        Self {
            cover_only: false,
            dynamic_lyrics: true,
            traditional: false,
            header_height_cm: 0.0,
            max_font_pt: 54.0,
            line_spacing_pt: 16.0,
        }
    }
}
