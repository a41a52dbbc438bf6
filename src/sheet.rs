//! 读取歌曲清单表格
//!
//! 表格有两张工作表：`全局设置` 第一行数据是整批的设置，`各歌设置` 每行一首歌。
//! 歌词颜色取自单元格的填充色；没有填充色时才读单元格里的 `#RRGGBB` 文本。

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::{debug, info};
use umya_spreadsheet::reader::xlsx;

use crate::config::DeckSettings;
use crate::error::{DeckError, Result};
use crate::lyrics::Substitution;
use crate::slides::{Rgb, SongPalette};

pub const SETTINGS_SHEET: &str = "全局设置";
pub const SONGS_SHEET: &str = "各歌设置";

const YES: &str = "是";

static EMPTY: Data = Data::Empty;

/// 一首歌的设置
#[derive(Debug, Clone, PartialEq)]
pub struct SongRow {
    pub song: String,
    pub artist: String,
    pub singer_count: usize,
    pub palette: SongPalette,
    pub substitutions: Vec<Substitution>,
    /// 指定酷我音乐歌曲ID
    pub kuwo_id: Option<String>,
    /// 指定网易云歌曲ID
    pub netease_id: Option<String>,
}

/// 单元格填充色，键为从 0 开始的 `(行, 列)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellFills(HashMap<(u32, u32), Rgb>);

impl CellFills {
    /// 读取工作表中所有带填充色的单元格
    ///
    /// 只有 `.xlsx` / `.xlsm` 保存了可读的填充色，其他格式返回空表。
    pub fn read(path: &Path, sheet: &str) -> Result<Self> {
        let is_xlsx = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xlsx") || e.eq_ignore_ascii_case("xlsm"));
        if !is_xlsx {
            debug!("{:?} 不是 xlsx，不读取填充色", path);
            return Ok(Self::default());
        }

        let book = xlsx::read(path)
            .map_err(|e| DeckError::Sheet(format!("读取单元格填充色失败: {e}")))?;
        let Some(worksheet) = book.get_sheet_by_name(sheet) else {
            return Ok(Self::default());
        };

        let theme = book.get_theme();
        let fills: Self = worksheet
            .get_cell_collection()
            .into_iter()
            .filter_map(|cell| {
                let argb = cell.get_style().get_background_color()?.get_argb_with_theme(theme);
                let color = argb.parse::<Rgb>().ok()?;
                let coordinate = cell.get_coordinate();
                let row = coordinate.get_row_num().clone();
                let col = coordinate.get_col_num().clone();
                // 坐标从 1 开始
                Some(((row.checked_sub(1)?, col.checked_sub(1)?), color))
            })
            .collect();
        debug!("{} 有 {} 个带填充色的单元格", sheet, fills.0.len());
        Ok(fills)
    }

    pub fn get(&self, row: u32, col: u32) -> Option<Rgb> {
        self.0.get(&(row, col)).copied()
    }
}

impl FromIterator<((u32, u32), Rgb)> for CellFills {
    fn from_iter<I: IntoIterator<Item = ((u32, u32), Rgb)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// 整个表格
#[derive(Debug, Clone)]
pub struct Workbook {
    pub settings: DeckSettings,
    pub rows: Vec<SongRow>,
}

impl Workbook {
    /// 打开 `.xlsx` / `.xls` / `.ods` 文件
    pub fn open(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)?;
        let settings = workbook.worksheet_range(SETTINGS_SHEET)?;
        let songs = workbook.worksheet_range(SONGS_SHEET)?;
        let fills = CellFills::read(path, SONGS_SHEET)?;

        let workbook = Self {
            settings: parse_settings(&settings)?,
            rows: parse_songs(&songs, &fills)?,
        };
        info!("读取表格 {:?}: {} 首歌", path, workbook.rows.len());
        Ok(workbook)
    }
}

/// 以第一行为表头的工作表
struct Table<'a> {
    sheet: &'static str,
    columns: HashMap<String, usize>,
    range: &'a Range<Data>,
    /// 左上角单元格在工作表中的位置
    origin: (u32, u32),
    fills: &'a CellFills,
}

impl<'a> Table<'a> {
    fn new(sheet: &'static str, range: &'a Range<Data>, fills: &'a CellFills) -> Self {
        let columns = range
            .rows()
            .next()
            .map(|header| {
                header
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| (cell_text(cell), i))
                    .filter(|(name, _)| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            sheet,
            columns,
            range,
            origin: range.start().unwrap_or_default(),
            fills,
        }
    }

    /// 表头以下的行及其在工作表中的行号
    fn data_rows(&self) -> impl Iterator<Item = (u32, &'a [Data])> {
        let top = self.origin.0;
        self.range
            .rows()
            .enumerate()
            .skip(1)
            .map(move |(i, row)| (top + i as u32, row))
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.columns
            .get(name)
            .copied()
            .ok_or_else(|| DeckError::MissingColumn {
                sheet: self.sheet.to_string(),
                column: name.to_string(),
            })
    }

    fn cell<'r>(&self, row: &'r [Data], name: &str) -> Result<&'r Data> {
        let column = self.column(name)?;
        Ok(row.get(column).unwrap_or(&EMPTY))
    }

    fn text(&self, row: &[Data], name: &str) -> Result<String> {
        self.cell(row, name).map(cell_text)
    }

    /// 列不存在或单元格为空时返回 `None`
    fn optional_text(&self, row: &[Data], name: &str) -> Option<String> {
        self.cell(row, name)
            .ok()
            .map(cell_text)
            .filter(|s| !s.is_empty())
    }

    fn number(&self, row: &[Data], name: &str) -> Result<f64> {
        let cell = self.cell(row, name)?;
        cell_number(cell).ok_or_else(|| {
            DeckError::Sheet(format!("{} 的 {} 不是数字: {}", self.sheet, name, cell))
        })
    }

    /// 优先取填充色，没有填充色时解析单元格文本
    fn color(&self, index: u32, row: &[Data], name: &str) -> Result<Rgb> {
        let column = self.origin.1 + self.column(name)? as u32;
        match self.fills.get(index, column) {
            Some(color) => Ok(color),
            None => self.text(row, name)?.parse(),
        }
    }
}

/// 单元格文本，整数形式的浮点数去掉小数部分
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 读取 `全局设置`
pub fn parse_settings(range: &Range<Data>) -> Result<DeckSettings> {
    let no_fills = CellFills::default();
    let table = Table::new(SETTINGS_SHEET, range, &no_fills);
    let (_, row) = table
        .data_rows()
        .next()
        .ok_or_else(|| DeckError::Sheet(format!("{SETTINGS_SHEET} 没有数据")))?;
    let flag = |name: &str| table.text(row, name).map(|v| v == YES);

    let settings = DeckSettings {
        cover_only: flag("只生成歌曲封面？")?,
        dynamic_lyrics: flag("生成动态歌词？")?,
        traditional: flag("是否繁体歌词？")?,
        header_height_cm: table.number(row, "页眉高度（厘米）")?,
        max_font_pt: table.number(row, "最大字体（Pt）")?,
        line_spacing_pt: table.number(row, "歌词行间距离（Pt）")?,
    };
    debug!("全局设置: {:?}", settings);
    Ok(settings)
}

/// 读取 `各歌设置`，跳过没有歌名的行
pub fn parse_songs(range: &Range<Data>, fills: &CellFills) -> Result<Vec<SongRow>> {
    let table = Table::new(SONGS_SHEET, range, fills);
    let mut rows = Vec::new();

    for (index, row) in table.data_rows() {
        let song = table.text(row, "歌曲")?;
        if song.is_empty() {
            continue;
        }

        let singer_count = match table.cell(row, "歌手数量")? {
            Data::Empty => 1,
            _ => table.number(row, "歌手数量")?.max(1.0) as usize,
        };

        let singers = (1..=singer_count)
            .map(|i| table.color(index, row, &format!("歌手{i}歌词颜色")))
            .collect::<Result<Vec<_>>>()?;
        let palette = SongPalette {
            cover: table.color(index, row, "封面字体颜色")?,
            chorus: table.color(index, row, "合唱歌词颜色")?,
            singers,
        };

        let substitutions = parse_substitutions(
            &song,
            &table.optional_text(row, "要修改的歌词").unwrap_or_default(),
            &table.optional_text(row, "修改后歌词").unwrap_or_default(),
        )?;

        rows.push(SongRow {
            artist: table.text(row, "歌手")?,
            singer_count,
            palette,
            substitutions,
            kuwo_id: table.optional_text(row, "指定酷我音乐歌曲ID"),
            netease_id: table.optional_text(row, "指定网易云歌曲ID"),
            song,
        });
    }

    Ok(rows)
}

/// 按行配对要修改的歌词和修改后歌词
pub fn parse_substitutions(song: &str, old: &str, new: &str) -> Result<Vec<Substitution>> {
    let old: Vec<&str> = old.lines().collect();
    let new: Vec<&str> = new.lines().collect();
    if old.len() != new.len() {
        return Err(DeckError::SubstitutionMismatch {
            song: song.to_string(),
            old: old.len(),
            new: new.len(),
        });
    }

    Ok(old
        .into_iter()
        .zip(new)
        .map(|(o, n)| Substitution::new(o, n))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn range(rows: Vec<Vec<Data>>) -> Range<Data> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(1);
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width as u32 - 1));
        for (r, row) in rows.into_iter().enumerate() {
            for (c, cell) in row.into_iter().enumerate() {
                range.set_value((r as u32, c as u32), cell);
            }
        }
        range
    }

    fn settings_range() -> Range<Data> {
        range(vec![
            vec![
                s("只生成歌曲封面？"),
                s("生成动态歌词？"),
                s("是否繁体歌词？"),
                s("页眉高度（厘米）"),
                s("最大字体（Pt）"),
                s("歌词行间距离（Pt）"),
            ],
            vec![
                s("否"),
                s("是"),
                s("是"),
                Data::Float(2.5),
                Data::Int(48),
                Data::Float(12.0),
            ],
        ])
    }

    fn songs_header() -> Vec<Data> {
        [
            "歌曲",
            "歌手",
            "歌手数量",
            "封面字体颜色",
            "合唱歌词颜色",
            "歌手1歌词颜色",
            "歌手2歌词颜色",
            "要修改的歌词",
            "修改后歌词",
            "指定酷我音乐歌曲ID",
            "指定网易云歌曲ID",
        ]
        .into_iter()
        .map(s)
        .collect()
    }

    #[test]
    fn test_parse_settings() {
        let settings = parse_settings(&settings_range()).unwrap();
        assert!(!settings.cover_only);
        assert!(settings.dynamic_lyrics);
        assert!(settings.traditional);
        assert_eq!(settings.header_height_cm, 2.5);
        assert_eq!(settings.max_font_pt, 48.0);
        assert_eq!(settings.line_spacing_pt, 12.0);
    }

    #[test]
    fn test_parse_settings_without_data_row() {
        let header_only = range(vec![vec![s("只生成歌曲封面？")]]);
        assert!(matches!(
            parse_settings(&header_only),
            Err(DeckError::Sheet(_))
        ));
    }

    #[test]
    fn test_parse_songs() {
        let songs = range(vec![
            songs_header(),
            vec![
                s("勇"),
                s("杨千嬅"),
                Data::Float(2.0),
                s("#FFFFFF"),
                s("#FFD700"),
                s("#FF0000"),
                s("#0000FF"),
                s("無非想扮誠實\n大家好"),
                s("无非想扮诚实\n大家都好"),
                Data::Float(228908.0),
                Data::Empty,
            ],
            vec![Data::Empty],
            vec![
                s("稻香"),
                s("周杰伦"),
                Data::Empty,
                s("#FFFFFF"),
                s("#FFD700"),
                s("#00FF00"),
            ],
        ]);

        let rows = parse_songs(&songs, &CellFills::default()).unwrap();
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(first.singer_count, 2);
        assert_eq!(
            first.palette.singers,
            vec![Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)]
        );
        assert_eq!(first.palette.chorus, Rgb::new(255, 215, 0));
        assert_eq!(first.substitutions.len(), 2);
        assert_eq!(first.substitutions[1], Substitution::new("大家好", "大家都好"));
        assert_eq!(first.kuwo_id.as_deref(), Some("228908"));
        assert_eq!(first.netease_id, None);

        let second = &rows[1];
        assert_eq!(second.singer_count, 1);
        assert_eq!(second.palette.singers, vec![Rgb::new(0, 255, 0)]);
        assert!(second.substitutions.is_empty());
    }

    #[test]
    fn test_missing_color_column() {
        let mut header = songs_header();
        header.truncate(6);
        let songs = range(vec![
            header,
            vec![
                s("勇"),
                s("杨千嬅"),
                Data::Int(2),
                s("#FFFFFF"),
                s("#FFD700"),
                s("#FF0000"),
            ],
        ]);
        match parse_songs(&songs, &CellFills::default()) {
            Err(DeckError::MissingColumn { column, .. }) => assert_eq!(column, "歌手2歌词颜色"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_fill_color_wins_over_text() {
        let songs = range(vec![
            songs_header(),
            vec![
                s("勇"),
                s("杨千嬅"),
                Data::Int(2),
                Data::Empty,
                Data::Empty,
                s("#FF0000"),
                Data::Empty,
            ],
        ]);
        // 第 1 行：封面、合唱、歌手1、歌手2 四列都有填充色
        let fills: CellFills = [
            ((1, 3), Rgb::new(255, 255, 255)),
            ((1, 4), Rgb::new(255, 215, 0)),
            ((1, 5), Rgb::new(0, 128, 0)),
            ((1, 6), Rgb::new(0, 0, 255)),
        ]
        .into_iter()
        .collect();

        let rows = parse_songs(&songs, &fills).unwrap();
        let palette = &rows[0].palette;
        assert_eq!(palette.cover, Rgb::new(255, 255, 255));
        assert_eq!(palette.chorus, Rgb::new(255, 215, 0));
        assert_eq!(palette.singers, vec![Rgb::new(0, 128, 0), Rgb::new(0, 0, 255)]);

        // 没有填充色也没有文本
        match parse_songs(&songs, &CellFills::default()) {
            Err(DeckError::Color(text)) => assert!(text.is_empty()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_fill_lookup_follows_range_origin() {
        // 表格从 B3 开始
        let mut songs = Range::new((2, 1), (3, 6));
        for (c, name) in ["歌曲", "歌手", "歌手数量", "封面字体颜色", "合唱歌词颜色", "歌手1歌词颜色"]
            .into_iter()
            .enumerate()
        {
            songs.set_value((2, 1 + c as u32), s(name));
        }
        songs.set_value((3, 1), s("稻香"));
        songs.set_value((3, 2), s("周杰伦"));

        let fills: CellFills = [
            ((3, 4), Rgb::new(1, 1, 1)),
            ((3, 5), Rgb::new(2, 2, 2)),
            ((3, 6), Rgb::new(3, 3, 3)),
        ]
        .into_iter()
        .collect();

        let rows = parse_songs(&songs, &fills).unwrap();
        assert_eq!(rows[0].palette.cover, Rgb::new(1, 1, 1));
        assert_eq!(rows[0].palette.chorus, Rgb::new(2, 2, 2));
        assert_eq!(rows[0].palette.singers, vec![Rgb::new(3, 3, 3)]);
    }

    #[test]
    fn test_open_workbook_with_filled_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("歌单.xlsx");

        let mut book = umya_spreadsheet::new_file();
        let settings = book.new_sheet(SETTINGS_SHEET).unwrap();
        for (cell, value) in [
            ("A1", "只生成歌曲封面？"),
            ("B1", "生成动态歌词？"),
            ("C1", "是否繁体歌词？"),
            ("D1", "页眉高度（厘米）"),
            ("E1", "最大字体（Pt）"),
            ("F1", "歌词行间距离（Pt）"),
            ("A2", "否"),
            ("B2", "否"),
            ("C2", "否"),
            ("D2", "2"),
            ("E2", "48"),
            ("F2", "10"),
        ] {
            settings.get_cell_mut(cell).set_value(value);
        }

        let songs = book.new_sheet(SONGS_SHEET).unwrap();
        for (cell, value) in [
            ("A1", "歌曲"),
            ("B1", "歌手"),
            ("C1", "封面字体颜色"),
            ("D1", "合唱歌词颜色"),
            ("E1", "歌手1歌词颜色"),
            ("A2", "小城大事"),
            ("B2", "杨千嬅"),
            // 没有填充色的单元格仍可以写文本
            ("E2", "#00FF00"),
        ] {
            songs.get_cell_mut(cell).set_value(value);
        }
        songs
            .get_cell_mut("C2")
            .get_style_mut()
            .set_background_color("FF112233");
        songs
            .get_cell_mut("D2")
            .get_style_mut()
            .set_background_color("FFFFD700");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let fills = CellFills::read(&path, SONGS_SHEET).unwrap();
        assert_eq!(fills.get(1, 2), Some(Rgb::new(0x11, 0x22, 0x33)));
        assert_eq!(fills.get(1, 4), None);

        let workbook = Workbook::open(&path).unwrap();
        assert_eq!(workbook.settings.max_font_pt, 48.0);
        let row = &workbook.rows[0];
        assert_eq!(row.song, "小城大事");
        assert_eq!(row.palette.cover, Rgb::new(0x11, 0x22, 0x33));
        assert_eq!(row.palette.chorus, Rgb::new(0xFF, 0xD7, 0x00));
        assert_eq!(row.palette.singers, vec![Rgb::new(0, 255, 0)]);
    }

    #[test]
    fn test_fills_skipped_for_other_formats() {
        let fills = CellFills::read(Path::new("不存在.ods"), SONGS_SHEET).unwrap();
        assert_eq!(fills, CellFills::default());
    }

    #[test]
    fn test_substitution_mismatch() {
        assert!(matches!(
            parse_substitutions("勇", "a\nb", "c"),
            Err(DeckError::SubstitutionMismatch { old: 2, new: 1, .. })
        ));
        assert!(parse_substitutions("勇", "", "").unwrap().is_empty());
    }
}
