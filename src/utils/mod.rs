// 通用工具

pub mod lrc;
pub mod string;

pub use lrc::{split_stamps, synthetic_stamp, time_to_seconds};
pub use string::{
    has_chinese, is_chinese, last_chars, normalize_parentheses, normalize_title, show_len,
    split_singer, string_similarity, strip_last_chars, SINGER_LYRIC_SPLITTERS,
};
