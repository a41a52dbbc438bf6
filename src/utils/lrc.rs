use std::sync::LazyLock;

use regex::Regex;

// 匹配行首的时间标签: [mm:ss.xx] 或 [mm:ss]
static STAMP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(\d{2}:\d{2}(?:\.\d+)?)\]").expect("valid stamp regex"));

/// 把 `mm:ss.xx` 转换为秒
///
/// 小数部分按十进制小数处理，所以同宽度补零的时间串，字典序与时间先后一致。
pub fn time_to_seconds(stamp: &str) -> Option<f64> {
    let (minutes, rest) = stamp.split_once(':')?;
    let (seconds, fraction) = match rest.split_once('.') {
        Some((s, f)) => (s, f),
        None => (rest, ""),
    };

    let minutes = minutes.parse::<u64>().ok()?;
    let seconds = seconds.parse::<u64>().ok()?;
    let fraction = if fraction.is_empty() {
        0.0
    } else {
        format!("0.{}", fraction).parse::<f64>().ok()?
    };

    Some((minutes * 60 + seconds) as f64 + fraction)
}

/// 拆出行首所有时间标签和其后的歌词文本
///
/// 形如 `[01:50.67][00:36.57]谁伴我 冒险跳下爱河` 的行返回两个标签。
/// 行首没有时间标签时返回 `None`。
pub fn split_stamps(line: &str) -> Option<(Vec<String>, &str)> {
    let mut stamps = Vec::new();
    let mut rest = line;

    while let Some(cap) = STAMP_REGEX.captures(rest) {
        stamps.push(cap[1].to_string());
        let end = cap.get(0).map_or(0, |m| m.end());
        rest = &rest[end..];
    }

    if stamps.is_empty() {
        None
    } else {
        Some((stamps, rest))
    }
}

/// 生成无时间标签行使用的补位标签，按行号区分
///
/// 小数部分按总行数补零到同一宽度（至少两位），行号超过 99 时仍保持先后顺序。
pub fn synthetic_stamp(line_index: usize, line_count: usize) -> String {
    let width = line_count.saturating_sub(1).to_string().len().max(2);
    format!("00:00.{:0width$}", line_index)
}
