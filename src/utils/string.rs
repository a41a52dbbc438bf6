/// 歌手与歌词之间的分隔符，中文冒号在前
pub const SINGER_LYRIC_SPLITTERS: [char; 2] = ['：', ':'];

/// 比较两个字符串的相似度
///
/// 采用序列匹配比率 `2*M/T`：M 为递归找出的最长公共块的字符总数，T 为两串字符总数。
/// 计算前先把两串按字典序排好，保证 `string_similarity(a, b) == string_similarity(b, a)`。
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let a_chars: Vec<char> = first.chars().collect();
    let b_chars: Vec<char> = second.chars().collect();

    let total = a_chars.len() + b_chars.len();
    if total == 0 {
        return 1.0;
    }

    let matches = matching_characters(&a_chars, &b_chars);
    2.0 * matches as f64 / total as f64
}

/// 统计所有匹配块的字符数
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut queue = vec![(0, a.len(), 0, b.len())];
    let mut matched = 0;

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            queue.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// 在 a[alo..ahi] 与 b[blo..bhi] 中找最长公共块，同长时取 a 中最靠前的
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

    // lengths[j + 1] 为以 a[i-1]、b[j] 结尾的公共块长度
    let mut lengths = vec![0usize; b.len() + 1];
    for i in alo..ahi {
        let mut next = vec![0usize; b.len() + 1];
        for j in blo..bhi {
            if a[i] != b[j] {
                continue;
            }
            let k = if j > blo { lengths[j] + 1 } else { 1 };
            next[j + 1] = k;
            if k > best_size {
                best_i = i + 1 - k;
                best_j = j + 1 - k;
                best_size = k;
            }
        }
        lengths = next;
    }

    (best_i, best_j, best_size)
}

/// 全角括号转半角
pub fn normalize_parentheses(input: &str) -> String {
    input.replace('（', "(").replace('）', ")")
}

/// 歌名比较用：统一括号、去首尾空白、转大写
pub fn normalize_title(input: &str) -> String {
    normalize_parentheses(input.trim()).to_uppercase()
}

/// 判断字符是否为常用汉字
pub fn is_chinese(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// 字符串中是否含有汉字
pub fn has_chinese(input: &str) -> bool {
    input.chars().any(is_chinese)
}

/// 显示宽度：汉字算 2，其余算 1
pub fn show_len(input: &str) -> usize {
    input
        .chars()
        .map(|c| if is_chinese(c) { 2 } else { 1 })
        .sum()
}

/// 按歌手分隔符（中英文冒号）切分
pub fn split_singer(input: &str) -> Vec<&str> {
    input.split(&SINGER_LYRIC_SPLITTERS[..]).collect()
}

/// 取末尾 n 个字符，n 为 0 时返回整串
pub fn last_chars(input: &str, n: usize) -> &str {
    if n == 0 {
        return input;
    }
    let count = input.chars().count();
    if n >= count {
        return input;
    }
    match input.char_indices().nth(count - n) {
        Some((idx, _)) => &input[idx..],
        None => input,
    }
}

/// 去掉末尾 n 个字符
pub fn strip_last_chars(input: &str, n: usize) -> &str {
    let count = input.chars().count();
    if n >= count {
        return "";
    }
    match input.char_indices().nth(count - n) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}
