//! 行分类工具
//!
//! 判断一行非标记文本是日志框架噪声，还是多行 SQL 的延续行。
//! 这些规则是有序的启发式匹配（先匹配者生效），不是 SQL 文法。

use once_cell::sync::Lazy;
use regex::Regex;

// 时间戳格式常量（"YYYY-MM-DD HH:MM:SS"，日期与时间之间可以是空白或 'T'）
const TIMESTAMP_LENGTH: usize = 19;
const TIMESTAMP_DATE_TIME_SEPARATOR: usize = 10;
const TIMESTAMP_SEPARATOR_POSITIONS: [(usize, u8); 4] = [(4, b'-'), (7, b'-'), (13, b':'), (16, b':')];
const TIMESTAMP_DIGIT_POSITIONS: [usize; 14] = [0, 1, 2, 3, 5, 6, 8, 9, 11, 12, 14, 15, 17, 18];

/// 可以出现在延续行行首的 SQL 关键字
const CONTINUATION_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "OR", "ORDER", "GROUP", "HAVING", "LIMIT", "OFFSET", "JOIN",
    "LEFT", "RIGHT", "INNER", "OUTER", "FULL", "CROSS", "INSERT", "UPDATE", "DELETE", "SET",
    "VALUES", "INTO", "CREATE", "ALTER", "DROP", "UNION", "DISTINCT", "AS", "ON", "IN", "NOT",
    "IS", "NULL", "LIKE", "BETWEEN", "CASE", "WHEN", "EXISTS",
];

/// 日志级别后紧跟数字（进程号/线程号），如 `INFO 12345 --- [main]`
static SEVERITY_WITH_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:DEBUG|INFO|WARN|ERROR|TRACE)\s+\d+").expect("severity pattern must compile")
});

/// 缩写类路径后跟冒号，如 `c.u.t.m.D.selectPage : `
static SHORT_CLASS_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[a-z]\.[a-z]\.[a-z]\.[A-Za-z]+.*:").expect("class path pattern must compile")
});

/// 期望输入恰好为 19 字节。
#[inline(always)]
pub fn is_timestamp_bytes(bytes: &[u8]) -> bool {
    if bytes.len() != TIMESTAMP_LENGTH {
        return false;
    }

    for &(pos, expected) in &TIMESTAMP_SEPARATOR_POSITIONS {
        if bytes[pos] != expected {
            return false;
        }
    }

    if !matches!(bytes[TIMESTAMP_DATE_TIME_SEPARATOR], b' ' | b'\t' | b'T') {
        return false;
    }

    TIMESTAMP_DIGIT_POSITIONS
        .iter()
        .all(|&i| bytes[i].is_ascii_digit())
}

/// 行内任意位置是否包含 `YYYY-MM-DD[ T]HH:MM:SS` 形式的时间戳
pub fn contains_timestamp(line: &str) -> bool {
    line.as_bytes()
        .windows(TIMESTAMP_LENGTH)
        .any(is_timestamp_bytes)
}

/// 判断一行是否带有日志框架输出的典型特征
///
/// 1. 包含时间戳
/// 2. 日志级别后紧跟数字
/// 3. 缩写类路径后跟冒号
pub fn is_log_noise(line: &str) -> bool {
    contains_timestamp(line) || SEVERITY_WITH_NUMBER.is_match(line) || SHORT_CLASS_PATH.is_match(line)
}

/// 行首是否为 SQL 关键字（大小写不敏感，其后必须是空白或 `(`）
pub fn starts_with_sql_keyword(trimmed: &str) -> bool {
    let bytes = trimmed.as_bytes();
    CONTINUATION_KEYWORDS.iter().any(|keyword| {
        let len = keyword.len();
        bytes.len() > len
            && bytes[..len].eq_ignore_ascii_case(keyword.as_bytes())
            && (bytes[len].is_ascii_whitespace() || bytes[len] == b'(')
    })
}

/// 行首是否为延续用标点 `,` `(` `)`
#[inline]
pub fn starts_with_continuation_punct(trimmed: &str) -> bool {
    matches!(trimmed.as_bytes().first(), Some(b',' | b'(' | b')'))
}

/// 是否像一个裸标识符（可带 `.` 限定），其后是逗号、空白或行尾
pub fn looks_like_identifier(trimmed: &str) -> bool {
    let bytes = trimmed.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => {}
        _ => return false,
    }

    let end = bytes
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_' || *b == b'.'))
        .unwrap_or(bytes.len());

    match bytes.get(end) {
        None => true,
        Some(b) => *b == b',' || b.is_ascii_whitespace(),
    }
}

/// 判断一行（已去除首尾空白）是否为待定语句的延续行
///
/// 噪声特征优先：即使以关键字开头，带有日志特征的行也会被拒绝。
pub fn is_sql_continuation(trimmed: &str) -> bool {
    if trimmed.is_empty() || is_log_noise(trimmed) {
        return false;
    }

    starts_with_sql_keyword(trimmed)
        || starts_with_continuation_punct(trimmed)
        || looks_like_identifier(trimmed)
}

/// 取文本开头的关键字（连续的 ASCII 字母），用于语句分类
pub fn leading_keyword(text: &str) -> &str {
    let text = text.trim_start();
    let end = text
        .bytes()
        .position(|b| !b.is_ascii_alphabetic())
        .unwrap_or(text.len());
    &text[..end]
}
