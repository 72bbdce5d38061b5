//! 参数编解码
//!
//! 把 `Parameters:` 行中形如 `value(Type)` 的参数记号解码为带类型的值，
//! 并把任意值渲染回可代入 SQL 占位符的字面量文本。
//!
//! 解码永远不会失败：无法按声明类型解析的参数会保留为原始文本。

use chrono::{NaiveDateTime, Timelike};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 参数值
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParamValue {
    /// `null`
    Null,
    /// String / VARCHAR 等文本
    Text(String),
    /// 32 位整数
    Integer(i32),
    /// 64 位整数
    Long(i64),
    /// 浮点数
    Double(f64),
    /// 布尔值
    Boolean(bool),
    /// 无法识别类型或解析失败时保留的原始文本
    RawText(String),
    /// 日期时间（解码不会产生，供调用方渲染使用）
    Timestamp(NaiveDateTime),
    /// 集合（解码不会产生，供调用方渲染使用）
    List(Vec<ParamValue>),
}

/// 解码后的单个参数：值 + 原始记号
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParsedParameter {
    /// 解码得到的值
    pub value: ParamValue,
    /// 原始参数记号（已去除首尾空白），如 `5(Integer)`
    pub raw: String,
}

impl ParsedParameter {
    pub fn new(value: ParamValue, raw: impl Into<String>) -> Self {
        Self {
            value,
            raw: raw.into(),
        }
    }

    /// 渲染为代入 SQL 的字面量
    #[inline]
    pub fn literal(&self) -> String {
        render_literal(&self.value)
    }
}

/// 解析参数文本，返回有序的参数列表
///
/// 按不在括号内的逗号切分（集合类参数自身可能带有 `(...)`），
/// 每一段再拆出 `value(type)` 并按类型解码。
///
/// # 示例
///
/// ```
/// use mybatis_sqllog::param::{decode_parameters, ParamValue};
///
/// let params = decode_parameters("5(Integer), alice(String), null");
/// assert_eq!(params[0].value, ParamValue::Integer(5));
/// assert_eq!(params[1].value, ParamValue::Text("alice".into()));
/// assert_eq!(params[2].value, ParamValue::Null);
/// ```
pub fn decode_parameters(text: &str) -> Vec<ParsedParameter> {
    // 参数值里可能夹带换行、制表符，先统一压成单个空格
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Vec::new();
    }

    split_outside_parens(&normalized)
        .into_iter()
        .map(|part| {
            let part = part.trim();
            ParsedParameter::new(decode_token(part), part)
        })
        .collect()
}

/// 按深度为 0 的逗号切分，不处理引号
fn split_outside_parens(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, b) in text.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// 解码单个参数记号
fn decode_token(part: &str) -> ParamValue {
    let (value, type_name) = match split_value_and_type(part) {
        Some(pair) => pair,
        None => (part, ""),
    };

    if value.eq_ignore_ascii_case("null") {
        return ParamValue::Null;
    }

    decode_value(value, type_name)
}

/// 拆分 `value(type)`：取第一个 `(` 到第一个 `)` 之间作为类型
fn split_value_and_type(part: &str) -> Option<(&str, &str)> {
    let open = part.find('(')?;
    let close = part.find(')')?;
    if open == 0 || close <= open {
        return None;
    }
    Some((part[..open].trim(), part[open + 1..close].trim()))
}

/// 按类型名（大小写不敏感的子串匹配，先匹配者生效）解码
pub fn decode_value(value: &str, type_name: &str) -> ParamValue {
    let type_name = type_name.to_ascii_lowercase();
    let raw = || ParamValue::RawText(value.to_string());

    if type_name.contains("string") || type_name.contains("varchar") {
        ParamValue::Text(value.to_string())
    } else if type_name.contains("integer") || type_name.contains("int") {
        value.parse().map(ParamValue::Integer).unwrap_or_else(|_| raw())
    } else if type_name.contains("long") || type_name.contains("bigint") {
        value.parse().map(ParamValue::Long).unwrap_or_else(|_| raw())
    } else if type_name.contains("double") || type_name.contains("float") {
        value.parse().map(ParamValue::Double).unwrap_or_else(|_| raw())
    } else if type_name.contains("boolean") || type_name.contains("bit") {
        parse_bool(value).map(ParamValue::Boolean).unwrap_or_else(raw)
    } else {
        raw()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") || value == "1" {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") || value == "0" {
        Some(false)
    } else {
        None
    }
}

/// 渲染为代入占位符的字面量
///
/// 除数值与集合外几乎都加单引号；引号内的内容原样嵌入，不做转义。
///
/// # 示例
///
/// ```
/// use mybatis_sqllog::param::{render_literal, ParamValue};
///
/// assert_eq!(render_literal(&ParamValue::Null), "null");
/// assert_eq!(render_literal(&ParamValue::Boolean(true)), "1");
/// assert_eq!(render_literal(&ParamValue::Text("a,b".into())), "'a,b'");
/// ```
pub fn render_literal(value: &ParamValue) -> String {
    match value {
        ParamValue::Null => "null".to_string(),
        ParamValue::Boolean(b) => (if *b { "1" } else { "0" }).to_string(),
        ParamValue::Integer(_) | ParamValue::Long(_) | ParamValue::Double(_) => value.to_string(),
        ParamValue::List(_) => value.to_string(),
        ParamValue::Text(s) | ParamValue::RawText(s) => format!("'{}'", s),
        ParamValue::Timestamp(_) => format!("'{}'", value),
    }
}

/// 日期时间的文本形式：`YYYY-MM-DD HH:MM:SS.f`（毫秒，不补零）
fn format_timestamp(ts: &NaiveDateTime) -> String {
    format!(
        "{}.{}",
        ts.format("%Y-%m-%d %H:%M:%S"),
        ts.nanosecond() / 1_000_000
    )
}

/// 浮点数的文本形式，整数值保留 `.0`
fn format_double(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

/// 值本身的文本形式（集合元素也使用这一形式）
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => f.write_str("null"),
            ParamValue::Text(s) | ParamValue::RawText(s) => f.write_str(s),
            ParamValue::Integer(v) => write!(f, "{}", v),
            ParamValue::Long(v) => write!(f, "{}", v),
            ParamValue::Double(v) => f.write_str(&format_double(*v)),
            ParamValue::Boolean(b) => write!(f, "{}", b),
            ParamValue::Timestamp(ts) => f.write_str(&format_timestamp(ts)),
            ParamValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// 按顺序把 `?` 占位符替换为参数字面量
///
/// 参数用尽后剩余的 `?` 保持原样；代入值中出现的 `?` 不会被再次替换。
pub fn substitute_placeholders(sql: &str, params: &[ParsedParameter]) -> String {
    if params.is_empty() {
        return sql.to_string();
    }

    let mut result = String::with_capacity(sql.len() + params.len() * 8);
    let mut remaining = params.iter();
    let mut last = 0;

    for (pos, _) in sql.match_indices('?') {
        let Some(param) = remaining.next() else {
            break;
        };
        result.push_str(&sql[last..pos]);
        result.push_str(&param.literal());
        last = pos + 1;
    }
    result.push_str(&sql[last..]);
    result
}
