//! 解析结果
//!
//! `ParsedStatement` 是交给外部消费者的最小单元：每一对
//! `Preparing` / `Parameters` 标记行恰好产生一个。

use crate::param::ParsedParameter;
use crate::tools::leading_keyword;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 语句类别，既用于格式化分派，也用于展示标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StatementKind {
    Query,
    Insert,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    /// 按语句开头的关键字分类（大小写不敏感）
    pub fn detect(sql: &str) -> Self {
        let keyword = leading_keyword(sql);
        if keyword.eq_ignore_ascii_case("SELECT") {
            StatementKind::Query
        } else if keyword.eq_ignore_ascii_case("INSERT") {
            StatementKind::Insert
        } else if keyword.eq_ignore_ascii_case("UPDATE") {
            StatementKind::Update
        } else if keyword.eq_ignore_ascii_case("DELETE") {
            StatementKind::Delete
        } else {
            StatementKind::Other
        }
    }

    /// 展示用标签
    pub fn label(&self) -> &'static str {
        match self {
            StatementKind::Query => "🔎 QUERY",
            StatementKind::Insert => "✨ INSERT",
            StatementKind::Update => "✏️ UPDATE",
            StatementKind::Delete => "🗑️ DELETE",
            StatementKind::Other => "📝 SQL",
        }
    }

    /// 展示层使用的 RGB 颜色
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            StatementKind::Query => (34, 139, 34),
            StatementKind::Insert => (218, 165, 32),
            StatementKind::Update => (30, 144, 255),
            StatementKind::Delete => (220, 20, 60),
            StatementKind::Other => (0, 206, 209),
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 一条还原完成的 SQL 语句
///
/// 构造后不可变，不持有对解析器的任何引用。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParsedStatement {
    /// 代入参数之前、多行拼接之后的原始语句
    pub original_statement: String,

    /// 代入参数并格式化后的语句
    pub formatted_statement: String,

    /// 语句类别
    pub kind: StatementKind,

    /// 类别的展示标签
    pub label: String,

    /// 按顺序解码的参数
    pub parameters: Vec<ParsedParameter>,
}

impl ParsedStatement {
    pub fn new(
        original_statement: String,
        formatted_statement: String,
        kind: StatementKind,
        parameters: Vec<ParsedParameter>,
    ) -> Self {
        Self {
            original_statement,
            formatted_statement,
            kind,
            label: kind.label().to_string(),
            parameters,
        }
    }

    /// 参数个数
    #[inline]
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kind() {
        assert_eq!(StatementKind::detect("SELECT 1"), StatementKind::Query);
        assert_eq!(StatementKind::detect("  insert into t values (1)"), StatementKind::Insert);
        assert_eq!(StatementKind::detect("Update t SET a = 1"), StatementKind::Update);
        assert_eq!(StatementKind::detect("DELETE FROM t"), StatementKind::Delete);
        assert_eq!(StatementKind::detect("WITH x AS (SELECT 1) SELECT * FROM x"), StatementKind::Other);
        assert_eq!(StatementKind::detect("SELECTED"), StatementKind::Other);
        assert_eq!(StatementKind::detect(""), StatementKind::Other);
    }

    #[test]
    fn test_label_matches_kind() {
        let stmt = ParsedStatement::new(
            "DELETE FROM t".into(),
            "DELETE FROM t".into(),
            StatementKind::Delete,
            Vec::new(),
        );
        assert_eq!(stmt.label, "🗑️ DELETE");
        assert_eq!(stmt.parameter_count(), 0);
        assert_eq!(StatementKind::Other.to_string(), "📝 SQL");
    }
}
