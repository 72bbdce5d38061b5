//! SqlLogParser - 逐行还原 SQL 的状态机
//!
//! 维护一条待定语句：`Preparing` 行开启（或覆盖）待定语句，
//! 延续行追加到待定语句，`Parameters` 行与待定语句配对后产出结果。

use crate::error::ParseError;
use crate::formatter::format_statement;
use crate::param::{decode_parameters, substitute_placeholders};
use crate::parser_config::{DEFAULT_MARKERS, MarkerPatterns, ParserConfig};
use crate::statement::{ParsedStatement, StatementKind};
use crate::tools::is_sql_continuation;
use log::{debug, info, trace, warn};
use std::sync::Arc;

/// 逐行解析 MyBatis 调试日志的状态机
///
/// 每个实例只服务一条日志流，不能被多个线程同时调用；
/// 同一时刻最多只有一条语句处于待定状态。
///
/// # 示例
///
/// ```
/// use mybatis_sqllog::{SqlLogParser, StatementKind};
///
/// let mut parser = SqlLogParser::new();
/// assert!(parser.parse_line("==>  Preparing: SELECT * FROM t WHERE id = ?").is_none());
///
/// let stmt = parser.parse_line("==> Parameters: 5(Integer)").unwrap();
/// assert_eq!(stmt.kind, StatementKind::Query);
/// assert!(stmt.formatted_statement.contains("WHERE id = 5"));
/// ```
#[derive(Debug, Clone)]
pub struct SqlLogParser {
    markers: Arc<MarkerPatterns>,
    pending_statement: Option<String>,
    fragments: Vec<String>,
}

impl Default for SqlLogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlLogParser {
    /// 使用 MyBatis 默认标记创建解析器
    pub fn new() -> Self {
        Self::with_markers(Arc::clone(&*DEFAULT_MARKERS))
    }

    /// 使用自定义配置创建解析器
    ///
    /// # 错误
    ///
    /// 配置中的标记关键字无效时返回 `ParseError::InvalidConfig`
    pub fn with_config(config: &ParserConfig) -> Result<Self, ParseError> {
        Ok(Self::with_markers(Arc::new(config.compile()?)))
    }

    /// 复用已编译的标记（多个解析器可共享同一份）
    pub fn with_markers(markers: Arc<MarkerPatterns>) -> Self {
        Self {
            markers,
            pending_statement: None,
            fragments: Vec::new(),
        }
    }

    /// 是否有语句正在等待参数行
    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending_statement.is_some()
    }

    /// 当前待定语句（多行片段以单个空格拼接）
    pub fn pending_statement(&self) -> Option<&str> {
        self.pending_statement.as_deref()
    }

    /// 当前收集到的片段
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// 丢弃待定语句
    pub fn reset(&mut self) {
        self.pending_statement = None;
        self.fragments.clear();
    }

    /// 解析一行日志（不含换行符）
    ///
    /// 完成一次配对时返回 `Some(ParsedStatement)`，否则返回 `None`。
    /// 任何畸形输入都不会导致错误。
    pub fn parse_line(&mut self, line: &str) -> Option<ParsedStatement> {
        if line.trim().is_empty() {
            return None;
        }

        if let Some(sql) = self.markers.match_statement(line) {
            self.start_statement(sql);
            return None;
        }

        if self.pending_statement.is_some() && !self.markers.mentions_parameters(line) {
            self.collect_continuation(line);
        }

        let parameters_text = self.markers.match_parameters(line)?;
        let Some(original) = self.pending_statement.take() else {
            warn!("忽略没有对应 Preparing 行的参数行: {}", line);
            return None;
        };
        self.fragments.clear();

        let statement = complete_statement(original, parameters_text);
        info!(
            "还原 SQL [{}]: {} 个参数",
            statement.label,
            statement.parameters.len()
        );
        Some(statement)
    }

    fn start_statement(&mut self, sql: &str) {
        if let Some(previous) = self.pending_statement.take() {
            warn!("未等到参数行，丢弃待定语句: {}", previous);
        }
        debug!("Preparing: {}", sql);

        self.fragments.clear();
        self.fragments.push(sql.to_string());
        self.pending_statement = Some(sql.to_string());
    }

    fn collect_continuation(&mut self, line: &str) {
        let trimmed = line.trim();

        // 框架的其他输出（如 `==> Total`），不是 SQL
        if self.markers.starts_with_sentinel(trimmed) {
            debug!("跳过标记行: {}", trimmed);
            return;
        }

        if is_sql_continuation(trimmed) {
            trace!("收集 SQL 延续行: {}", trimmed);
            self.fragments.push(trimmed.to_string());
            self.pending_statement = Some(self.fragments.join(" "));
        } else {
            debug!("跳过非 SQL 行: {}", trimmed);
        }
    }
}

/// 解码参数、代入占位符、分类并格式化
pub(crate) fn complete_statement(original: String, parameters_text: &str) -> ParsedStatement {
    let parameters = decode_parameters(parameters_text);
    let substituted = substitute_placeholders(&original, &parameters);
    let kind = StatementKind::detect(&substituted);
    let formatted = format_statement(&substituted, kind);
    ParsedStatement::new(original, formatted, kind, parameters)
}
