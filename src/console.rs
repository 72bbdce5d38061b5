//! SQL 控制台
//!
//! 还原结果的展示端：带开关的收集器，把语句转发给注册的监听者，
//! 并提供统一的文本块渲染。

use crate::parser::StatementSink;
use crate::statement::ParsedStatement;
use chrono::{Local, NaiveDateTime};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// 边框宽度（字符数）
const BLOCK_WIDTH: usize = 59;

/// 控制台监听者
pub trait ConsoleListener: Send + Sync {
    /// 收到一条语句
    fn on_statement(&self, statement: &ParsedStatement);

    /// 控制台被清空
    fn on_clear(&self) {}
}

/// 控制台收集器
///
/// 监听开关关闭时，新到达的语句直接丢弃，不会缓存。
///
/// # 示例
///
/// ```
/// use mybatis_sqllog::{SqlConsole, SqlLogParser};
///
/// let console = SqlConsole::new();
/// let mut parser = SqlLogParser::new();
/// parser.parse_line("==> Preparing: SELECT 1");
/// let stmt = parser.parse_line("==> Parameters: ").unwrap();
///
/// assert!(console.add_statement(stmt.clone()));
/// console.set_listening(false);
/// assert!(!console.add_statement(stmt));
/// assert_eq!(console.statements().len(), 1);
/// ```
pub struct SqlConsole {
    listening: AtomicBool,
    listeners: RwLock<Vec<Arc<dyn ConsoleListener>>>,
    statements: RwLock<Vec<ParsedStatement>>,
}

impl Default for SqlConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlConsole {
    pub fn new() -> Self {
        Self {
            listening: AtomicBool::new(true),
            listeners: RwLock::new(Vec::new()),
            statements: RwLock::new(Vec::new()),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn ConsoleListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// 按指针相等移除监听者，返回是否找到
    pub fn remove_listener(&self, listener: &Arc<dyn ConsoleListener>) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    fn listeners_snapshot(&self) -> Vec<Arc<dyn ConsoleListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 收到一条语句；未监听时丢弃并返回 `false`
    pub fn add_statement(&self, statement: ParsedStatement) -> bool {
        if !self.is_listening() {
            debug!("控制台未监听，丢弃: {}", statement.original_statement);
            return false;
        }

        for listener in self.listeners_snapshot() {
            listener.on_statement(&statement);
        }
        self.statements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(statement);
        true
    }

    #[inline]
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Acquire)
    }

    pub fn set_listening(&self, listening: bool) {
        self.listening.store(listening, Ordering::Release);
    }

    /// 切换监听状态，返回切换后的状态
    pub fn toggle_listening(&self) -> bool {
        !self.listening.fetch_xor(true, Ordering::AcqRel)
    }

    /// 已收集的语句
    pub fn statements(&self) -> Vec<ParsedStatement> {
        self.statements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 所有已收集语句的格式化文本，以空行分隔
    pub fn copy_all(&self) -> String {
        self.statements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| s.formatted_statement.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// 清空已收集的语句并通知监听者
    pub fn clear(&self) {
        self.statements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        for listener in self.listeners_snapshot() {
            listener.on_clear();
        }
    }
}

impl StatementSink for SqlConsole {
    fn accept(&self, statement: ParsedStatement) {
        self.add_statement(statement);
    }
}

/// 渲染一条语句的展示块
///
/// # 示例
///
/// ```
/// use chrono::NaiveDate;
/// use mybatis_sqllog::console::render_block;
/// use mybatis_sqllog::{ParsedStatement, StatementKind};
///
/// let stmt = ParsedStatement::new("SELECT 1".into(), "SELECT 1".into(), StatementKind::Query, vec![]);
/// let ts = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
/// let block = render_block(&stmt, ts);
///
/// assert!(block.contains("🔎 QUERY [2025-01-02 03:04:05]\n"));
/// assert!(block.ends_with("\n\n"));
/// ```
pub fn render_block(statement: &ParsedStatement, timestamp: NaiveDateTime) -> String {
    let heavy = "═".repeat(BLOCK_WIDTH);
    let light = "─".repeat(BLOCK_WIDTH);
    format!(
        "{heavy}\n{} [{}]\n{light}\n{}\n{heavy}\n\n",
        statement.label,
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        statement.formatted_statement,
    )
}

/// 使用本地当前时间渲染展示块
pub fn render_block_now(statement: &ParsedStatement) -> String {
    render_block(statement, Local::now().naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::StatementKind;
    use chrono::NaiveDate;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counting {
        statements: AtomicUsize,
        clears: AtomicUsize,
    }

    impl ConsoleListener for Counting {
        fn on_statement(&self, _statement: &ParsedStatement) {
            self.statements.fetch_add(1, Ordering::SeqCst);
        }

        fn on_clear(&self) {
            self.clears.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sample(sql: &str) -> ParsedStatement {
        ParsedStatement::new(sql.into(), sql.into(), StatementKind::detect(sql), Vec::new())
    }

    #[test]
    fn test_listening_gate() {
        let console = SqlConsole::new();
        assert!(console.is_listening());
        assert!(!console.toggle_listening());
        assert!(!console.add_statement(sample("SELECT 1")));
        assert!(console.toggle_listening());
        assert!(console.add_statement(sample("SELECT 2")));
        assert_eq!(console.statements().len(), 1);
    }

    #[test]
    fn test_listeners_are_notified() {
        let console = SqlConsole::new();
        let counting = Arc::new(Counting::default());
        let listener: Arc<dyn ConsoleListener> = counting.clone();
        console.add_listener(Arc::clone(&listener));

        console.accept(sample("DELETE FROM t"));
        console.accept(sample("UPDATE t SET a = 1"));
        console.clear();
        assert_eq!(counting.statements.load(Ordering::SeqCst), 2);
        assert_eq!(counting.clears.load(Ordering::SeqCst), 1);
        assert!(console.statements().is_empty());

        assert!(console.remove_listener(&listener));
        assert!(!console.remove_listener(&listener));
        console.accept(sample("SELECT 1"));
        assert_eq!(counting.statements.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_copy_all_joins_formatted_text() {
        let console = SqlConsole::new();
        console.add_statement(sample("SELECT 1"));
        console.add_statement(sample("SELECT 2"));
        assert_eq!(console.copy_all(), "SELECT 1\n\nSELECT 2");
    }

    #[test]
    fn test_render_block_layout() {
        let ts = NaiveDate::from_ymd_opt(2025, 8, 12)
            .unwrap()
            .and_hms_opt(10, 57, 9)
            .unwrap();
        let block = render_block(&sample("DELETE FROM t"), ts);
        let lines: Vec<&str> = block.split('\n').collect();

        assert_eq!(lines[0].chars().count(), 59);
        assert!(lines[0].chars().all(|c| c == '═'));
        assert_eq!(lines[1], "🗑️ DELETE [2025-08-12 10:57:09]");
        assert!(lines[2].chars().all(|c| c == '─'));
        assert_eq!(lines[3], "DELETE FROM t");
        assert_eq!(lines[4], lines[0]);
        assert_eq!(&lines[5..], ["", ""]);
    }
}
