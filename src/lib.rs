//! # MyBatis SQL Log
//!
//! 把 MyBatis 调试日志中成对出现的 `Preparing` / `Parameters` 行还原为
//! 完整、已代入参数并按子句缩进的 SQL 语句。
//!
//! ## 功能特性
//!
//! - **逐行状态机**: 支持跨多行的语句，自动跳过日志框架噪声
//! - **类型化参数**: `value(Type)` 记号按类型解码后渲染为 SQL 字面量
//! - **子句感知格式化**: SELECT / INSERT / UPDATE / DELETE 各自的缩进布局
//! - **流式会话**: 宿主输出块可以任意切分，多线程投递也不会出现半行交错
//!
//! ## 快速开始
//!
//! ### 逐行解析
//!
//! ```rust
//! use mybatis_sqllog::{SqlLogParser, StatementKind};
//!
//! let mut parser = SqlLogParser::new();
//! parser.parse_line("==>  Preparing: SELECT id, name FROM users WHERE id = ?");
//! let stmt = parser.parse_line("==> Parameters: 5(Integer)").unwrap();
//!
//! assert_eq!(stmt.kind, StatementKind::Query);
//! assert_eq!(
//!     stmt.formatted_statement,
//!     "SELECT id,\n       name\nFROM users\nWHERE id = 5"
//! );
//! ```
//!
//! ### 批量解析
//!
//! ```rust
//! use mybatis_sqllog::parse_statements_from_str;
//!
//! let log = "\
//! 2025-08-12 10:57:09.548 DEBUG 1 --- [main] c.e.m.UserMapper.insert : ==>  Preparing: INSERT INTO users (name) VALUES (?)
//! 2025-08-12 10:57:09.549 DEBUG 1 --- [main] c.e.m.UserMapper.insert : ==> Parameters: alice(String)
//! 2025-08-12 10:57:09.551 DEBUG 1 --- [main] c.e.m.UserMapper.insert : <==    Updates: 1";
//!
//! for stmt in parse_statements_from_str(log) {
//!     println!("{}\n{}", stmt.label, stmt.formatted_statement);
//! }
//! ```
//!
//! ### 宿主进程输出流
//!
//! ```rust
//! use mybatis_sqllog::{SqlConsole, SqlLogSession};
//!
//! let session = SqlLogSession::new(SqlConsole::new());
//! session.feed("==> Preparing: DELETE FROM t WHERE id = ?\n==> Paramet");
//! session.feed("ers: 3(Long)\n");
//!
//! assert_eq!(session.sink().statements().len(), 1);
//! ```
//!
//! ## 日志格式
//!
//! ```text
//! ==>  Preparing: SELECT * FROM t WHERE id = ?
//! ==> Parameters: 5(Integer)
//! <==      Total: 1
//! ```

pub mod console;
pub mod error;
pub mod formatter;
pub mod param;
pub mod parser;
pub mod parser_config;
#[cfg(feature = "realtime")]
pub mod realtime;
pub mod statement;
pub mod tools;

pub use console::{ConsoleListener, SqlConsole};
pub use error::ParseError;
pub use formatter::format_statement;
pub use param::{ParamValue, ParsedParameter};
pub use parser::{
    LineBuffer, SqlLogParser, SqlLogSession, StatementSink, for_each_statement,
    parse_statements_from_file, parse_statements_from_files, parse_statements_from_reader,
    parse_statements_from_str,
};
pub use parser_config::{MarkerPatterns, ParserConfig};
pub use statement::{ParsedStatement, StatementKind};
