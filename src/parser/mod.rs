//! Parser 模块 - 从 MyBatis 调试日志中还原 SQL
//!
//! 此模块提供了完整的还原流程,包括:
//! - 逐行状态机（`SqlLogParser`）
//! - 任意切分的输出块到完整行（`LineBuffer`）
//! - 线程安全的流式会话（`SqlLogSession`）
//! - 便捷 API 函数

mod api;
pub mod line_buffer;
pub mod session;
pub mod sql_log_parser;

pub use api::{
    for_each_statement, parse_statements_from_file, parse_statements_from_files,
    parse_statements_from_reader, parse_statements_from_str,
};
pub use line_buffer::LineBuffer;
pub use session::{SqlLogSession, StatementSink};
pub use sql_log_parser::SqlLogParser;
