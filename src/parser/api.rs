//! 便捷 API 函数
//!
//! 提供了一组方便使用的高层 API，用于从字符串、Reader 或文件中一次性还原 SQL。

use crate::error::ParseError;
use crate::parser::line_buffer::LineBuffer;
use crate::parser::session::process_line;
use crate::parser::sql_log_parser::SqlLogParser;
use crate::statement::ParsedStatement;
use log::debug;
use rayon::prelude::*;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// 每次从 Reader 读取的字节数
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// 从字符串中还原所有 SQL 语句
///
/// # 示例
///
/// ```
/// use mybatis_sqllog::parse_statements_from_str;
///
/// let log = "\
/// 10:00:00.123 DEBUG ==>  Preparing: UPDATE users SET name = ? WHERE id = ?
/// 10:00:00.124 DEBUG ==> Parameters: alice(String), 1(Long)
/// 10:00:00.125 DEBUG <==    Updates: 1
/// ";
///
/// let statements = parse_statements_from_str(log);
/// assert_eq!(statements.len(), 1);
/// assert_eq!(
///     statements[0].formatted_statement,
///     "UPDATE users\nSET name = 'alice'\nWHERE id = 1"
/// );
/// ```
pub fn parse_statements_from_str(content: &str) -> Vec<ParsedStatement> {
    let mut parser = SqlLogParser::new();
    content
        .lines()
        .filter_map(|line| process_line(&mut parser, line))
        .collect()
}

/// 流式读取，对每条还原完成的语句调用回调，返回语句数量
///
/// 读取按固定大小的块进行，行可以跨块切分。
///
/// # 错误
///
/// 读取失败时返回 `ParseError::IoError`；出错之前完成的语句已经交给回调。
///
/// # 示例
///
/// ```
/// use mybatis_sqllog::for_each_statement;
///
/// let log = "==> Preparing: SELECT 1\n==> Parameters: \n";
/// let mut labels = Vec::new();
/// let count = for_each_statement(log.as_bytes(), |stmt| labels.push(stmt.label))?;
/// assert_eq!(count, 1);
/// assert_eq!(labels, vec!["🔎 QUERY"]);
/// # Ok::<(), mybatis_sqllog::ParseError>(())
/// ```
pub fn for_each_statement<R, F>(mut reader: R, mut callback: F) -> Result<usize, ParseError>
where
    R: Read,
    F: FnMut(ParsedStatement),
{
    let mut parser = SqlLogParser::new();
    let mut lines = LineBuffer::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    let mut count = 0;

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        lines.push_bytes_with(&chunk[..n], |line| {
            if let Some(statement) = process_line(&mut parser, &line) {
                callback(statement);
                count += 1;
            }
        });
    }

    if let Some(line) = lines.flush() {
        if let Some(statement) = process_line(&mut parser, &line) {
            callback(statement);
            count += 1;
        }
    }

    Ok(count)
}

/// 从 Reader 中还原所有 SQL 语句
pub fn parse_statements_from_reader<R: Read>(reader: R) -> Result<Vec<ParsedStatement>, ParseError> {
    let mut statements = Vec::new();
    for_each_statement(reader, |stmt| statements.push(stmt))?;
    Ok(statements)
}

/// 从文件中还原所有 SQL 语句
///
/// # 错误
///
/// * `ParseError::FileNotFound` - 文件无法打开
/// * `ParseError::IoError` - 读取失败
///
/// # 示例
///
/// ```no_run
/// use mybatis_sqllog::parse_statements_from_file;
///
/// let statements = parse_statements_from_file("app.log")?;
/// for stmt in &statements {
///     println!("{}\n{}", stmt.label, stmt.formatted_statement);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_statements_from_file<P>(path: P) -> Result<Vec<ParsedStatement>, ParseError>
where
    P: AsRef<Path>,
{
    let path_ref = path.as_ref();
    let file = File::open(path_ref).map_err(|e| ParseError::FileNotFound {
        path: format!("{}: {}", path_ref.display(), e),
    })?;
    let statements = parse_statements_from_reader(file)?;
    debug!("{}: 还原 {} 条 SQL", path_ref.display(), statements.len());
    Ok(statements)
}

/// 并行解析多个文件，结果顺序与输入顺序一致
///
/// 每个文件使用独立的解析器，文件之间不会发生跨文件配对。
pub fn parse_statements_from_files<P>(paths: &[P]) -> Vec<Result<Vec<ParsedStatement>, ParseError>>
where
    P: AsRef<Path> + Sync,
{
    paths
        .par_iter()
        .map(|path| parse_statements_from_file(path))
        .collect()
}
