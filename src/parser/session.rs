//! SqlLogSession - 一个宿主进程输出会话
//!
//! 把行缓冲区与解析器放在同一把锁后面：宿主可以在任意线程投递文本块，
//! "追加 + 取出完整行 + 解析" 对每个块是原子的，不会出现半行交错。

use crate::parser::line_buffer::LineBuffer;
use crate::parser::sql_log_parser::SqlLogParser;
use crate::statement::ParsedStatement;
use log::error;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 接收还原结果的消费者
///
/// 每完成一次配对调用一次，调用顺序与完成顺序一致。
pub trait StatementSink: Send + Sync {
    fn accept(&self, statement: ParsedStatement);
}

impl<F> StatementSink for F
where
    F: Fn(ParsedStatement) + Send + Sync,
{
    fn accept(&self, statement: ParsedStatement) {
        self(statement)
    }
}

#[derive(Debug, Default)]
struct SessionState {
    lines: LineBuffer,
    parser: SqlLogParser,
}

/// 一条日志流的解析会话
///
/// 消费者在锁内被调用，因此不能在 `accept` 中回调同一个会话。
///
/// # 示例
///
/// ```
/// use mybatis_sqllog::{ParsedStatement, SqlLogSession};
/// use std::sync::{Arc, Mutex};
///
/// let received = Arc::new(Mutex::new(Vec::new()));
/// let sink = {
///     let received = Arc::clone(&received);
///     move |stmt: ParsedStatement| received.lock().unwrap().push(stmt)
/// };
///
/// let session = SqlLogSession::new(sink);
/// session.feed("==> Preparing: DELETE FROM t WHERE id = ?\n==> Param");
/// session.feed("eters: 7(Long)\n");
/// session.finish();
///
/// let received = received.lock().unwrap();
/// assert_eq!(received.len(), 1);
/// assert!(received[0].formatted_statement.contains("id = 7"));
/// ```
pub struct SqlLogSession<S: StatementSink> {
    state: Mutex<SessionState>,
    sink: S,
}

impl<S: StatementSink> SqlLogSession<S> {
    pub fn new(sink: S) -> Self {
        Self::with_parser(SqlLogParser::new(), sink)
    }

    pub fn with_parser(parser: SqlLogParser, sink: S) -> Self {
        Self {
            state: Mutex::new(SessionState {
                lines: LineBuffer::new(),
                parser,
            }),
            sink,
        }
    }

    /// 消费者
    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 投递一个文本块，返回本次交给消费者的语句数
    pub fn feed(&self, chunk: &str) -> usize {
        self.feed_bytes(chunk.as_bytes())
    }

    /// 投递一个原始字节块
    pub fn feed_bytes(&self, chunk: &[u8]) -> usize {
        let mut guard = self.lock();
        let SessionState { lines, parser } = &mut *guard;
        let mut delivered = 0;

        lines.push_bytes_with(chunk, |line| {
            if let Some(statement) = process_line(parser, &line) {
                self.sink.accept(statement);
                delivered += 1;
            }
        });
        delivered
    }

    /// 流结束：把缓冲区中剩余的不完整行作为最后一行处理
    pub fn finish(&self) -> usize {
        let mut guard = self.lock();
        let SessionState { lines, parser } = &mut *guard;

        match lines.flush() {
            Some(line) => match process_line(parser, &line) {
                Some(statement) => {
                    self.sink.accept(statement);
                    1
                }
                None => 0,
            },
            None => 0,
        }
    }

    /// 是否有语句正在等待参数行
    pub fn has_pending(&self) -> bool {
        self.lock().parser.has_pending()
    }
}

/// 行处理边界：单行中的意外 panic 被记录并吞掉，解析器状态复位后继续处理后续行
///
/// 所有逐行消费日志流的入口（会话、Reader API、实时跟踪）都经过这里。
pub(crate) fn process_line(parser: &mut SqlLogParser, line: &str) -> Option<ParsedStatement> {
    guarded_parse(parser, line, SqlLogParser::parse_line)
}

fn guarded_parse<F>(parser: &mut SqlLogParser, line: &str, parse: F) -> Option<ParsedStatement>
where
    F: FnOnce(&mut SqlLogParser, &str) -> Option<ParsedStatement>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| parse(parser, line))) {
        Ok(statement) => statement,
        Err(payload) => {
            error!("解析日志行失败: {} ({})", panic_message(&*payload), line);
            parser.reset();
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn collecting_session() -> (SqlLogSession<impl StatementSink>, Arc<Mutex<Vec<ParsedStatement>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let received = Arc::clone(&received);
            move |stmt: ParsedStatement| received.lock().unwrap().push(stmt)
        };
        (SqlLogSession::new(sink), received)
    }

    #[test]
    fn test_feed_unaligned_chunks() {
        let (session, received) = collecting_session();
        let log = "==>  Preparing: SELECT * FROM t WHERE id = ?\r\n==> Parameters: 5(Integer)\r\n";
        for chunk in log.as_bytes().chunks(7) {
            session.feed_bytes(chunk);
        }
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_finish_flushes_trailing_line() {
        let (session, received) = collecting_session();
        assert_eq!(session.feed("==> Preparing: SELECT 1\n==> Parameters: "), 0);
        assert!(session.has_pending());
        assert_eq!(session.finish(), 1);
        assert_eq!(received.lock().unwrap()[0].formatted_statement, "SELECT 1");
        assert!(!session.has_pending());
    }

    #[test]
    fn test_concurrent_feeders_keep_lines_whole() {
        let (session, received) = collecting_session();
        let session = Arc::new(session);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let session = Arc::clone(&session);
                thread::spawn(move || {
                    for _ in 0..25 {
                        session.feed("==> Preparing: UPDATE t SET a = ?\n==> Parameters: 1(Integer)\n");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 100);
        assert!(received.iter().all(|s| s.original_statement == "UPDATE t SET a = ?"));
    }

    #[test]
    fn test_panicking_line_resets_parser_and_stream_continues() {
        let mut parser = SqlLogParser::new();
        assert!(process_line(&mut parser, "==> Preparing: SELECT 1").is_none());
        assert!(parser.has_pending());

        let result = guarded_parse(&mut parser, "==> Parameters: ", |_, _| {
            panic!("unexpected input")
        });
        assert!(result.is_none());
        assert!(!parser.has_pending());

        assert!(process_line(&mut parser, "==> Parameters: ").is_none());
        assert!(process_line(&mut parser, "==> Preparing: DELETE FROM t WHERE id = ?").is_none());
        let stmt = process_line(&mut parser, "==> Parameters: 2(Integer)").unwrap();
        assert_eq!(stmt.formatted_statement, "DELETE FROM t\nWHERE id = 2");
    }

    #[test]
    fn test_panicking_sink_does_not_redeliver() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let received = Arc::clone(&received);
            move |stmt: ParsedStatement| {
                let calls = {
                    let mut received = received.lock().unwrap();
                    received.push(stmt.original_statement);
                    received.len()
                };
                if calls == 2 {
                    panic!("sink failed");
                }
            }
        };
        let session = SqlLogSession::new(sink);

        let first = panic::catch_unwind(AssertUnwindSafe(|| {
            session.feed(
                "==> Preparing: SELECT 1\n==> Parameters: \n==> Preparing: SELECT 2\n==> Parameters: \n",
            )
        }));
        assert!(first.is_err());

        assert_eq!(session.feed("==> Preparing: SELECT 3\n==> Parameters: \n"), 1);
        assert_eq!(
            *received.lock().unwrap(),
            vec!["SELECT 1", "SELECT 2", "SELECT 3"]
        );
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*payload), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*payload), "bang");
        let payload: Box<dyn Any + Send> = Box::new(3u8);
        assert_eq!(panic_message(&*payload), "unknown panic");
    }
}
