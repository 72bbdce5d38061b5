//! 流式会话集成测试

use mybatis_sqllog::{
    ConsoleListener, ParsedStatement, SqlConsole, SqlLogParser, SqlLogSession, StatementKind,
    StatementSink,
};
use std::sync::{Arc, Mutex};
use std::thread;

const LOG: &str = "\
==>  Preparing: INSERT INTO users (id, name) VALUES (?, ?)
==> Parameters: 1(Long), 张三(String)
<==    Updates: 1
==>  Preparing: SELECT *
FROM users
WHERE id = ?
==> Parameters: 1(Long)
<==      Total: 1
";

#[derive(Default)]
struct Recorder(Mutex<Vec<String>>);

impl ConsoleListener for Recorder {
    fn on_statement(&self, statement: &ParsedStatement) {
        self.0.lock().unwrap().push(statement.original_statement.clone());
    }
}

#[test]
fn test_every_chunking_yields_same_statements() {
    for size in [1, 2, 5, 17, LOG.len()] {
        let session = SqlLogSession::new(SqlConsole::new());
        for chunk in LOG.as_bytes().chunks(size) {
            session.feed_bytes(chunk);
        }
        session.finish();

        let statements = session.sink().statements();
        assert_eq!(statements.len(), 2, "chunk size {}", size);
        assert_eq!(statements[0].kind, StatementKind::Insert);
        assert!(statements[0].formatted_statement.contains("'张三'"));
        assert_eq!(statements[1].original_statement, "SELECT * FROM users WHERE id = ?");
    }
}

#[test]
fn test_console_listener_sees_session_output() {
    let console = SqlConsole::new();
    let recorder = Arc::new(Recorder::default());
    console.add_listener(recorder.clone());

    let session = SqlLogSession::new(console);
    assert_eq!(session.feed(LOG), 2);
    assert_eq!(recorder.0.lock().unwrap().len(), 2);

    session.sink().set_listening(false);
    session.feed(LOG);
    assert_eq!(recorder.0.lock().unwrap().len(), 2);
}

#[test]
fn test_shared_session_across_threads() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let received = Arc::clone(&received);
        move |stmt: ParsedStatement| received.lock().unwrap().push(stmt.kind)
    };
    let session = Arc::new(SqlLogSession::new(sink));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                let line = format!(
                    "==> Preparing: DELETE FROM t WHERE id = ?\n==> Parameters: {}(Integer)\n",
                    i
                );
                session.feed(&line)
            })
        })
        .collect();

    let delivered: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(delivered, 8);
    let received = received.lock().unwrap();
    assert!(received.iter().all(|k| *k == StatementKind::Delete));
}

#[test]
fn test_custom_parser_in_session() {
    let config = mybatis_sqllog::ParserConfig::default()
        .with_sentinel("-->")
        .with_statement_token("SQL:")
        .with_parameters_token("Args:");
    let parser = SqlLogParser::with_config(&config).unwrap();
    let session = SqlLogSession::with_parser(parser, SqlConsole::new());

    session.feed("--> SQL: UPDATE t SET a = ?\n--> Args: true(Boolean)\n");
    let statements = session.sink().statements();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].formatted_statement, "UPDATE t\nSET a = 1");
}

fn assert_sink<S: StatementSink>(_: &S) {}

#[test]
fn test_console_is_a_sink() {
    assert_sink(&SqlConsole::new());
}
