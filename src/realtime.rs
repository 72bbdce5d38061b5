//! 实时日志跟踪模块
//!
//! 监控一个持续增长的应用日志文件，增量读取新增内容并还原其中的 SQL：
//! - 文件内容变化监控
//! - 增量读取新增字节（行可以跨两次写入切分）
//! - 文件被截断（日志轮转）时从头重新读取
//!
//! # 示例
//!
//! ```no_run
//! use mybatis_sqllog::realtime::RealtimeSqlLogWatcher;
//! use std::time::Duration;
//!
//! let watcher = RealtimeSqlLogWatcher::new("app.log")?;
//!
//! watcher.watch_for(Duration::from_secs(60), |stmt| {
//!     println!("{}\n{}", stmt.label, stmt.formatted_statement);
//! })?;
//! # Ok::<(), mybatis_sqllog::ParseError>(())
//! ```

use crate::error::ParseError;
use crate::parser::session::process_line;
use crate::parser::{LineBuffer, SqlLogParser};
use crate::statement::ParsedStatement;
use log::{error, info, warn};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

/// 等待文件事件的轮询间隔
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 实时日志跟踪器
///
/// 监控指定文件的变化，把新增内容送入自己的解析器
pub struct RealtimeSqlLogWatcher {
    /// 日志文件路径
    file_path: PathBuf,
    /// 已读取到的字节位置
    position: u64,
    /// 跨两次读取的不完整行
    lines: LineBuffer,
    parser: SqlLogParser,
}

impl RealtimeSqlLogWatcher {
    /// 创建跟踪器，从文件当前末尾开始
    ///
    /// # 错误
    ///
    /// 文件不存在或无法打开时返回 `ParseError::FileNotFound`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        Self::with_parser(path, SqlLogParser::new())
    }

    /// 使用自定义解析器创建跟踪器
    pub fn with_parser<P: AsRef<Path>>(path: P, parser: SqlLogParser) -> Result<Self, ParseError> {
        let file_path = path.as_ref().to_path_buf();
        let mut file = File::open(&file_path).map_err(|e| ParseError::FileNotFound {
            path: format!("{}: {}", file_path.display(), e),
        })?;
        let position = file.seek(SeekFrom::End(0))?;

        Ok(Self {
            file_path,
            position,
            lines: LineBuffer::new(),
            parser,
        })
    }

    /// 从文件开头开始解析
    ///
    /// 默认情况下，跟踪器只处理创建之后追加的内容。
    pub fn from_beginning(mut self) -> Self {
        self.position = 0;
        self
    }

    /// 当前读取位置
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// 读取自上次以来新增的字节
    fn read_new_content(&mut self) -> Result<Vec<u8>, ParseError> {
        let mut file = File::open(&self.file_path)?;
        let len = file.metadata()?.len();

        if len < self.position {
            warn!("{} 被截断，从头重新读取", self.file_path.display());
            self.position = 0;
            self.lines = LineBuffer::new();
            self.parser.reset();
        }

        file.seek(SeekFrom::Start(self.position))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        self.position += bytes.len() as u64;
        Ok(bytes)
    }

    /// 读取新增内容并解析，对每条完成的语句调用回调，返回语句数
    pub fn poll<F>(&mut self, mut callback: F) -> Result<usize, ParseError>
    where
        F: FnMut(ParsedStatement),
    {
        let bytes = self.read_new_content()?;
        let parser = &mut self.parser;
        let mut count = 0;

        self.lines.push_bytes_with(&bytes, |line| {
            if let Some(statement) = process_line(parser, &line) {
                callback(statement);
                count += 1;
            }
        });
        Ok(count)
    }

    /// 把缓冲区中剩余的不完整行作为最后一行处理
    pub fn flush<F>(&mut self, mut callback: F) -> usize
    where
        F: FnMut(ParsedStatement),
    {
        match self
            .lines
            .flush()
            .and_then(|line| process_line(&mut self.parser, &line))
        {
            Some(statement) => {
                callback(statement);
                1
            }
            None => 0,
        }
    }

    /// 监控一段时间后停止，返回期间还原的语句总数
    ///
    /// 开始监控前先处理一次已有的新增内容；结束时处理末尾的不完整行。
    ///
    /// # 错误
    ///
    /// 文件监控器无法创建时返回 `ParseError::WatchError`
    pub fn watch_for<F>(mut self, duration: Duration, mut callback: F) -> Result<usize, ParseError>
    where
        F: FnMut(ParsedStatement),
    {
        let (tx, rx) = channel();
        let start_time = Instant::now();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = tx.send(event);
                }
            },
            Config::default(),
        )
        .map_err(|e| ParseError::WatchError(format!("failed to create watcher: {}", e)))?;

        watcher
            .watch(&self.file_path, RecursiveMode::NonRecursive)
            .map_err(|e| ParseError::WatchError(format!("failed to watch file: {}", e)))?;

        info!(
            "开始监控文件 {}, 持续 {} 毫秒",
            self.file_path.display(),
            duration.as_millis()
        );

        let mut total = self.poll(&mut callback)?;

        while start_time.elapsed() < duration {
            let Ok(event) = rx.recv_timeout(EVENT_POLL_INTERVAL) else {
                continue;
            };
            if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                match self.poll(&mut callback) {
                    Ok(n) => total += n,
                    Err(e) => error!("读取文件失败: {}", e),
                }
            }
        }

        total += self.flush(&mut callback);
        info!("监控结束，共还原 {} 条 SQL", total);
        Ok(total)
    }
}
