//! 错误类型定义
//!
//! 核心解析流程（逐行解析、参数解码、格式化）永远不会返回错误，
//! 只有涉及文件、读取器和文件监控的入口才会返回 `ParseError`。

use thiserror::Error;

/// 解析错误类型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// 文件未找到或无法访问
    #[error("file not found or inaccessible: {path}")]
    FileNotFound {
        /// 文件路径（附带底层错误信息）
        path: String,
    },

    /// 读取过程中的 I/O 错误
    #[error("io error: {0}")]
    IoError(String),

    /// 配置无效（例如标记关键字为空）
    #[error("invalid parser config: {0}")]
    InvalidConfig(String),

    /// 文件监控器创建或运行失败
    #[error("watch error: {0}")]
    WatchError(String),
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::IoError(err.to_string())
    }
}
