//! LineBuffer - 把任意切分的输出块还原为完整的行
//!
//! 宿主进程输出的文本块不保证与行边界对齐。缓冲区保存尚未遇到换行符的
//! 尾部片段，每追加一个块就把其中所有完整行（不含 `\n`，去除行尾 `\r`）交出。

use memchr::memchr;
use std::mem;

/// 未完成行的累积缓冲区
#[derive(Debug, Default, Clone)]
pub struct LineBuffer {
    buffer: Vec<u8>,
}

/// 把一行字节转为字符串并去除行尾 `\r`
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个文本块，返回其中完成的所有行
    ///
    /// # 示例
    ///
    /// ```
    /// use mybatis_sqllog::LineBuffer;
    ///
    /// let mut buffer = LineBuffer::new();
    /// assert!(buffer.push("==> Prep").is_empty());
    /// assert_eq!(buffer.push("aring: SELECT 1\r\nnext"), vec!["==> Preparing: SELECT 1"]);
    /// assert_eq!(buffer.flush().as_deref(), Some("next"));
    /// ```
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        let mut lines = Vec::new();
        self.push_bytes_with(chunk.as_bytes(), |line| lines.push(line));
        lines
    }

    /// 追加一个文本块，对每个完成的行调用 `on_line`
    pub fn push_with<F>(&mut self, chunk: &str, on_line: F)
    where
        F: FnMut(String),
    {
        self.push_bytes_with(chunk.as_bytes(), on_line);
    }

    /// 追加原始字节块（多字节字符可以跨块切分）
    ///
    /// 完整行先从缓冲区移出再交给 `on_line`，`on_line` 中途 panic 时
    /// 已取出的行不会在下一次追加时被重复交出。
    pub fn push_bytes_with<F>(&mut self, chunk: &[u8], mut on_line: F)
    where
        F: FnMut(String),
    {
        if chunk.is_empty() {
            return;
        }
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = memchr(b'\n', &self.buffer[start..]) {
            let end = start + offset;
            lines.push(decode_line(&self.buffer[start..end]));
            start = end + 1;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
        for line in lines {
            on_line(line);
        }
    }

    /// 流结束时取出剩余的不完整行；缓冲区为空时返回 `None`
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = mem::take(&mut self.buffer);
        Some(decode_line(&rest))
    }

    /// 缓冲区中尚未成行的字节数
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
