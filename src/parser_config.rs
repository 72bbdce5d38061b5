//! Parser 配置模块
//!
//! 描述 MyBatis 日志中两类标记行的文法：语句标记（`==> Preparing: ...`）
//! 与参数标记（`==> Parameters: ...`）。日志框架格式变化时只需更新配置，
//! 而不需要修改核心解析逻辑。

use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// 默认的日志级别关键字，出现在捕获文本之后时视为日志框架噪声
pub const DEFAULT_SEVERITY_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARN", "ERROR", "TRACE"];

/// Parser 配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// 标记行的前导符号，如 `==>`
    pub sentinel: String,

    /// 语句标记关键字，如 `Preparing:`
    pub statement_token: String,

    /// 参数标记关键字，如 `Parameters:`
    pub parameters_token: String,

    /// 截断捕获文本的日志级别关键字（大小写不敏感）
    pub severity_levels: Vec<String>,

    /// 前导符号被截断时，是否接受以参数关键字开头的行
    pub loose_parameters: bool,
}

impl ParserConfig {
    /// MyBatis 默认配置
    pub fn mybatis_default() -> Self {
        Self {
            sentinel: "==>".to_string(),
            statement_token: "Preparing:".to_string(),
            parameters_token: "Parameters:".to_string(),
            severity_levels: DEFAULT_SEVERITY_LEVELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            loose_parameters: true,
        }
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn with_statement_token(mut self, token: impl Into<String>) -> Self {
        self.statement_token = token.into();
        self
    }

    pub fn with_parameters_token(mut self, token: impl Into<String>) -> Self {
        self.parameters_token = token.into();
        self
    }

    pub fn with_loose_parameters(mut self, enabled: bool) -> Self {
        self.loose_parameters = enabled;
        self
    }

    /// 日志级别尾巴：`\s+\b(?:DEBUG|INFO|...)\b` 或行尾
    fn noise_tail(&self) -> String {
        let levels: Vec<String> = self
            .severity_levels
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| regex::escape(s))
            .collect();
        if levels.is_empty() {
            "$".to_string()
        } else {
            format!(r"(?:\s+\b(?:{})\b|$)", levels.join("|"))
        }
    }

    fn marker_pattern(&self, sentinel: Option<&str>, token: &str) -> String {
        let prefix = match sentinel {
            Some(s) => format!(r"{}\s*", regex::escape(s)),
            None => String::new(),
        };
        format!(
            r"(?i){}{}\s*(.*?){}",
            prefix,
            regex::escape(token),
            self.noise_tail()
        )
    }

    /// 编译标记正则
    ///
    /// # 错误
    ///
    /// 关键字为空或正则无法编译时返回 `ParseError::InvalidConfig`
    pub fn compile(&self) -> Result<MarkerPatterns, ParseError> {
        if self.statement_token.is_empty() || self.parameters_token.is_empty() {
            return Err(ParseError::InvalidConfig(
                "statement and parameters tokens must not be empty".to_string(),
            ));
        }

        let build = |pattern: String| {
            Regex::new(&pattern).map_err(|e| ParseError::InvalidConfig(e.to_string()))
        };

        let statement = build(self.marker_pattern(Some(&self.sentinel), &self.statement_token))?;
        let parameters =
            build(self.marker_pattern(Some(&self.sentinel), &self.parameters_token))?;
        let loose_parameters = if self.loose_parameters {
            Some(build(self.marker_pattern(None, &self.parameters_token))?)
        } else {
            None
        };

        Ok(MarkerPatterns {
            sentinel: self.sentinel.clone(),
            parameters_token: self.parameters_token.clone(),
            statement,
            parameters,
            loose_parameters,
        })
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::mybatis_default()
    }
}

/// 由 `ParserConfig` 编译得到的标记正则集合
#[derive(Debug)]
pub struct MarkerPatterns {
    pub(crate) sentinel: String,
    pub(crate) parameters_token: String,
    statement: Regex,
    parameters: Regex,
    loose_parameters: Option<Regex>,
}

/// 默认配置对应的标记正则，只编译一次
pub(crate) static DEFAULT_MARKERS: Lazy<Arc<MarkerPatterns>> = Lazy::new(|| {
    Arc::new(
        ParserConfig::mybatis_default()
            .compile()
            .expect("default marker patterns must compile"),
    )
});

impl MarkerPatterns {
    /// 匹配语句标记，返回去除首尾空白后的捕获文本
    pub fn match_statement<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.statement
            .captures(line)
            .map(|caps| caps.get(1).map_or("", |m| m.as_str()).trim())
    }

    /// 匹配参数标记；标准文法不匹配且行以参数关键字开头时退回宽松文法
    pub fn match_parameters<'a>(&self, line: &'a str) -> Option<&'a str> {
        let caps = self.parameters.captures(line).or_else(|| {
            let loose = self.loose_parameters.as_ref()?;
            if line.trim_start().starts_with(self.parameters_token.as_str()) {
                loose.captures(line)
            } else {
                None
            }
        })?;
        Some(caps.get(1).map_or("", |m| m.as_str()).trim())
    }

    /// 行内是否出现参数关键字（不要求完整文法）
    pub fn mentions_parameters(&self, line: &str) -> bool {
        line.contains(self.parameters_token.as_str())
    }

    /// 行是否以前导符号开头（框架的其他输出，不是 SQL）
    pub fn starts_with_sentinel(&self, trimmed: &str) -> bool {
        !self.sentinel.is_empty() && trimmed.starts_with(self.sentinel.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParserConfig::default();
        assert_eq!(config.sentinel, "==>");
        assert_eq!(config.statement_token, "Preparing:");
        assert_eq!(config.parameters_token, "Parameters:");
        assert_eq!(config.severity_levels.len(), 5);
        assert!(config.loose_parameters);
    }

    #[test]
    fn test_statement_marker_trims_severity_tail() {
        let markers = ParserConfig::default().compile().unwrap();
        let line = "12:00:01 ==>  Preparing: SELECT * FROM t WHERE id = ? DEBUG [main]";
        assert_eq!(
            markers.match_statement(line),
            Some("SELECT * FROM t WHERE id = ?")
        );
    }

    #[test]
    fn test_statement_marker_is_case_insensitive() {
        let markers = ParserConfig::default().compile().unwrap();
        assert_eq!(markers.match_statement("==> preparing: select 1"), Some("select 1"));
    }

    #[test]
    fn test_bare_severity_word_ends_capture() {
        // 空白后的级别单词总被当作日志尾部，即使它其实是列名
        let markers = ParserConfig::default().compile().unwrap();
        assert_eq!(
            markers.match_statement("==> Preparing: SELECT id, info FROM t"),
            Some("SELECT id,")
        );
        assert_eq!(
            markers.match_statement("==> Preparing: SELECT id, t.info FROM t"),
            Some("SELECT id, t.info FROM t")
        );
    }

    #[test]
    fn test_empty_capture_is_accepted() {
        let markers = ParserConfig::default().compile().unwrap();
        assert_eq!(markers.match_statement("==> Preparing:"), Some(""));
        assert_eq!(markers.match_parameters("==> Parameters: "), Some(""));
    }

    #[test]
    fn test_loose_parameters_marker() {
        let markers = ParserConfig::default().compile().unwrap();
        assert_eq!(markers.match_parameters("Parameters: 1(Integer)"), Some("1(Integer)"));

        let strict = ParserConfig::default()
            .with_loose_parameters(false)
            .compile()
            .unwrap();
        assert_eq!(strict.match_parameters("Parameters: 1(Integer)"), None);
    }

    #[test]
    fn test_custom_tokens() {
        let markers = ParserConfig::default()
            .with_sentinel("-->")
            .with_statement_token("SQL:")
            .with_parameters_token("Args:")
            .compile()
            .unwrap();
        assert_eq!(markers.match_statement("--> SQL: DELETE FROM t"), Some("DELETE FROM t"));
        assert_eq!(markers.match_parameters("--> Args: 1(Long)"), Some("1(Long)"));
        assert_eq!(markers.match_statement("==> Preparing: SELECT 1"), None);
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let result = ParserConfig::default().with_statement_token("").compile();
        assert!(matches!(result, Err(ParseError::InvalidConfig(_))));
    }
}
