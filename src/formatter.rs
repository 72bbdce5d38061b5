//! SQL 格式化
//!
//! 按语句类别对单行 SQL 重新缩进。这里不构建语法树，只识别关键字边界：
//! 所有关键字匹配都是大小写不敏感的整词匹配，并且只在括号与单引号之外生效，
//! 因此子查询、函数参数中的关键字不会被当作子句边界。
//!
//! 无法识别的结构只做空白压缩，格式化永远不会失败。

use crate::statement::StatementKind;

/// 共享子句（按优先级顺序）
const CLAUSE_KEYWORDS: [&str; 5] = ["WHERE", "GROUP BY", "HAVING", "ORDER BY", "LIMIT"];

/// JOIN 关键字，同一位置优先取更长的形式
const JOIN_KEYWORDS: [&str; 10] = [
    "LEFT OUTER JOIN",
    "RIGHT OUTER JOIN",
    "FULL OUTER JOIN",
    "LEFT JOIN",
    "RIGHT JOIN",
    "INNER JOIN",
    "FULL JOIN",
    "CROSS JOIN",
    "NATURAL JOIN",
    "JOIN",
];

/// WHERE 中断行的连接词
const CONDITION_KEYWORDS: [&str; 3] = ["AND", "OR", "BETWEEN"];

/// JOIN、AND/OR 与右括号的缩进
const CLAUSE_INDENT: &str = "  ";

/// INSERT 列/值列表项的缩进
const LIST_INDENT: &str = "    ";

/// 把所有连续空白压缩为单个空格并去除首尾空白
///
/// # 示例
///
/// ```
/// use mybatis_sqllog::formatter::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  SELECT *\n\tFROM   t "), "SELECT * FROM t");
/// ```
pub fn collapse_whitespace(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 按顶层逗号切分（括号与单引号内的逗号不切分），每一项去除首尾空白
///
/// # 示例
///
/// ```
/// use mybatis_sqllog::formatter::split_top_level;
///
/// assert_eq!(split_top_level("1, f(2,3), 4"), vec!["1", "f(2,3)", "4"]);
/// ```
pub fn split_top_level(text: &str) -> Vec<&str> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = 0;

    for (i, b) in text.bytes().enumerate() {
        if in_quote {
            if b == b'\'' {
                in_quote = false;
            }
            continue;
        }
        match b {
            b'\'' => in_quote = true,
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts
}

/// 格式化一条 SQL
///
/// # 示例
///
/// ```
/// use mybatis_sqllog::StatementKind;
/// use mybatis_sqllog::formatter::format_statement;
///
/// let sql = "DELETE FROM t WHERE a = 1 AND b = 2";
/// assert_eq!(
///     format_statement(sql, StatementKind::Delete),
///     "DELETE FROM t\nWHERE a = 1\n  AND b = 2"
/// );
/// ```
pub fn format_statement(statement: &str, kind: StatementKind) -> String {
    let sql = collapse_whitespace(statement);
    if sql.is_empty() {
        return sql;
    }

    let text = SqlText::new(&sql);
    let formatted = match kind {
        StatementKind::Query => format_select(&text),
        StatementKind::Insert => format_insert(&text),
        StatementKind::Update => format_update(&text),
        StatementKind::Delete => {
            let mut lines = Vec::new();
            clause_lines(&text, 0, &mut lines);
            Some(lines)
        }
        StatementKind::Other => None,
    };

    match formatted {
        Some(lines) if !lines.is_empty() => lines.join("\n"),
        _ => sql,
    }
}

/// 已压缩空白的 SQL 文本，附带每个字节是否处于顶层（括号与引号之外）
struct SqlText<'a> {
    sql: &'a str,
    top_level: Vec<bool>,
}

#[inline]
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

impl<'a> SqlText<'a> {
    fn new(sql: &'a str) -> Self {
        let mut top_level = Vec::with_capacity(sql.len());
        let mut depth = 0usize;
        let mut in_quote = false;

        for b in sql.bytes() {
            top_level.push(!in_quote && depth == 0);
            if in_quote {
                if b == b'\'' {
                    in_quote = false;
                }
                continue;
            }
            match b {
                b'\'' => in_quote = true,
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }

        Self { sql, top_level }
    }

    #[inline]
    fn len(&self) -> usize {
        self.sql.len()
    }

    #[inline]
    fn slice(&self, from: usize, to: usize) -> &'a str {
        &self.sql[from..to]
    }

    /// 在 `[from, to)` 内查找顶层、整词匹配的关键字
    fn find_keyword(&self, keyword: &str, from: usize, to: usize) -> Option<usize> {
        let bytes = self.sql.as_bytes();
        let kw = keyword.as_bytes();
        let to = to.min(bytes.len());
        if kw.is_empty() || from >= to || to - from < kw.len() {
            return None;
        }

        (from..=to - kw.len()).find(|&i| {
            self.top_level[i]
                && bytes[i..i + kw.len()].eq_ignore_ascii_case(kw)
                && (i == 0 || !(is_word_byte(bytes[i - 1]) || bytes[i - 1] == b'.'))
                && bytes.get(i + kw.len()).is_none_or(|b| !is_word_byte(*b))
        })
    }

    /// 在 `[from, to)` 内查找最早出现的关键字；同一位置取列表中靠前（更长）的一个
    fn find_first(
        &self,
        keywords: &[&'static str],
        from: usize,
        to: usize,
    ) -> Option<(usize, &'static str)> {
        let mut best: Option<(usize, &'static str)> = None;
        for &kw in keywords {
            if let Some(pos) = self.find_keyword(kw, from, to) {
                if best.is_none_or(|(p, _)| pos < p) {
                    best = Some((pos, kw));
                }
            }
        }
        best
    }

    /// 在 `[from, to)` 内依次查找一组关键字的游标
    fn keyword_cursor<'t>(
        &'t self,
        keywords: &'static [&'static str],
        to: usize,
    ) -> KeywordCursor<'t, 'a> {
        KeywordCursor {
            text: self,
            keywords,
            to,
            cached: vec![None; keywords.len()],
        }
    }
}

/// 逐个向后推进的多关键字查找
///
/// 每个关键字缓存其下一次出现的位置，只有被游标越过的缓存才重新查找，
/// 整个子句的扫描总量与子句长度成线性关系。
struct KeywordCursor<'t, 'a> {
    text: &'t SqlText<'a>,
    keywords: &'static [&'static str],
    to: usize,
    /// `None`: 尚未查找；`Some(None)`: 之后不再出现
    cached: Vec<Option<Option<usize>>>,
}

impl KeywordCursor<'_, '_> {
    /// 从 `from` 起最早出现的关键字；同一位置取列表中靠前的一个
    fn next_from(&mut self, from: usize) -> Option<(usize, &'static str)> {
        let mut best: Option<(usize, &'static str)> = None;
        for (i, &kw) in self.keywords.iter().enumerate() {
            let pos = match self.cached[i] {
                Some(Some(pos)) if pos >= from => Some(pos),
                Some(None) => None,
                _ => {
                    let found = self.text.find_keyword(kw, from, self.to);
                    self.cached[i] = Some(found);
                    found
                }
            };
            if let Some(pos) = pos {
                if best.is_none_or(|(p, _)| pos < p) {
                    best = Some((pos, kw));
                }
            }
        }
        best
    }
}

fn push_trimmed(lines: &mut Vec<String>, indent: &str, segment: &str) {
    let segment = segment.trim();
    if !segment.is_empty() {
        lines.push(format!("{}{}", indent, segment));
    }
}

/// `HEAD a,` / 对齐缩进的后续项，每项一行
fn aligned_list(head: &str, items: &[&str], lines: &mut Vec<String>) {
    if items.is_empty() {
        lines.push(head.to_string());
        return;
    }

    let indent = " ".repeat(head.chars().count() + 1);
    let last = items.len() - 1;
    for (i, item) in items.iter().enumerate() {
        let comma = if i < last { "," } else { "" };
        if i == 0 {
            lines.push(format!("{} {}{}", head, item, comma));
        } else {
            lines.push(format!("{}{}{}", indent, item, comma));
        }
    }
}

/// 括号内的列表：每项一行，右括号单独缩进一行
fn paren_list(opener: String, inner: &str, closing: &str, lines: &mut Vec<String>) {
    lines.push(opener);
    let items = split_top_level(inner);
    let last = items.len().saturating_sub(1);
    for (i, item) in items.iter().enumerate() {
        let comma = if i < last { "," } else { "" };
        lines.push(format!("{}{}{}", LIST_INDENT, item, comma));
    }
    lines.push(format!("{}{}", CLAUSE_INDENT, closing));
}

/// 共享子句格式化：WHERE / GROUP BY / HAVING / ORDER BY / LIMIT
///
/// `from` 之前的内容不处理；第一个子句之前的部分原样作为一行。
fn clause_lines(text: &SqlText<'_>, from: usize, lines: &mut Vec<String>) {
    let end = text.len();
    let mut bounds: Vec<(usize, &'static str)> = Vec::new();
    let mut cursor = from;
    for kw in CLAUSE_KEYWORDS {
        if let Some(pos) = text.find_keyword(kw, cursor, end) {
            bounds.push((pos, kw));
            cursor = pos + kw.len();
        }
    }

    let head_end = bounds.first().map_or(end, |&(pos, _)| pos);
    push_trimmed(lines, "", text.slice(from, head_end));

    for (i, &(pos, kw)) in bounds.iter().enumerate() {
        let next = bounds.get(i + 1).map_or(end, |&(p, _)| p);
        if kw == "WHERE" {
            where_lines(text, pos, next, lines);
        } else {
            push_trimmed(lines, "", text.slice(pos, next));
        }
    }
}

/// WHERE 子句：顶层 AND / OR 各起一行（BETWEEN ... AND 中的 AND 除外）
fn where_lines(text: &SqlText<'_>, start: usize, end: usize, lines: &mut Vec<String>) {
    let mut segment_start = start;
    let mut cursor = start + "WHERE".len();
    let mut in_between = false;
    let mut indent = "";
    let mut conditions = text.keyword_cursor(&CONDITION_KEYWORDS, end);

    while let Some((pos, kw)) = conditions.next_from(cursor) {
        cursor = pos + kw.len();
        match kw {
            "BETWEEN" => in_between = true,
            "AND" if in_between => in_between = false,
            _ => {
                push_trimmed(lines, indent, text.slice(segment_start, pos));
                segment_start = pos;
                indent = CLAUSE_INDENT;
            }
        }
    }
    push_trimmed(lines, indent, text.slice(segment_start, end));
}

/// SELECT [DISTINCT|ALL] 字段列表 FROM 表 [JOIN ...] [子句...]
fn format_select(text: &SqlText<'_>) -> Option<Vec<String>> {
    let end = text.len();
    let select = text.find_keyword("SELECT", 0, end)?;
    let fields_start = select + "SELECT".len();
    let from = text.find_keyword("FROM", fields_start, end)?;

    let mut lines = Vec::new();
    push_trimmed(&mut lines, "", text.slice(0, select));

    let mut head = text.slice(select, fields_start).to_string();
    let mut fields = text.slice(fields_start, from).trim();
    if let Some(modifier) = leading_modifier(fields) {
        head.push(' ');
        head.push_str(modifier);
        fields = fields[modifier.len()..].trim_start();
    }
    aligned_list(&head, &split_top_level(fields), &mut lines);

    let table_start = from + "FROM".len();
    let rest = text
        .find_first(&CLAUSE_KEYWORDS, table_start, end)
        .map_or(end, |(pos, _)| pos);

    let mut joins = text.keyword_cursor(&JOIN_KEYWORDS, rest);
    let mut join = joins.next_from(table_start);
    let table_end = join.map_or(rest, |(pos, _)| pos);
    push_trimmed(&mut lines, "", text.slice(from, table_end));

    while let Some((pos, kw)) = join {
        let next = joins.next_from(pos + kw.len());
        let join_end = next.map_or(rest, |(p, _)| p);
        push_trimmed(&mut lines, CLAUSE_INDENT, text.slice(pos, join_end));
        join = next;
    }

    clause_lines(text, rest, &mut lines);
    Some(lines)
}

/// 字段列表开头的 DISTINCT / ALL 修饰词（保留原始大小写）
fn leading_modifier(fields: &str) -> Option<&str> {
    ["DISTINCT", "ALL"].into_iter().find_map(|modifier| {
        let len = modifier.len();
        let bytes = fields.as_bytes();
        let matched = bytes.len() >= len
            && bytes[..len].eq_ignore_ascii_case(modifier.as_bytes())
            && bytes.get(len).is_none_or(|b| !is_word_byte(*b));
        matched.then(|| &fields[..len])
    })
}

/// INSERT INTO 表 (列...) VALUES (值...)[, (值...)]
fn format_insert(text: &SqlText<'_>) -> Option<Vec<String>> {
    let end = text.len();
    let into = text.find_keyword("INTO", 0, end)?;
    let target_start = into + "INTO".len();
    let values = text.find_keyword("VALUES", target_start, end)?;

    let mut lines = Vec::new();
    let head = text.slice(0, target_start).trim();
    let target = text.slice(target_start, values).trim();

    match target.find('(') {
        Some(open) if target.ends_with(')') => {
            let table = target[..open].trim();
            let opener = if table.is_empty() {
                format!("{} (", head)
            } else {
                format!("{} {} (", head, table)
            };
            paren_list(opener, &target[open + 1..target.len() - 1], ")", &mut lines);
        }
        _ if target.is_empty() => lines.push(head.to_string()),
        _ => lines.push(format!("{} {}", head, target)),
    }

    let values_end = values + "VALUES".len();
    let keyword = text.slice(values, values_end);
    let region = text.slice(values_end, end).trim();
    let groups = split_top_level(region);

    let all_groups = !groups.is_empty()
        && groups
            .iter()
            .all(|g| g.len() >= 2 && g.starts_with('(') && g.ends_with(')'));

    if all_groups {
        let last = groups.len() - 1;
        for (i, group) in groups.iter().enumerate() {
            let opener = if i == 0 {
                format!("{} (", keyword)
            } else {
                format!("{}(", CLAUSE_INDENT)
            };
            let closing = if i < last { ")," } else { ")" };
            paren_list(opener, &group[1..group.len() - 1], closing, &mut lines);
        }
    } else {
        push_trimmed(&mut lines, "", &format!("{} {}", keyword, region));
    }

    Some(lines)
}

/// UPDATE 表 SET 赋值... [子句...]
fn format_update(text: &SqlText<'_>) -> Option<Vec<String>> {
    let end = text.len();
    let set = text.find_keyword("SET", 0, end)?;
    let assignments_start = set + "SET".len();
    let rest = text
        .find_first(&CLAUSE_KEYWORDS, assignments_start, end)
        .map_or(end, |(pos, _)| pos);

    let mut lines = Vec::new();
    push_trimmed(&mut lines, "", text.slice(0, set));

    let assignments = split_top_level(text.slice(assignments_start, rest));
    aligned_list(text.slice(set, assignments_start), &assignments, &mut lines);

    clause_lines(text, rest, &mut lines);
    Some(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_keyword_is_word_bounded() {
        let text = SqlText::new("SELECT GROUPNAME FROM t WHERE ANDREW = 1 GROUP BY x");
        let group = text.find_keyword("GROUP BY", 0, text.len()).unwrap();
        assert_eq!(text.slice(group, text.len()), "GROUP BY x");
        assert!(text.find_keyword("AND", 0, text.len()).is_none());
    }

    #[test]
    fn test_find_keyword_skips_parens_and_quotes() {
        let text = SqlText::new("SELECT (SELECT a FROM u) x, 'FROM' FROM t");
        let from = text.find_keyword("FROM", 0, text.len()).unwrap();
        assert_eq!(text.slice(from, text.len()), "FROM t");
    }

    #[test]
    fn test_find_keyword_ignores_qualified_names() {
        let text = SqlText::new("SELECT t.order FROM t ORDER BY t.order");
        let order = text.find_keyword("ORDER BY", 0, text.len()).unwrap();
        assert_eq!(text.slice(order, text.len()), "ORDER BY t.order");
        let from = text.find_keyword("FROM", 0, text.len()).unwrap();
        assert_eq!(from, 15);
    }

    #[test]
    fn test_find_first_prefers_longer_join() {
        let text = SqlText::new("FROM a LEFT OUTER JOIN b ON a.id = b.id");
        let (pos, kw) = text.find_first(&JOIN_KEYWORDS, 0, text.len()).unwrap();
        assert_eq!(kw, "LEFT OUTER JOIN");
        assert_eq!(pos, 7);
    }

    #[test]
    fn test_keyword_cursor_matches_find_first() {
        let text = SqlText::new("WHERE a = 1 AND b BETWEEN 1 AND 2 OR c = 3 AND d = 4");
        let mut cursor = text.keyword_cursor(&CONDITION_KEYWORDS, text.len());
        let mut from = 0;
        let mut found = Vec::new();
        while let Some((pos, kw)) = cursor.next_from(from) {
            assert_eq!(text.find_first(&CONDITION_KEYWORDS, from, text.len()), Some((pos, kw)));
            found.push(kw);
            from = pos + kw.len();
        }
        assert_eq!(found, ["AND", "BETWEEN", "AND", "OR", "AND"]);
    }

    #[test]
    fn test_split_top_level_handles_quotes() {
        assert_eq!(split_top_level("'a, b', c"), vec!["'a, b'", "c"]);
        assert!(split_top_level("  ").is_empty());
    }

    #[test]
    fn test_leading_modifier() {
        assert_eq!(leading_modifier("distinct a, b"), Some("distinct"));
        assert_eq!(leading_modifier("ALL x"), Some("ALL"));
        assert_eq!(leading_modifier("allowed, x"), None);
        assert_eq!(leading_modifier("a, b"), None);
    }
}
