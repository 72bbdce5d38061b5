//! 性能回归测试
//!
//! 使用简单的计时来检测明显的性能问题（例如随条件数平方增长的格式化）。

use mybatis_sqllog::StatementKind;
use mybatis_sqllog::formatter::format_statement;
use std::time::{Duration, Instant};

/// `<foreach>` 生成的长 OR 链：格式化耗时应随长度线性增长
#[test]
fn perf_format_long_or_chain() {
    let n = 20_000;
    let conditions: Vec<String> = (0..n).map(|i| format!("id = {}", i)).collect();
    let sql = format!("DELETE FROM t WHERE {}", conditions.join(" OR "));

    let start = Instant::now();
    let formatted = format_statement(&sql, StatementKind::Delete);
    let duration = start.elapsed();

    assert_eq!(formatted.lines().count(), n + 1);
    assert!(formatted.ends_with(&format!("\n  OR id = {}", n - 1)));
    assert!(
        duration < Duration::from_secs(2),
        "格式化 {} 个条件耗时 {:?}",
        n,
        duration
    );
}

/// 多个 JOIN 的 SELECT 同样不应出现平方级退化
#[test]
fn perf_format_many_joins() {
    let n = 5_000;
    let mut sql = String::from("SELECT * FROM t0");
    for i in 1..=n {
        sql.push_str(&format!(" LEFT JOIN t{} ON t{}.id = t0.id", i, i));
    }
    sql.push_str(" WHERE t0.id = 1 AND t0.flag = 0");

    let start = Instant::now();
    let formatted = format_statement(&sql, StatementKind::Query);
    let duration = start.elapsed();

    // SELECT、FROM、n 个 JOIN、WHERE 两行
    assert_eq!(formatted.lines().count(), n + 4);
    assert!(
        duration < Duration::from_secs(2),
        "格式化 {} 个 JOIN 耗时 {:?}",
        n,
        duration
    );
}
