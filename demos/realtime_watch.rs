//! 跟踪一个正在写入的日志文件
//!
//! ```text
//! cargo run --example realtime_watch --features realtime -- app.log 60
//! ```

use mybatis_sqllog::console::render_block_now;
use mybatis_sqllog::realtime::RealtimeSqlLogWatcher;
use std::env;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let path = args.next().ok_or("usage: realtime_watch <log file> [seconds]")?;
    let seconds: u64 = match args.next() {
        Some(s) => s.parse()?,
        None => 60,
    };

    let watcher = RealtimeSqlLogWatcher::new(&path)?;
    let total = watcher.watch_for(Duration::from_secs(seconds), |stmt| {
        print!("{}", render_block_now(&stmt));
    })?;

    eprintln!("共还原 {} 条 SQL", total);
    Ok(())
}
