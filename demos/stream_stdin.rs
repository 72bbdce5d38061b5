//! 从标准输入读取应用日志，把还原出的 SQL 以展示块输出
//!
//! ```text
//! mvn spring-boot:run | cargo run --example stream_stdin
//! RUST_LOG=debug cargo run --example stream_stdin < app.log
//! ```

use mybatis_sqllog::console::render_block_now;
use mybatis_sqllog::for_each_statement;
use std::io;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let stdin = io::stdin();
    let count = for_each_statement(stdin.lock(), |stmt| {
        print!("{}", render_block_now(&stmt));
    })?;

    eprintln!("共还原 {} 条 SQL", count);
    Ok(())
}
