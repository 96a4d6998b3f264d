//! 日誌初始化
//!
//! 以 `RUST_LOG` 控制輸出層級，未設定時為 `info`。

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化全域日誌（示例與命令列工具用）
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 測試用：輸出交給測試框架擷取，重複呼叫不會失敗
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
