// ==========================================
// 骑手排班系统 - 日志初始化
// ==========================================
// 输出: stderr（stdout 留给 CLI 的 JSON 结果）
// 级别: RUST_LOG, 缺省 info
// 格式: RIDER_SCHEDULING_LOG_FORMAT=json 时输出结构化 JSON
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志格式环境变量
pub const LOG_FORMAT_ENV: &str = "RIDER_SCHEDULING_LOG_FORMAT";

const DEFAULT_DIRECTIVE: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

fn wants_json() -> bool {
    std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// 初始化进程日志
///
/// 重复调用时保留第一次安装的订阅器
pub fn init() {
    let builder = fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    let _ = if wants_json() {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.compact().try_init()
    };
}

/// 测试日志: debug 级别, 输出被测试框架捕获
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
