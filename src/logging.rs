// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别与输出格式
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 输出格式环境变量（取值 json 时输出结构化日志）
pub const LOG_FORMAT_ENV: &str = "BREEDING_WINDOW_LOG_FORMAT";

/// 格式取值是否要求 JSON 输出（忽略大小写与首尾空白）
fn wants_json(format: Option<&str>) -> bool {
    format.is_some_and(|v| v.trim().eq_ignore_ascii_case("json"))
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=breeding_window_engine::engine=debug
/// - BREEDING_WINDOW_LOG_FORMAT: 设为 json 时输出 JSON 行
///
/// 宿主已安装全局订阅器时静默跳过
///
/// # 示例
/// ```no_run
/// use breeding_window_engine::logging;
/// logging::init();
/// ```
pub fn init() {
    let json = wants_json(std::env::var(LOG_FORMAT_ENV).ok().as_deref());

    let builder = fmt()
        .with_env_filter(default_filter())
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        tracing::debug!("全局日志订阅器已存在，跳过初始化");
    }
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
