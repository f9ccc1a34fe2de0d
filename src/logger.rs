use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking;
use tracing_subscriber::{Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 终端按 `level` 输出，文件按天滚动并记录全部日志；返回的 guard 需要保持存活
pub fn init_logger(path: &str, level: LevelFilter) -> non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(path, "practicum_client");
    let (file_writer, guard) = non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_ansi(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(level);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_filter(LevelFilter::TRACE);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}
