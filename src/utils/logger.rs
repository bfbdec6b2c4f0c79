use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Level used when only a verbose flag is given.
pub fn level_for(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn filter_directive(level: &str) -> String {
    let level = if LOG_LEVELS.contains(&level) { level } else { "info" };
    format!("voyage_value={}", level)
}

// RUST_LOG 優先於設定檔
fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(level)))
}

pub fn init_cli_logger(level: &str) {
    tracing_subscriber::registry()
        .with(default_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// JSON lines, for runs whose logs are collected by another process.
pub fn init_json_logger(level: &str) {
    tracing_subscriber::registry()
        .with(default_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}

/// Picks the formatter by name; anything other than `json` falls back to text.
pub fn init_logger(format: &str, level: &str) {
    match format {
        "json" => init_json_logger(level),
        _ => init_cli_logger(level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_follows_level() {
        assert_eq!(filter_directive("warn"), "voyage_value=warn");
        assert_eq!(filter_directive("error"), "voyage_value=error");
        assert_eq!(filter_directive("trace"), "voyage_value=trace");
        assert_eq!(filter_directive("loud"), "voyage_value=info");
    }

    #[test]
    fn test_level_for_verbose_flag() {
        assert_eq!(level_for(true), "debug");
        assert_eq!(level_for(false), "info");
    }
}
