use crate::config::Config;
use log::LevelFilter;
use simplelog::{self, ConfigBuilder};

/// Crates whose output is only wanted when tracing: SQL statements and HTTP traffic.
const FILTERED_MODULES: &[&str] = &["sqlx", "sea_orm", "reqwest", "hyper", "rustls"];

pub struct Logger {}

impl Logger {
    /// Installs a terminal logger at `config.log_level_filter` with RFC 3339 timestamps.
    pub fn init_logger(config: &Config) {
        let level = config.log_level_filter;

        if let Err(e) = simplelog::TermLogger::init(
            Self::terminal_level(level),
            Self::log_config(level),
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        ) {
            eprintln!("Logger was already installed: {e}");
        }
    }

    fn terminal_level(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }

    fn quiets_dependencies(level: LevelFilter) -> bool {
        level < LevelFilter::Trace
    }

    fn log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if Self::quiets_dependencies(level) {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}
