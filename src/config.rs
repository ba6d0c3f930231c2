use clap::{Args, Parser};

// ============================================================================
// Configuration - CLI flags with environment fallbacks
// ============================================================================
//
// A `.env` file in the working directory is read first; real environment
// variables and flags override it.
//
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs
    Compact,

    /// Structured JSON logs
    Json,
}

#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log filter directives (e.g. "info,retail_orders=debug")
    #[arg(long, env = "RUST_LOG", default_value = "info,retail_orders=debug")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

#[derive(Debug, Args)]
pub struct DemoConfig {
    /// Initial stock of the demo product
    #[arg(long, env = "DEMO_STOCK", default_value_t = 10)]
    pub demo_stock: u32,

    /// Units the demo order reserves
    #[arg(long, env = "DEMO_QUANTITY", default_value_t = 2)]
    pub demo_quantity: u32,

    /// Outbox messages taken per drain
    #[arg(long, env = "OUTBOX_BATCH", default_value_t = 100)]
    pub outbox_batch: usize,
}

#[derive(Debug, Parser)]
#[command(name = "retail_orders", about = "Order lifecycle and inventory engine", long_about = None)]
pub struct AppConfig {
    #[command(flatten)]
    pub logging: LoggingConfig,

    #[command(flatten)]
    pub demo: DemoConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = AppConfig::try_parse_from([
            "retail_orders",
            "--log-level",
            "warn",
            "--log-format",
            "json",
            "--demo-stock",
            "25",
            "--demo-quantity",
            "4",
            "--outbox-batch",
            "2",
        ])
        .unwrap();

        assert_eq!(config.logging.log_level, "warn");
        assert_eq!(config.logging.log_format, LogFormat::Json);
        assert_eq!(config.demo.demo_stock, 25);
        assert_eq!(config.demo.demo_quantity, 4);
        assert_eq!(config.demo.outbox_batch, 2);
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        let result = AppConfig::try_parse_from(["retail_orders", "--log-format", "xml"]);
        assert!(result.is_err());
    }
}
