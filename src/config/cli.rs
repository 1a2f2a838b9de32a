use crate::config::toml_config::MAX_TIMEOUT_SECONDS;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_namespace_prefix, validate_range, validate_required_field, validate_url, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "cas-ticket")]
#[command(about = "Validate a CAS service ticket against a CAS server")]
pub struct CliConfig {
    #[arg(long, help = "TOML configuration file; overrides the --validation-url/--prefix/--timeout-seconds flags")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "CAS serviceValidate endpoint")]
    pub validation_url: Option<String>,

    #[arg(long, default_value = "cas")]
    pub prefix: String,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Inbound request URL the ticket arrived on, including its ticket parameter")]
    pub request_url: String,

    #[arg(long, default_value = "", help = "Front controller prefix of the request path")]
    pub base_path: String,

    #[arg(long, help = "Ticket argument; the request URL's ticket parameter is what gets validated")]
    pub ticket: Option<String>,

    #[arg(long, help = "Print the identity as JSON")]
    pub json: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn validation_url(&self) -> Option<&str> {
        self.validation_url.as_deref()
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("request_url", &self.request_url)?;

        // 有設定檔時 CAS 相關設定由設定檔負責驗證
        if self.config.is_some() {
            return Ok(());
        }

        let validation_url = validate_required_field("validation_url", &self.validation_url)?;
        validate_url("validation_url", validation_url)?;
        validate_namespace_prefix("prefix", &self.prefix)?;

        if let Some(timeout) = self.timeout_seconds {
            validate_range("timeout_seconds", timeout, 1, MAX_TIMEOUT_SECONDS)?;
        }

        Ok(())
    }
}
