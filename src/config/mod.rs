#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::{ConfigProvider, VerifierConfig};
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

impl VerifierConfig {
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let validation_url = provider.validation_url().map(str::to_string);
        let validation_url = validate_required_field("cas.validation_url", &validation_url)?;

        let mut config = VerifierConfig::new(validation_url.clone()).with_prefix(provider.prefix());
        if let Some(timeout) = provider.timeout() {
            config = config.with_timeout(timeout);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_from_toml_provider() {
        let toml = TomlConfig::from_toml_str(
            r#"
[cas]
validation_url = "https://cas.example.com/cas/serviceValidate"
prefix = "sso"
timeout_seconds = 4
"#,
        )
        .unwrap();

        let config = VerifierConfig::from_provider(&toml).unwrap();
        assert_eq!(
            config,
            VerifierConfig::new("https://cas.example.com/cas/serviceValidate")
                .with_prefix("sso")
                .with_timeout(Duration::from_secs(4))
        );
    }
}
