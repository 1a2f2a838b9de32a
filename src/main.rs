use cas_ticket::utils::{logger, validation::Validate};
use cas_ticket::{
    CasError, CliConfig, ErrorCategory, RequestContext, TicketVerifier, TomlConfig, VerifierConfig,
};
use clap::Parser;
use url::Url;

fn exit_code(error: &CasError) -> i32 {
    match error.category() {
        ErrorCategory::Verification => 1,
        ErrorCategory::Transport => 2,
        ErrorCategory::Environment | ErrorCategory::Configuration => 3,
    }
}

fn fail(error: CasError) -> ! {
    tracing::error!(
        "❌ CAS verification failed: {} (Category: {:?})",
        error,
        error.category()
    );
    eprintln!("❌ {}", error);
    eprintln!("💡 {}", error.recovery_suggestion());
    std::process::exit(exit_code(&error));
}

fn load_config(cli: &CliConfig) -> Result<(VerifierConfig, Option<String>), CasError> {
    cli.validate()?;

    match &cli.config {
        Some(path) => {
            let toml = TomlConfig::from_file(path)?;
            toml.validate()?;
            let level = toml.log_level().map(str::to_string);
            Ok((VerifierConfig::from_provider(&toml)?, level))
        }
        None => Ok((VerifierConfig::from_provider(cli)?, None)),
    }
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 先載入設定，日誌等級可能來自設定檔
    let loaded = load_config(&cli);
    let level = loaded.as_ref().ok().and_then(|(_, level)| level.clone());
    if cli.json_logs {
        let level = if cli.verbose { "debug" } else { level.as_deref().unwrap_or("info") };
        logger::init_json_logger(level);
    } else {
        logger::init_cli_logger(cli.verbose, level.as_deref());
    }

    let config = match loaded {
        Ok((config, _)) => config,
        Err(e) => fail(e),
    };
    tracing::debug!("Verifier config: {:?}", config);

    let request_url = match Url::parse(&cli.request_url) {
        Ok(url) => url,
        Err(e) => fail(CasError::InvalidConfigValueError {
            field: "request_url".to_string(),
            value: cli.request_url.clone(),
            reason: format!("Invalid URL format: {}", e),
        }),
    };
    let request = RequestContext::from_url(&request_url, &cli.base_path);
    let ticket = cli
        .ticket
        .clone()
        .or_else(|| request.query_param("ticket").map(str::to_string))
        .unwrap_or_default();

    let verifier = match TicketVerifier::with_reqwest(config) {
        Ok(verifier) => verifier,
        Err(e) => fail(e),
    };

    match verifier.verify_identity(&ticket, Some(&request)).await {
        Ok(identity) => {
            if cli.json {
                match serde_json::to_string_pretty(&identity) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("❌ Failed to serialize identity: {}", e);
                        std::process::exit(3);
                    }
                }
            } else {
                println!("{}", identity.user);
            }
        }
        Err(e) => fail(e),
    }
}
