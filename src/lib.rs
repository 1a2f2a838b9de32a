pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::http::ReqwestClient;
pub use crate::core::{verifier::TicketVerifier, CasIdentity, RequestContext, VerifierConfig};
pub use utils::error::{CasError, ErrorCategory, Result, TransportError};
