use crate::core::verifier::TicketVerifier;
use crate::domain::model::{HttpResponse, VerifierConfig};
use crate::domain::ports::HttpClient;
use crate::utils::error::{Result, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// 預設的 HTTP client，包一層 reqwest
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::from)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url) -> std::result::Result<HttpResponse, TransportError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

impl TicketVerifier<ReqwestClient> {
    /// 用設定中的 timeout 建立標準 client
    pub fn with_reqwest(config: VerifierConfig) -> Result<Self> {
        let client = ReqwestClient::from_config(&config)?;
        TicketVerifier::new(config, client)
    }
}
