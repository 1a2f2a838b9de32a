use crate::core::response::parse_response;
use crate::core::service_url::{build_validation_request, build_validation_url};
use crate::domain::model::{CasIdentity, CasResponse, RequestContext, ValidationRequest, VerifierConfig};
use crate::domain::ports::{HttpClient, RequestAccessor};
use crate::utils::error::{CasError, Result, TransportError};
use crate::utils::validation::{validate_namespace_prefix, validate_url};
use std::time::Duration;
use url::Url;

/// Validates CAS service tickets against a remote CAS server (protocol v2).
///
/// The ticket sent to the server is always the `ticket` query parameter of the
/// inbound request, never the `ticket` argument of [`TicketVerifier::verify`]:
/// CAS binds a ticket to the exact service URL it was issued for, so only the
/// request the browser actually arrived on can be validated. The argument is
/// accepted for interface compatibility and only logged when it differs.
///
/// Each call performs exactly one GET and holds no state between calls, so a
/// single verifier can be shared across tasks behind an `Arc`. Nothing is
/// retried: a consumed ticket may already be invalidated on the server.
///
/// The returned user is the first `user` element's text, trimmed; a blank or
/// missing user fails with [`CasError::InvalidResponse`].
pub struct TicketVerifier<C: HttpClient> {
    config: VerifierConfig,
    validation_base: Url,
    client: C,
}

impl<C: HttpClient> TicketVerifier<C> {
    pub fn new(config: VerifierConfig, client: C) -> Result<Self> {
        validate_url("cas.validation_url", &config.validation_url)?;
        validate_namespace_prefix("cas.prefix", &config.prefix)?;

        let validation_base =
            Url::parse(&config.validation_url).map_err(|e| CasError::InvalidConfigValueError {
                field: "cas.validation_url".to_string(),
                value: config.validation_url.clone(),
                reason: format!("Invalid URL format: {}", e),
            })?;

        Ok(Self {
            config,
            validation_base,
            client,
        })
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub async fn verify(&self, ticket: &str, request: Option<&RequestContext>) -> Result<String> {
        self.verify_identity(ticket, request)
            .await
            .map(|identity| identity.user)
    }

    /// 透過 accessor 取得目前的 request 後驗證
    pub async fn verify_current<A>(&self, ticket: &str, accessor: &A) -> Result<String>
    where
        A: RequestAccessor + ?Sized,
    {
        let request = accessor.current_request();
        self.verify(ticket, request.as_ref()).await
    }

    /// 呼叫端指定的期限；逾時會中斷對外請求並以傳輸錯誤回報
    pub async fn verify_within(
        &self,
        ticket: &str,
        request: Option<&RequestContext>,
        deadline: Duration,
    ) -> Result<String> {
        match tokio::time::timeout(deadline, self.verify(ticket, request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("CAS validation exceeded deadline of {:?}", deadline);
                Err(TransportError::Timeout(deadline).into())
            }
        }
    }

    pub async fn verify_identity(
        &self,
        ticket: &str,
        request: Option<&RequestContext>,
    ) -> Result<CasIdentity> {
        let validation = self.validation_request(request)?;

        if validation.ticket != ticket {
            tracing::debug!("Ticket argument differs from the request's ticket parameter; validating the request's ticket");
        }

        let url = self.validation_url(&validation);
        tracing::debug!(service = %validation.service_url, "Validating CAS ticket");

        let response = self.client.get(&url).await?;
        tracing::debug!("CAS response status: {}", response.status);

        if !(200..300).contains(&response.status) {
            return Err(TransportError::Status {
                status: response.status,
            }
            .into());
        }

        match parse_response(&response.body, &self.config.prefix) {
            CasResponse::Success {
                user,
                proxy_granting_ticket,
            } => {
                tracing::info!(user = %user, "CAS ticket validated");
                Ok(CasIdentity {
                    user,
                    proxy_granting_ticket,
                })
            }
            CasResponse::Failure { code, reason } => {
                tracing::warn!(
                    code = code.as_deref().unwrap_or("-"),
                    "CAS rejected ticket: {}",
                    reason
                );
                Err(CasError::AuthenticationFailure { code, reason })
            }
            CasResponse::Malformed => {
                tracing::warn!(
                    prefix = %self.config.prefix,
                    "CAS response contained neither authenticationSuccess nor authenticationFailure"
                );
                Err(CasError::InvalidResponse)
            }
        }
    }

    pub fn validation_request(&self, request: Option<&RequestContext>) -> Result<ValidationRequest> {
        let request = request.ok_or(CasError::MissingRequestContext)?;
        build_validation_request(request)
    }

    pub fn validation_url(&self, request: &ValidationRequest) -> Url {
        build_validation_url(&self.validation_base, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::HttpResponse;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const SUCCESS_BODY: &str = r#"
        <cas:serviceResponse xmlns:cas='http://www.yale.edu/tp/cas'>
            <cas:authenticationSuccess>
                <cas:user>lobster</cas:user>
                <cas:proxyGrantingTicket>PGTIOU-84678-8a9d</cas:proxyGrantingTicket>
            </cas:authenticationSuccess>
        </cas:serviceResponse>
    "#;

    #[derive(Clone)]
    struct MockClient {
        status: u16,
        body: String,
        delay: Option<Duration>,
        requests: Arc<Mutex<Vec<Url>>>,
    }

    impl MockClient {
        fn new(body: &str) -> Self {
            Self {
                status: 200,
                body: body.to_string(),
                delay: None,
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        async fn requests(&self) -> Vec<Url> {
            self.requests.lock().await.clone()
        }
    }

    #[async_trait]
    impl HttpClient for MockClient {
        async fn get(&self, url: &Url) -> std::result::Result<HttpResponse, TransportError> {
            self.requests.lock().await.push(url.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(HttpResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn verifier(client: MockClient) -> TicketVerifier<MockClient> {
        TicketVerifier::new(
            VerifierConfig::new("https://www.example.com/cas"),
            client,
        )
        .unwrap()
    }

    fn request_with_ticket(ticket: &str) -> RequestContext {
        RequestContext::new("http", "localhost", "", "/").with_query_param("ticket", ticket)
    }

    #[tokio::test]
    async fn test_verify_returns_user() {
        let client = MockClient::new(SUCCESS_BODY);
        let verifier = verifier(client.clone());
        let request = request_with_ticket("PGTIOU-84678-8a9d");

        let user = verifier
            .verify("PGTIOU-84678-8a9d", Some(&request))
            .await
            .unwrap();

        assert_eq!(user, "lobster");
        let requests = client.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].as_str(),
            "https://www.example.com/cas?ticket=PGTIOU-84678-8a9d&service=http%3A%2F%2Flocalhost%2F"
        );
    }

    #[tokio::test]
    async fn test_query_ticket_drives_request_not_argument() {
        let client = MockClient::new(SUCCESS_BODY);
        let verifier = verifier(client.clone());
        let request = request_with_ticket("ST-1856339");

        let user = verifier
            .verify("should-not-work", Some(&request))
            .await
            .unwrap();

        assert_eq!(user, "lobster");
        let requests = client.requests().await;
        let ticket = requests[0]
            .query_pairs()
            .find(|(k, _)| k == "ticket")
            .map(|(_, v)| v.into_owned());
        assert_eq!(ticket.as_deref(), Some("ST-1856339"));
    }

    #[tokio::test]
    async fn test_verify_identity_includes_pgt_iou() {
        let verifier = verifier(MockClient::new(SUCCESS_BODY));
        let request = request_with_ticket("ST-1");

        let identity = verifier.verify_identity("ST-1", Some(&request)).await.unwrap();
        assert_eq!(identity.user, "lobster");
        assert_eq!(
            identity.proxy_granting_ticket.as_deref(),
            Some("PGTIOU-84678-8a9d")
        );
    }

    #[tokio::test]
    async fn test_missing_request_context_is_environment_error() {
        let client = MockClient::new(SUCCESS_BODY);
        let verifier = verifier(client.clone());

        let err = verifier.verify("ST-1", None).await.unwrap_err();
        assert!(matches!(err, CasError::MissingRequestContext));
        assert!(!err.is_verification_failure());
        assert!(client.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_no_ticket_makes_no_request() {
        let client = MockClient::new(SUCCESS_BODY);
        let verifier = verifier(client.clone());
        let request = RequestContext::new("http", "localhost", "", "/");

        let err = verifier.verify("ST-1", Some(&request)).await.unwrap_err();
        assert!(matches!(err, CasError::NoTicket));
        assert!(client.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let mut client = MockClient::new(SUCCESS_BODY);
        client.status = 500;
        let verifier = verifier(client);
        let request = request_with_ticket("ST-1");

        let err = verifier.verify("ST-1", Some(&request)).await.unwrap_err();
        assert!(matches!(
            err,
            CasError::Transport(TransportError::Status { status: 500 })
        ));
    }

    #[tokio::test]
    async fn test_prefix_mismatch_is_invalid_response() {
        let verifier = TicketVerifier::new(
            VerifierConfig::new("https://www.example.com/cas").with_prefix("invalid-one"),
            MockClient::new(SUCCESS_BODY),
        )
        .unwrap();
        let request = request_with_ticket("ST-1");

        let err = verifier.verify("ST-1", Some(&request)).await.unwrap_err();
        assert!(matches!(err, CasError::InvalidResponse));
    }

    #[tokio::test]
    async fn test_verify_current_uses_accessor() {
        let verifier = verifier(MockClient::new(SUCCESS_BODY));

        let accessor = Some(request_with_ticket("ST-1"));
        assert_eq!(verifier.verify_current("ST-1", &accessor).await.unwrap(), "lobster");

        let outside: Option<RequestContext> = None;
        assert!(matches!(
            verifier.verify_current("ST-1", &outside).await,
            Err(CasError::MissingRequestContext)
        ));
    }

    #[tokio::test]
    async fn test_verify_within_deadline() {
        let mut client = MockClient::new(SUCCESS_BODY);
        client.delay = Some(Duration::from_millis(200));
        let verifier = verifier(client);
        let request = request_with_ticket("ST-1");

        let err = verifier
            .verify_within("ST-1", Some(&request), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, CasError::Transport(TransportError::Timeout(_))));

        let user = verifier
            .verify_within("ST-1", Some(&request), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(user, "lobster");
    }

    #[tokio::test]
    async fn test_shared_client_behind_arc() {
        let client = Arc::new(MockClient::new(SUCCESS_BODY));
        let verifier = TicketVerifier::new(
            VerifierConfig::new("https://www.example.com/cas"),
            client.clone(),
        )
        .unwrap();
        let request = request_with_ticket("ST-1");

        assert_eq!(verifier.verify("ST-1", Some(&request)).await.unwrap(), "lobster");
        assert_eq!(client.requests().await.len(), 1);
    }

    #[test]
    fn test_validation_url_for_request() {
        let verifier = verifier(MockClient::new(SUCCESS_BODY));
        let request = request_with_ticket("ST-7").with_query_param("foo", "bar");

        let validation = verifier.validation_request(Some(&request)).unwrap();
        let url: Url = verifier.validation_url(&validation);
        assert_eq!(
            url.as_str(),
            "https://www.example.com/cas?ticket=ST-7&service=http%3A%2F%2Flocalhost%2F%3Ffoo%3Dbar"
        );
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let result = TicketVerifier::new(
            VerifierConfig::new("not a url"),
            MockClient::new(SUCCESS_BODY),
        );
        assert!(matches!(
            result,
            Err(CasError::InvalidConfigValueError { .. })
        ));

        let result = TicketVerifier::new(
            VerifierConfig::new("https://www.example.com/cas").with_prefix(""),
            MockClient::new(SUCCESS_BODY),
        );
        assert!(result.is_err());
    }
}
