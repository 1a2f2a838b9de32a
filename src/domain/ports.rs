use crate::domain::model::{HttpResponse, RequestContext};
use crate::utils::error::TransportError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// 對 CAS 伺服器發出單一 GET 請求的能力
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        (**self).get(url).await
    }
}

/// 取得目前 inbound request；在 request 範圍之外呼叫時回傳 `None`
pub trait RequestAccessor: Send + Sync {
    fn current_request(&self) -> Option<RequestContext>;
}

impl RequestAccessor for Option<RequestContext> {
    fn current_request(&self) -> Option<RequestContext> {
        self.clone()
    }
}

pub trait ConfigProvider: Send + Sync {
    fn validation_url(&self) -> Option<&str>;
    fn prefix(&self) -> &str;
    fn timeout(&self) -> Option<Duration>;
}
