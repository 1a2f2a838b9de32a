use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_PREFIX: &str = "cas";
pub const TICKET_PARAMETER: &str = "ticket";

/// 驗證器在整個生命週期內不變的設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    pub validation_url: String,
    pub prefix: String,
    pub timeout: Option<Duration>,
}

impl VerifierConfig {
    pub fn new(validation_url: impl Into<String>) -> Self {
        Self {
            validation_url: validation_url.into(),
            prefix: DEFAULT_PREFIX.to_string(),
            timeout: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// The inbound HTTP request a ticket arrived on.
///
/// `host` carries the port when it is not the scheme default, and `query` keeps
/// the original parameter order so the rebuilt service URL matches what the
/// browser was redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub scheme: String,
    pub host: String,
    pub base_path: String,
    pub path_info: String,
    pub query: Vec<(String, String)>,
}

impl RequestContext {
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        base_path: impl Into<String>,
        path_info: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            base_path: base_path.into(),
            path_info: path_info.into(),
            query: Vec::new(),
        }
    }

    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// 由完整的 request URL 拆出各部分；`base_path` 是前端控制器的前綴（沒有就傳空字串）
    pub fn from_url(url: &Url, base_path: &str) -> Self {
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };

        let path = url.path();
        let base_path = base_path.trim_end_matches('/');
        let path_info = match path.strip_prefix(base_path) {
            Some(rest) if !base_path.is_empty() && (rest.is_empty() || rest.starts_with('/')) => {
                rest.to_string()
            }
            _ => path.to_string(),
        };
        let base_path = if path_info.len() == path.len() {
            String::new()
        } else {
            base_path.to_string()
        };

        Self {
            scheme: url.scheme().to_string(),
            host,
            base_path,
            path_info,
            query: url.query_pairs().into_owned().collect(),
        }
    }

    /// 同名參數以最後一個為準
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// 一次驗證用到的票證與 service URL，每次呼叫重新建立
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    pub ticket: String,
    pub service_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasResponse {
    Success {
        user: String,
        proxy_granting_ticket: Option<String>,
    },
    Failure {
        code: Option<String>,
        reason: String,
    },
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasIdentity {
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_granting_ticket: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}
