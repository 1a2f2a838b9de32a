use crate::domain::model::{RequestContext, ValidationRequest, TICKET_PARAMETER};
use crate::utils::error::{CasError, Result};
use url::form_urlencoded;
use url::Url;

/// 從 inbound request 取出 ticket，並重建瀏覽器被導回的 service URL。
///
/// `ticket` 參數不會出現在 service URL 中：CAS 伺服器會用同一個 URL 比對票證。
pub fn build_validation_request(request: &RequestContext) -> Result<ValidationRequest> {
    let ticket = match request.query_param(TICKET_PARAMETER) {
        Some(ticket) if !ticket.is_empty() => ticket.to_string(),
        _ => return Err(CasError::NoTicket),
    };

    Ok(ValidationRequest {
        ticket,
        service_url: service_url(request),
    })
}

pub fn service_url(request: &RequestContext) -> String {
    let mut service = format!(
        "{}://{}{}{}",
        request.scheme, request.host, request.base_path, request.path_info
    );

    let remaining: Vec<&(String, String)> = request
        .query
        .iter()
        .filter(|(key, _)| key != TICKET_PARAMETER)
        .collect();

    if !remaining.is_empty() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(remaining.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();
        service.push('?');
        service.push_str(&query);
    }

    service
}

/// `{validation_url}?ticket=...&service=...`，兩個值都經過 URL 編碼
pub fn build_validation_url(base: &Url, request: &ValidationRequest) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair(TICKET_PARAMETER, &request.ticket)
        .append_pair("service", &request.service_url);
    url
}
