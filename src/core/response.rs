//! CAS v2 `serviceResponse` parsing.
//!
//! Elements are matched by their literal qualified name (`{prefix}:localName`),
//! so a response that uses a different prefix than the configured one yields
//! [`CasResponse::Malformed`] rather than being accepted.

use crate::domain::model::CasResponse;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const SUCCESS: &str = "authenticationSuccess";
const FAILURE: &str = "authenticationFailure";
const USER: &str = "user";
const PROXY_GRANTING_TICKET: &str = "proxyGrantingTicket";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    None,
    User,
    ProxyGrantingTicket,
}

struct Tags {
    success: String,
    failure: String,
    user: String,
    proxy_granting_ticket: String,
}

impl Tags {
    fn new(prefix: &str) -> Self {
        Self {
            success: qualified(prefix, SUCCESS),
            failure: qualified(prefix, FAILURE),
            user: qualified(prefix, USER),
            proxy_granting_ticket: qualified(prefix, PROXY_GRANTING_TICKET),
        }
    }
}

fn qualified(prefix: &str, local: &str) -> String {
    format!("{}:{}", prefix, local)
}

#[derive(Default)]
struct Scan {
    saw_root: bool,
    unclosed: bool,
    user_seen: bool,
    pgt_seen: bool,
    success: Option<(String, Option<String>)>,
    failure: Option<(Option<String>, String)>,
}

/// 解析 CAS 回應；任何解析錯誤都歸為 `Malformed`
///
/// Only the first `user` element counts and its text is trimmed; a missing or
/// blank user is `Malformed` rather than an empty identity.
pub fn parse_response(body: &str, prefix: &str) -> CasResponse {
    let scan = match scan_document(body, &Tags::new(prefix)) {
        Ok(scan) => scan,
        Err(e) => {
            tracing::debug!("CAS response is not well-formed XML: {}", e);
            return CasResponse::Malformed;
        }
    };

    if !scan.saw_root || scan.unclosed {
        tracing::debug!("CAS response has no complete root element");
        return CasResponse::Malformed;
    }

    if let Some((user, proxy_granting_ticket)) = scan.success {
        let user = user.trim();
        // 成功區塊裡沒有 user 不能當作成功
        if user.is_empty() {
            return CasResponse::Malformed;
        }
        return CasResponse::Success {
            user: user.to_string(),
            proxy_granting_ticket: proxy_granting_ticket
                .map(|pgt| pgt.trim().to_string())
                .filter(|pgt| !pgt.is_empty()),
        };
    }

    if let Some((code, reason)) = scan.failure {
        return CasResponse::Failure {
            code,
            reason: reason.trim().to_string(),
        };
    }

    CasResponse::Malformed
}

fn scan_document(body: &str, tags: &Tags) -> quick_xml::Result<Scan> {
    let mut reader = Reader::from_str(body);
    let mut result = Scan::default();

    let mut depth = 0usize;
    let mut section = Section::Outside;
    let mut capture = Capture::None;
    let mut user = String::new();
    let mut pgt: Option<String> = None;
    let mut reason = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                enter(&e, depth, tags, &mut result, &mut section, &mut capture);
            }
            Event::Empty(e) => {
                // 自閉合元素：進入後立刻離開
                enter(&e, depth + 1, tags, &mut result, &mut section, &mut capture);
                if depth + 1 == 2 {
                    close_section(&mut result, &mut section, &mut user, &mut pgt, &mut reason);
                } else if depth + 1 == 3 {
                    capture = Capture::None;
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                collect(&text, depth, section, capture, &mut user, &mut pgt, &mut reason);
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                let text = String::from_utf8_lossy(&raw);
                collect(&text, depth, section, capture, &mut user, &mut pgt, &mut reason);
            }
            Event::End(_) => {
                if depth == 3 {
                    capture = Capture::None;
                } else if depth == 2 {
                    close_section(&mut result, &mut section, &mut user, &mut pgt, &mut reason);
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    result.unclosed = depth != 0;
    Ok(result)
}

fn enter(
    e: &BytesStart<'_>,
    depth: usize,
    tags: &Tags,
    result: &mut Scan,
    section: &mut Section,
    capture: &mut Capture,
) {
    let name = e.name();
    let name = name.as_ref();

    match depth {
        1 => result.saw_root = true,
        // 只看 root 的直接子元素，且同類區塊只取第一個
        2 if name == tags.success.as_bytes() && result.success.is_none() => {
            *section = Section::Success;
        }
        2 if name == tags.failure.as_bytes() && result.failure.is_none() => {
            *section = Section::Failure;
            let code = e
                .try_get_attribute("code")
                .ok()
                .flatten()
                .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()));
            result.failure = Some((code, String::new()));
        }
        // 重複的 user 只取第一個，不能把多個值拼成一個身分
        3 if *section == Section::Success && name == tags.user.as_bytes() && !result.user_seen => {
            result.user_seen = true;
            *capture = Capture::User;
        }
        3 if *section == Section::Success
            && name == tags.proxy_granting_ticket.as_bytes()
            && !result.pgt_seen =>
        {
            result.pgt_seen = true;
            *capture = Capture::ProxyGrantingTicket;
        }
        _ => {}
    }
}

fn collect(
    text: &str,
    depth: usize,
    section: Section,
    capture: Capture,
    user: &mut String,
    pgt: &mut Option<String>,
    reason: &mut String,
) {
    match (section, depth, capture) {
        (Section::Failure, 2, _) => reason.push_str(text),
        (Section::Success, 3, Capture::User) => user.push_str(text),
        (Section::Success, 3, Capture::ProxyGrantingTicket) => {
            pgt.get_or_insert_with(String::new).push_str(text)
        }
        _ => {}
    }
}

fn close_section(
    result: &mut Scan,
    section: &mut Section,
    user: &mut String,
    pgt: &mut Option<String>,
    reason: &mut String,
) {
    match *section {
        Section::Success => {
            result.success = Some((std::mem::take(user), pgt.take()));
        }
        Section::Failure => {
            if let Some((_, text)) = result.failure.as_mut() {
                *text = std::mem::take(reason);
            }
        }
        Section::Outside => {}
    }
    *section = Section::Outside;
}
