use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
    response::Redirect,
};
use url::Url;

/// A redirect target is safe when it resolves, relative to the requesting
/// host, to an http(s) URL on that same host.
pub fn is_safe_url(host: &str, target: &str) -> bool {
    let base = match Url::parse(&format!("http://{}/", host)) {
        Ok(base) => base,
        Err(_) => return false,
    };
    let test = match base.join(target) {
        Ok(test) => test,
        Err(_) => return false,
    };
    matches!(test.scheme(), "http" | "https")
        && test.host_str() == base.host_str()
        && test.port() == base.port()
}

/// Where to send the client after a mutation: the `next` query parameter,
/// then the Referer, then a caller-supplied default. Unsafe candidates are
/// skipped without error.
#[derive(Debug, Default, Clone)]
pub struct RedirectBack {
    host: Option<String>,
    next: Option<String>,
    referrer: Option<String>,
}

impl RedirectBack {
    pub fn target(&self, default: &str) -> String {
        let host = match &self.host {
            Some(host) => host,
            None => return default.to_string(),
        };
        [&self.next, &self.referrer]
            .into_iter()
            .flatten()
            .find(|candidate| !candidate.is_empty() && is_safe_url(host, candidate))
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn to(&self, default: &str) -> Redirect {
        Redirect::to(&self.target(default))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RedirectBack
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let header_value = |name| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let next = parts.uri.query().and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "next")
                .map(|(_, value)| value.into_owned())
        });
        Ok(RedirectBack {
            host: header_value(header::HOST),
            next,
            referrer: header_value(header::REFERER),
        })
    }
}
