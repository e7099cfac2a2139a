//! Domain normalization shared by the scanner and the preferences panel.
//!
//! Every domain that enters a list or gets compared against one goes through
//! these helpers, so membership checks can stay exact-match.

use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("url '{0}' has no host")]
    MissingHost(String),
}

/// Lowercases a host and strips leading `www.` labels.
///
/// A `www.` label is only dropped while a dotted name remains, so `www.com`
/// stays as it is and the result is a fixpoint.
pub fn normalize_host(host: &str) -> String {
    let mut host = host.trim().trim_end_matches('.').to_lowercase();
    while let Some(rest) = host.strip_prefix("www.") {
        if !rest.contains('.') {
            break;
        }
        host = rest.to_string();
    }
    host
}

/// Parses an absolute URL and returns its normalized domain.
pub fn normalize_url(input: &str) -> Result<String, NormalizeError> {
    let url = Url::parse(input.trim()).map_err(|source| NormalizeError::InvalidUrl {
        url: input.to_string(),
        source,
    })?;
    domain_of(&url, input)
}

/// Resolves an anchor `href` against the document base, the way a browser
/// computes `HTMLAnchorElement.href`, then normalizes the result.
pub fn resolve_link(href: &str, base: Option<&Url>) -> Result<String, NormalizeError> {
    let href = href.trim();
    let parsed = match base {
        Some(base) => base.join(href),
        None => Url::parse(href),
    };
    let url = parsed.map_err(|source| NormalizeError::InvalidUrl {
        url: href.to_string(),
        source,
    })?;
    domain_of(&url, href)
}

/// Normalizes user-typed input, which may be a bare host or a full URL.
///
/// Bare input goes through the same URL parser as scanned links, so ports
/// are dropped and internationalized names come out in punycode.
/// Returns `None` when nothing usable remains.
pub fn normalize_domain(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let domain = if input.contains("://") {
        normalize_url(input)
    } else {
        normalize_url(&format!("http://{input}"))
    };
    domain.ok().filter(|d| !d.is_empty())
}

fn domain_of(url: &Url, original: &str) -> Result<String, NormalizeError> {
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(normalize_host(host)),
        _ => Err(NormalizeError::MissingHost(original.to_string())),
    }
}
