//! Deciding whether a result URL belongs to the tracked site.
//!
//! A URL matches when its hostname equals the target domain or is a strict
//! subdomain of it. There is no substring matching: `notexample.com` and
//! `example.com.evil.net` never match `example.com`.

use url::{Host, Url};

/// Extract the lower-cased hostname of `url`, or `None` if the URL does not
/// parse or has no host.
pub fn extract_hostname(url: &str) -> Option<String> {
  let parsed = Url::parse(url.trim()).ok()?;
  let host = parsed.host_str()?;
  let host = host.trim_end_matches('.').to_ascii_lowercase();
  (!host.is_empty()).then_some(host)
}

/// Returns `true` if `url` is hosted on `target_domain` or one of its
/// subdomains. Malformed URLs return `false`.
pub fn is_own_domain(url: &str, target_domain: &str) -> bool {
  DomainMatcher::new(target_domain).matches(url)
}

/// A pre-normalised target domain, reused across every entry of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainMatcher {
  target: String,
  suffix: String,
}

impl DomainMatcher {
  pub fn new(target_domain: &str) -> Self {
    let target = normalize_domain(target_domain);
    let suffix = format!(".{target}");
    Self { target, suffix }
  }

  pub fn target(&self) -> &str { &self.target }

  pub fn matches(&self, url: &str) -> bool {
    if self.target.is_empty() {
      return false;
    }
    match extract_hostname(url) {
      Some(host) => host == self.target || host.ends_with(&self.suffix),
      None => false,
    }
  }
}

/// Lower-case the domain and convert internationalised names to their ASCII
/// form, matching what [`Url`] produces for hostnames.
fn normalize_domain(domain: &str) -> String {
  let domain = domain.trim().trim_end_matches('.').to_lowercase();
  match Host::parse(&domain) {
    Ok(host) => host.to_string(),
    Err(_) => domain,
  }
}
