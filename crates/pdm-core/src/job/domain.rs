/// Bucket for URLs whose host cannot be determined.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Host part of `url`, used as the per-domain admission key.
///
/// Different paths and schemes on one host share a bucket; subdomains do not.
pub fn domain_of(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => UNKNOWN_DOMAIN.to_string(),
        },
        Err(e) => {
            tracing::debug!(url, "unparseable download url: {e}");
            UNKNOWN_DOMAIN.to_string()
        }
    }
}
