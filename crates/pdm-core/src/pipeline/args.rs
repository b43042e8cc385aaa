//! Downloader argument list: profile args, option args, then the URL.

use crate::config::{DownloadOption, DownloadProfile};

/// Replaced by the sanitized URL host in profile and option args.
pub const HOST_PLACEHOLDER: &str = "%PDM_HOST%";
/// Replaced by the sanitized URL path in profile and option args.
pub const PATH_PLACEHOLDER: &str = "%PDM_PATH%";
/// Jobs whose domain contains this run without the URL argument.
pub const SENTINEL_DOMAIN: &str = "example.org";

const NAME_MAX: usize = 255;

/// Values substituted for the placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    pub host: String,
    pub path: String,
}

impl Substitutions {
    pub fn from_url(url: &str) -> Self {
        match url::Url::parse(url) {
            Ok(parsed) => Self {
                host: sanitize_component(parsed.host_str().unwrap_or_default()),
                path: sanitize_component(parsed.path()),
            },
            Err(_) => Self::default(),
        }
    }

    pub fn apply(&self, arg: &str) -> String {
        arg.replace(HOST_PLACEHOLDER, &self.host)
            .replace(PATH_PLACEHOLDER, &self.path)
    }
}

/// Make a URL fragment usable as a single path component.
///
/// - Replaces NUL, `/`, `\`, whitespace and control characters with `_`
/// - Collapses runs of `_` and trims `_`, `.` from both ends
/// - Limits length to 255 bytes
pub fn sanitize_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_sep = false;
    for c in raw.chars() {
        let sep = matches!(c, '\0' | '/' | '\\') || c.is_control() || c.is_whitespace();
        if sep || c == '_' {
            if !last_was_sep {
                out.push('_');
            }
            last_was_sep = true;
        } else {
            out.push(c);
            last_was_sep = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '_' || c == '.');
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

/// `example.org` or any subdomain of it.
pub fn is_sentinel_domain(domain: &str) -> bool {
    domain == SENTINEL_DOMAIN
        || domain
            .strip_suffix(SENTINEL_DOMAIN)
            .is_some_and(|rest| rest.ends_with('.'))
}

/// Full argument vector (without the program) for one job.
pub fn build_args(
    profile: &DownloadProfile,
    option: Option<&DownloadOption>,
    url: &str,
    domain: &str,
) -> Vec<String> {
    let subs = Substitutions::from_url(url);
    let option_args = option.map(|o| o.args.as_slice()).unwrap_or_default();
    let mut args: Vec<String> = profile
        .args
        .iter()
        .chain(option_args)
        .map(|a| subs.apply(a))
        .collect();
    if !url.is_empty() && !is_sentinel_domain(domain) {
        args.push(url.to_string());
    }
    args
}
