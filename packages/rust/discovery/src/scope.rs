//! Manual namespace checks.

use url::Url;

/// Determines which URLs belong to the manual.
///
/// A URL is in the namespace when it uses http(s), shares the base URL's
/// host and port, and its path starts with the namespace prefix.
#[derive(Debug, Clone)]
pub(crate) struct Namespace {
    host: String,
    port: Option<u16>,
    path_prefix: String,
}

impl Namespace {
    /// Build the namespace for `base`, using `prefix` if given, else the base path.
    pub(crate) fn new(base: &Url, prefix: Option<&str>) -> Self {
        let raw = prefix.unwrap_or_else(|| base.path());
        Self {
            host: base.host_str().unwrap_or("").to_string(),
            port: base.port_or_known_default(),
            path_prefix: normalize_prefix(raw),
        }
    }

    pub(crate) fn prefix(&self) -> &str {
        &self.path_prefix
    }

    pub(crate) fn contains(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        if url.host_str().unwrap_or("") != self.host || url.port_or_known_default() != self.port {
            return false;
        }

        url.path().starts_with(&self.path_prefix)
    }
}

/// Force a leading and trailing slash: `manual` → `/manual/`.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn prefix_derived_from_base_path() {
        let ns = Namespace::new(&url("https://example.org/manual"), None);
        assert_eq!(ns.prefix(), "/manual/");

        let ns = Namespace::new(&url("https://example.org/2/the-manual/"), None);
        assert_eq!(ns.prefix(), "/2/the-manual/");

        let ns = Namespace::new(&url("https://example.org"), None);
        assert_eq!(ns.prefix(), "/");
    }

    #[test]
    fn explicit_prefix_is_normalized() {
        let ns = Namespace::new(&url("https://example.org/a/b"), Some("docs"));
        assert_eq!(ns.prefix(), "/docs/");
    }

    #[test]
    fn path_prefix_filter() {
        let ns = Namespace::new(&url("https://example.org/manual"), None);
        assert!(ns.contains(&url("https://example.org/manual/intro")));
        assert!(!ns.contains(&url("https://example.org/intro")));
        assert!(!ns.contains(&url("https://example.org/manual")));
        assert!(!ns.contains(&url("https://example.org/manualextra/intro")));
    }

    #[test]
    fn host_and_port_must_match() {
        let ns = Namespace::new(&url("https://example.org/manual"), None);
        assert!(!ns.contains(&url("https://other.org/manual/intro")));
        assert!(!ns.contains(&url("https://example.org:8443/manual/intro")));
        assert!(ns.contains(&url("https://example.org:443/manual/intro")));
    }

    #[test]
    fn non_http_schemes_rejected() {
        let ns = Namespace::new(&url("https://example.org/manual"), None);
        assert!(!ns.contains(&url("ftp://example.org/manual/intro")));
    }
}
