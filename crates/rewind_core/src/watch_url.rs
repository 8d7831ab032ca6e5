use url::Url;

/// Decides whether a page URL identifies a specific playable item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchUrlRule {
    pub hosts: Vec<String>,
    pub path: String,
    pub id_param: String,
}

impl Default for WatchUrlRule {
    fn default() -> Self {
        Self {
            hosts: vec!["www.youtube.com".to_string()],
            path: "/watch".to_string(),
            id_param: "v".to_string(),
        }
    }
}

impl WatchUrlRule {
    /// Malformed URLs never qualify.
    pub fn matches(&self, raw: &str) -> bool {
        let Ok(url) = Url::parse(raw) else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        let host_ok = url
            .host_str()
            .is_some_and(|host| self.hosts.iter().any(|h| h.eq_ignore_ascii_case(host)));
        if !host_ok || url.path() != self.path {
            return false;
        }
        url.query_pairs()
            .any(|(key, value)| key == self.id_param.as_str() && !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_page_with_video_id_qualifies() {
        let rule = WatchUrlRule::default();
        assert!(rule.matches("https://www.youtube.com/watch?v=abc123"));
        assert!(rule.matches("https://www.youtube.com/watch?list=PL1&v=abc123&t=42"));
    }

    #[test]
    fn listing_and_foreign_pages_do_not_qualify() {
        let rule = WatchUrlRule::default();
        assert!(!rule.matches("https://www.youtube.com/"));
        assert!(!rule.matches("https://www.youtube.com/results?search_query=rust"));
        assert!(!rule.matches("https://www.youtube.com/watch"));
        assert!(!rule.matches("https://www.youtube.com/watch?v="));
        assert!(!rule.matches("https://m.youtube.com/watch?v=abc123"));
        assert!(!rule.matches("https://example.com/watch?v=abc123"));
        assert!(!rule.matches("not a url"));
        assert!(!rule.matches(""));
    }

    #[test]
    fn custom_hosts_are_honoured() {
        let rule = WatchUrlRule {
            hosts: vec!["m.youtube.com".to_string(), "www.youtube.com".to_string()],
            ..WatchUrlRule::default()
        };
        assert!(rule.matches("https://m.youtube.com/watch?v=abc123"));
    }
}
