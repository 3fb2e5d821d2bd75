//! Parse robots.txt files and answer allow/deny questions for the crawler.

use crate::acquisition::PageFetcher;
use crate::error::{FetchError, HarvestError};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Parsed robots.txt rules for one user agent.
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    pub allowed: Vec<String>,
    pub disallowed: Vec<String>,
    pub crawl_delay: Option<f32>,
    pub sitemaps: Vec<String>,
}

impl RobotsRules {
    /// Check if a path (with query) is allowed by the robots rules.
    pub fn is_allowed(&self, path: &str) -> bool {
        let longest_disallow = longest_match(&self.disallowed, path);
        let longest_allow = longest_match(&self.allowed, path);

        match (longest_allow, longest_disallow) {
            // Longer match wins, Allow on ties
            (Some(allow), Some(disallow)) => allow >= disallow,
            (None, Some(_)) => false,
            _ => true,
        }
    }
}

fn longest_match(patterns: &[String], path: &str) -> Option<usize> {
    patterns
        .iter()
        .filter(|p| path_matches(path, p))
        .map(|p| p.len())
        .max()
}

#[derive(Default)]
struct Group {
    agents: Vec<String>,
    rules: RobotsRules,
}

/// Parse a robots.txt string for a specific user agent.
///
/// A group naming the agent's product token (the part before `/`) wins over
/// the `*` group. Sitemap directives are global.
pub fn parse_robots(txt: &str, user_agent: &str) -> RobotsRules {
    let token = user_agent
        .split('/')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    let mut groups: Vec<Group> = Vec::new();
    let mut sitemaps = Vec::new();
    // Consecutive User-agent lines share one group
    let mut collecting_agents = false;

    for line in txt.lines() {
        // Remove comments
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                if !collecting_agents {
                    groups.push(Group::default());
                    collecting_agents = true;
                }
                if let Some(group) = groups.last_mut() {
                    group.agents.push(value.to_lowercase());
                }
            }
            "sitemap" => {
                if !value.is_empty() {
                    sitemaps.push(value.to_string());
                }
            }
            _ => {
                collecting_agents = false;
                let Some(group) = groups.last_mut() else {
                    continue;
                };
                match key.as_str() {
                    "allow" if !value.is_empty() => group.rules.allowed.push(value.to_string()),
                    "disallow" if !value.is_empty() => {
                        group.rules.disallowed.push(value.to_string())
                    }
                    "crawl-delay" => {
                        if let Ok(delay) = value.parse::<f32>() {
                            group.rules.crawl_delay = Some(delay);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    let specific = groups.iter().position(|g| {
        g.agents
            .iter()
            .any(|a| a != "*" && !token.is_empty() && token.contains(a.as_str()))
    });
    let wildcard = groups.iter().position(|g| g.agents.iter().any(|a| a == "*"));

    let mut rules = specific
        .or(wildcard)
        .map(|i| std::mem::take(&mut groups[i].rules))
        .unwrap_or_default();
    rules.sitemaps = sitemaps;
    rules
}

/// Check if a path matches a robots.txt pattern (`*` wildcards, `$` anchor).
fn path_matches(path: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }

    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };

    let mut pieces = pattern.split('*');
    let first = pieces.next().unwrap_or("");
    let Some(mut rest) = path.strip_prefix(first) else {
        return false;
    };

    let pieces: Vec<&str> = pieces.collect();
    for (i, piece) in pieces.iter().enumerate() {
        let is_last = i + 1 == pieces.len();
        if piece.is_empty() {
            if is_last && anchored {
                return true;
            }
            continue;
        }
        if is_last && anchored {
            return rest.ends_with(piece);
        }
        match rest.find(piece) {
            Some(pos) => rest = &rest[pos + piece.len()..],
            None => return false,
        }
    }

    if anchored && pieces.is_empty() {
        return rest.is_empty();
    }
    true
}

#[derive(Debug, Clone)]
enum PolicyState {
    Rules(RobotsRules),
    AllowAll,
    DisallowAll,
}

/// Crawl policy for one site and agent, loaded from its robots.txt.
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    state: PolicyState,
}

impl RobotsPolicy {
    /// Build a policy from already-fetched robots.txt text.
    pub fn from_text(txt: &str, user_agent: &str) -> Self {
        Self {
            state: PolicyState::Rules(parse_robots(txt, user_agent)),
        }
    }

    /// Fetch and parse `<origin>/robots.txt` for `base_url`.
    ///
    /// 401/403 deny everything, other 4xx statuses allow everything. Server
    /// errors and transport failures deny everything.
    pub async fn load(fetcher: &dyn PageFetcher, base_url: &str) -> Result<Self, HarvestError> {
        let robots_url = robots_url(base_url)?;
        info!("checking {robots_url} for user-agent {}", fetcher.user_agent());

        let state = match fetcher.fetch(&robots_url).await {
            Ok(txt) => PolicyState::Rules(parse_robots(&txt, fetcher.user_agent())),
            Err(FetchError::Status(401 | 403)) => {
                warn!("robots.txt access denied, treating site as disallowed");
                PolicyState::DisallowAll
            }
            Err(FetchError::Status(code @ 400..=499)) => {
                info!("no robots.txt (HTTP {code}), all paths allowed");
                PolicyState::AllowAll
            }
            Err(FetchError::Status(code)) => {
                warn!("robots.txt returned HTTP {code}, treating site as disallowed");
                PolicyState::DisallowAll
            }
            Err(e) => {
                warn!("could not fetch robots.txt: {e}");
                PolicyState::DisallowAll
            }
        };

        Ok(Self { state })
    }

    /// May `url` be fetched?
    pub fn allows(&self, url: &str) -> bool {
        match &self.state {
            PolicyState::AllowAll => true,
            PolicyState::DisallowAll => false,
            PolicyState::Rules(rules) => rules.is_allowed(&path_and_query(url)),
        }
    }

    /// The Crawl-delay directive for this agent, if any.
    pub fn crawl_delay(&self) -> Option<Duration> {
        match &self.state {
            PolicyState::Rules(rules) => rules
                .crawl_delay
                .filter(|d| d.is_finite() && *d >= 0.0)
                .map(Duration::from_secs_f32),
            _ => None,
        }
    }
}

/// `<scheme>://<host>[:port]/robots.txt` for a page url.
pub fn robots_url(base_url: &str) -> Result<String, HarvestError> {
    let parsed = Url::parse(base_url).map_err(|e| HarvestError::Url {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    let mut robots = parsed;
    robots.set_path("/robots.txt");
    robots.set_query(None);
    robots.set_fragment(None);
    Ok(robots.to_string())
}

fn path_and_query(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(q) => format!("{}?{q}", parsed.path()),
            None => parsed.path().to_string(),
        },
        // Already a path
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_robots() {
        let txt = r#"
User-agent: *
Allow: /
Disallow: /admin
Disallow: /private/
Crawl-delay: 1.5

Sitemap: https://example.com/sitemap.xml
Sitemap: https://example.com/sitemap-blog.xml
"#;

        let rules = parse_robots(txt, "gradcafe-harvest/0.1");
        assert_eq!(rules.allowed.len(), 1);
        assert_eq!(rules.disallowed.len(), 2);
        assert_eq!(rules.crawl_delay, Some(1.5));
        assert_eq!(rules.sitemaps.len(), 2);

        assert!(rules.is_allowed("/"));
        assert!(rules.is_allowed("/about"));
        assert!(!rules.is_allowed("/admin"));
        assert!(!rules.is_allowed("/admin/settings"));
        assert!(!rules.is_allowed("/private/data"));
    }

    #[test]
    fn test_allow_overrides_disallow() {
        let txt = r#"
User-agent: *
Disallow: /api/
Allow: /api/public/
"#;
        let rules = parse_robots(txt, "gradcafe-harvest");
        assert!(!rules.is_allowed("/api/secret"));
        assert!(rules.is_allowed("/api/public/docs"));
    }

    #[test]
    fn test_specific_agent_group_wins() {
        let txt = r#"
User-agent: *
Disallow: /

User-agent: BadBot
User-agent: gradcafe-harvest
Disallow: /survey/?page=3
Crawl-delay: 2
"#;
        let rules = parse_robots(txt, "gradcafe-harvest/0.1");
        assert!(rules.is_allowed("/survey/"));
        assert!(!rules.is_allowed("/survey/?page=3"));
        assert_eq!(rules.crawl_delay, Some(2.0));

        let other = parse_robots(txt, "SomeoneElse/2.0");
        assert!(!other.is_allowed("/survey/"));
        assert_eq!(other.crawl_delay, None);
    }

    #[test]
    fn test_wildcards_and_anchor() {
        assert!(path_matches("/survey/?page=4", "/*?page="));
        assert!(path_matches("/files/report.pdf", "/*.pdf$"));
        assert!(!path_matches("/files/report.pdf?x=1", "/*.pdf$"));
        assert!(path_matches("/exact", "/exact$"));
        assert!(!path_matches("/exact/more", "/exact$"));
        assert!(!path_matches("/other", "/survey"));
    }

    #[test]
    fn test_policy_checks_query_string() {
        let policy = RobotsPolicy::from_text("User-agent: *\nDisallow: /survey/?page=2\n", "x");
        assert!(policy.allows("https://www.thegradcafe.com/survey/"));
        assert!(!policy.allows("https://www.thegradcafe.com/survey/?page=2"));
        assert!(policy.allows("https://www.thegradcafe.com/survey/?page=3"));
        assert_eq!(policy.crawl_delay(), None);
    }

    #[test]
    fn test_robots_url() {
        assert_eq!(
            robots_url("https://www.thegradcafe.com/survey/?page=2").unwrap(),
            "https://www.thegradcafe.com/robots.txt"
        );
        assert_eq!(
            robots_url("http://127.0.0.1:8080/survey/").unwrap(),
            "http://127.0.0.1:8080/robots.txt"
        );
        assert!(robots_url("not a url").is_err());
    }

    struct StatusFetcher(u16);

    #[async_trait::async_trait]
    impl PageFetcher for StatusFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            Err(FetchError::Status(self.0))
        }

        fn user_agent(&self) -> &str {
            "harvest-test/1.0"
        }
    }

    #[tokio::test]
    async fn test_load_maps_error_statuses() {
        let page = "https://site.test/survey/";
        for (status, allowed) in [(404, true), (410, true), (401, false), (403, false)] {
            let policy = RobotsPolicy::load(&StatusFetcher(status), page).await.unwrap();
            assert_eq!(policy.allows(page), allowed, "HTTP {status}");
        }
        for status in [500, 502, 503] {
            let policy = RobotsPolicy::load(&StatusFetcher(status), page).await.unwrap();
            assert!(!policy.allows(page), "HTTP {status}");
        }
    }
}
