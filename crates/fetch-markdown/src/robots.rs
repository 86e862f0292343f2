//! Robots policy gate
//!
//! Fetches and evaluates a site's `/robots.txt` before the real request
//! is made. The directive matcher is a standalone component with no
//! knowledge of HTTP, so policy decisions are unit-testable offline:
//! [`RobotsPolicy::parse`] builds the directive set and
//! [`RobotsPolicy::allows`] answers path queries per user-agent.
//!
//! A 401/403 on robots.txt is an explicit deny; any other 4xx means the
//! site publishes no policy and the fetch is allowed. Transport
//! failures are fatal: without a policy decision the fetch must not
//! proceed.

use crate::error::Error;
use tracing::debug;
use url::Url;

/// One Allow/Disallow rule inside a user-agent group
#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    pattern: String,
}

/// Rules grouped under one or more User-agent lines
#[derive(Debug, Clone, Default)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
}

/// Parsed robots.txt directive set
///
/// Built fresh for every robots.txt fetch; never cached across
/// requests.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    groups: Vec<Group>,
}

impl RobotsPolicy {
    /// Parse robots.txt content into a directive set
    ///
    /// Comment lines and trailing comments are stripped. Rules that
    /// appear before any `User-agent` line are ignored, as are empty
    /// `Disallow:` values (which mean "allow everything").
    pub fn parse(content: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut current: Option<Group> = None;
        // A User-agent line directly after another extends the same group
        let mut last_was_agent = false;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !last_was_agent {
                        if let Some(done) = current.take() {
                            groups.push(done);
                        }
                        current = Some(Group::default());
                    }
                    if let Some(group) = current.as_mut() {
                        group.agents.push(value.to_ascii_lowercase());
                    }
                    last_was_agent = true;
                }
                "allow" | "disallow" => {
                    last_was_agent = false;
                    if value.is_empty() {
                        continue;
                    }
                    if let Some(group) = current.as_mut() {
                        group.rules.push(Rule {
                            allow: key == "allow",
                            pattern: value.to_string(),
                        });
                    }
                }
                _ => {
                    // crawl-delay, sitemap and friends are irrelevant here
                    last_was_agent = false;
                }
            }
        }
        if let Some(done) = current.take() {
            groups.push(done);
        }

        RobotsPolicy { groups }
    }

    /// Whether the given path may be fetched by the given user-agent
    ///
    /// Longest-match precedence: the rule with the longest matching
    /// pattern wins, Allow winning ties. No matching rule means allow.
    pub fn allows(&self, path: &str, user_agent: &str) -> bool {
        let ua = user_agent.to_ascii_lowercase();

        // The applicable group is the one with the longest agent token
        // contained in the user-agent string; `*` is the fallback.
        let mut best_len: Option<usize> = None;
        let mut rules: &[Rule] = &[];
        for group in &self.groups {
            for agent in &group.agents {
                let matched = if agent == "*" {
                    Some(0)
                } else if ua.contains(agent.as_str()) || user_agent == "*" {
                    Some(agent.len())
                } else {
                    None
                };
                if let Some(len) = matched {
                    if best_len.is_none() || len > best_len.unwrap() {
                        best_len = Some(len);
                        rules = &group.rules;
                    }
                }
            }
        }

        let mut verdict = true;
        let mut verdict_len = 0usize;
        for rule in rules {
            if pattern_matches(&rule.pattern, path) {
                let len = rule.pattern.len();
                if len > verdict_len || (len == verdict_len && rule.allow && !verdict) {
                    verdict = rule.allow;
                    verdict_len = len;
                }
            }
        }
        verdict
    }
}

/// Match a robots path pattern against a path
///
/// `*` matches any character run; `$` anchors the pattern to the end of
/// the path when it is the final character. A pattern that is fully
/// consumed without an anchor is a prefix match.
///
/// robots.txt is untrusted input, so matching must stay linear: on a
/// mismatch the scan resumes after the most recent `*` instead of
/// recursing, bounding the work at O(pattern * path) no matter how many
/// wildcards the pattern stacks.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(stripped) => (stripped, true),
        None => (pattern, false),
    };
    let pat = pattern.as_bytes();
    let path = path.as_bytes();

    let mut p = 0usize;
    let mut s = 0usize;
    // Most recent `*` and the path position its run has consumed up to
    let mut star: Option<(usize, usize)> = None;
    loop {
        if !anchored && p == pat.len() {
            return true;
        }
        if s == path.len() {
            break;
        }
        if p < pat.len() && pat[p] == b'*' {
            star = Some((p, s));
            p += 1;
        } else if p < pat.len() && pat[p] == path[s] {
            p += 1;
            s += 1;
        } else if let Some((star_p, star_s)) = star {
            p = star_p + 1;
            s = star_s + 1;
            star = Some((star_p, s));
        } else {
            return false;
        }
    }
    while p < pat.len() && pat[p] == b'*' {
        p += 1;
    }
    p == pat.len()
}

/// robots.txt location for a target URL: same scheme and host, path
/// replaced with `/robots.txt`, query and fragment dropped
pub fn robots_txt_url(url: &Url) -> Url {
    let mut robots = url.clone();
    robots.set_path("/robots.txt");
    robots.set_query(None);
    robots.set_fragment(None);
    robots
}

/// Check the site's crawling policy for a target URL
///
/// Fetches robots.txt with the same client (and therefore the same
/// User-Agent header) as the real request would use.
pub async fn check_may_fetch(
    client: &reqwest::Client,
    url: &Url,
    user_agent: &str,
) -> Result<(), Error> {
    let robots_url = robots_txt_url(url);
    debug!(%robots_url, "checking robots policy");

    let response = client
        .get(robots_url.clone())
        .send()
        .await
        .map_err(|e| Error::transport(robots_url.as_str(), e))?;

    let status = response.status().as_u16();
    if status == 401 || status == 403 {
        return Err(Error::PolicyDenied(
            "robots.txt forbids autonomous fetching for this user agent".to_string(),
        ));
    }
    if (400..500).contains(&status) {
        // No robots file published, fetching is unrestricted
        debug!(status, "robots.txt absent, allowing fetch");
        return Ok(());
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::transport(robots_url.as_str(), e))?;

    let policy = RobotsPolicy::parse(&body);
    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    if !policy.allows(&path, user_agent) {
        return Err(Error::PolicyDenied(
            "robots.txt disallows fetching this page for the configured user-agent".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robots_txt_url_derivation() {
        let url = Url::parse("https://example.com/some/deep/page.html?q=1#frag").unwrap();
        assert_eq!(
            robots_txt_url(&url).as_str(),
            "https://example.com/robots.txt"
        );

        let url = Url::parse("http://example.com:8080/page").unwrap();
        assert_eq!(
            robots_txt_url(&url).as_str(),
            "http://example.com:8080/robots.txt"
        );
    }

    #[test]
    fn test_simple_disallow() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow: /private/");
        assert!(!policy.allows("/private/page", "*"));
        assert!(!policy.allows("/private/", "anybot/1.0"));
        assert!(policy.allows("/public/page", "*"));
        assert!(policy.allows("/", "anybot/1.0"));
    }

    #[test]
    fn test_empty_disallow_allows_everything() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow:");
        assert!(policy.allows("/anything", "bot"));
    }

    #[test]
    fn test_comment_lines_stripped() {
        let policy = RobotsPolicy::parse(
            "# full line comment\nUser-agent: * # trailing comment\nDisallow: /secret # hidden",
        );
        assert!(!policy.allows("/secret/x", "bot"));
        assert!(policy.allows("/open", "bot"));
    }

    #[test]
    fn test_longest_match_allow_wins() {
        let policy =
            RobotsPolicy::parse("User-agent: *\nDisallow: /dir/\nAllow: /dir/public/");
        assert!(!policy.allows("/dir/hidden", "bot"));
        assert!(policy.allows("/dir/public/page", "bot"));
    }

    #[test]
    fn test_allow_wins_ties() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow: /a/\nAllow: /a/b");
        // "/a/b" (4) beats "/a/" (3)
        assert!(policy.allows("/a/b", "bot"));
    }

    #[test]
    fn test_wildcard_patterns() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow: /*.json");
        assert!(!policy.allows("/data/export.json", "bot"));
        assert!(policy.allows("/data/export.html", "bot"));
    }

    #[test]
    fn test_end_anchor() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow: /exact$");
        assert!(!policy.allows("/exact", "bot"));
        assert!(policy.allows("/exactly", "bot"));
    }

    #[test]
    fn test_agent_group_selection() {
        let robots = "User-agent: specialbot\nDisallow: /\n\nUser-agent: *\nDisallow: /private/";
        let policy = RobotsPolicy::parse(robots);
        assert!(!policy.allows("/anything", "SpecialBot/2.1"));
        assert!(policy.allows("/anything", "otherbot"));
        assert!(!policy.allows("/private/x", "otherbot"));
    }

    #[test]
    fn test_stacked_user_agent_lines_share_rules() {
        let robots = "User-agent: alpha\nUser-agent: beta\nDisallow: /x/";
        let policy = RobotsPolicy::parse(robots);
        assert!(!policy.allows("/x/1", "alpha/1.0"));
        assert!(!policy.allows("/x/1", "beta/1.0"));
        assert!(policy.allows("/x/1", "gamma/1.0"));
    }

    #[test]
    fn test_rules_before_any_group_ignored() {
        let policy = RobotsPolicy::parse("Disallow: /\nUser-agent: *\nDisallow: /private/");
        assert!(policy.allows("/page", "bot"));
        assert!(!policy.allows("/private/page", "bot"));
    }

    #[test]
    fn test_query_string_patterns() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow: /*?preview=");
        assert!(!policy.allows("/article?preview=1", "bot"));
        assert!(policy.allows("/article", "bot"));
    }

    #[test]
    fn test_empty_robots_allows_all() {
        let policy = RobotsPolicy::parse("");
        assert!(policy.allows("/anything", "bot"));
    }

    #[test]
    fn test_pattern_matcher() {
        assert!(pattern_matches("/a", "/a/b"));
        assert!(pattern_matches("/a/*/c", "/a/b/c"));
        assert!(pattern_matches("/a$", "/a"));
        assert!(!pattern_matches("/a$", "/a/b"));
        assert!(pattern_matches("/*.php$", "/index.php"));
        assert!(!pattern_matches("/*.php$", "/index.php5"));
        assert!(!pattern_matches("/b", "/a/b"));
    }

    #[test]
    fn test_wildcard_heavy_pattern_matches_in_linear_time() {
        // Stacked wildcards against a long non-matching path must not
        // blow up into backtracking search
        let pattern = format!("/{}b", "*a".repeat(14));
        let path = format!("/{}", "a".repeat(40));
        assert!(!pattern_matches(&pattern, &path));

        let matching = format!("/{}b", "a".repeat(40));
        assert!(pattern_matches(&pattern, &matching));

        let policy = RobotsPolicy::parse(&format!("User-agent: *\nDisallow: {}", pattern));
        assert!(policy.allows(&path, "anybot"));
        assert!(!policy.allows(&matching, "anybot"));
    }
}
