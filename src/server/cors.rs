use std::collections::HashSet;

use actix_cors::Cors;
use log::debug;
use regex::Regex;

use crate::config::CorsSettings;

/// Which browser origins may call the API
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    any: bool,
    /// Open only because nothing was configured
    unconfigured: bool,
    exact: HashSet<String>,
    pattern: Option<Regex>,
}

impl OriginPolicy {
    pub fn from_settings(settings: &CorsSettings) -> Result<Self, regex::Error> {
        // Anchored so the pattern has to match the whole origin
        let pattern = settings
            .allowed_origin_regex
            .as_deref()
            .map(|p| Regex::new(&format!("^(?:{})$", p)))
            .transpose()?;

        let unconfigured = settings.allowed_origins.is_empty() && pattern.is_none();
        let any = unconfigured || settings.allowed_origins.iter().any(|o| o == "*");

        Ok(Self {
            any,
            unconfigured,
            exact: settings.allowed_origins.iter().map(|o| o.trim_end_matches('/').to_string()).collect(),
            pattern,
        })
    }

    pub fn allows_any(&self) -> bool {
        self.any
    }

    /// Any origin is allowed because the origin list is empty and no
    /// pattern is set, rather than through an explicit `"*"`
    pub fn is_unconfigured(&self) -> bool {
        self.unconfigured
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.any || self.exact.contains(origin) || self.pattern.as_ref().is_some_and(|re| re.is_match(origin))
    }
}

/// Build CORS middleware: listed or matching origins, any method and header
pub fn build_cors(policy: OriginPolicy, settings: &CorsSettings) -> Cors {
    let mut cors = if policy.allows_any() {
        debug!("CORS: Allowing any origin");
        Cors::default().allow_any_origin()
    } else {
        Cors::default().allowed_origin_fn(move |origin, _req_head| origin.to_str().is_ok_and(|o| policy.allows(o)))
    };

    cors = cors.allow_any_method().allow_any_header().max_age(settings.max_age);

    if settings.allow_credentials {
        cors = cors.supports_credentials();
    }

    cors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(origins: &[&str], regex: Option<&str>) -> CorsSettings {
        CorsSettings {
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            allowed_origin_regex: regex.map(String::from),
            ..CorsSettings::default()
        }
    }

    #[test]
    fn test_exact_origins() {
        let policy = OriginPolicy::from_settings(&settings(&["http://localhost:3000"], None)).unwrap();
        assert!(policy.allows("http://localhost:3000"));
        assert!(!policy.allows("http://localhost:3001"));
        assert!(!policy.allows_any());
    }

    #[test]
    fn test_wildcard_and_empty_allow_any() {
        let wildcard = OriginPolicy::from_settings(&settings(&["*"], None)).unwrap();
        assert!(wildcard.allows_any());
        assert!(!wildcard.is_unconfigured());

        let empty = OriginPolicy::from_settings(&settings(&[], None)).unwrap();
        assert!(empty.allows("https://anything.test"));
        assert!(empty.is_unconfigured());

        let listed = OriginPolicy::from_settings(&settings(&["http://localhost:3000"], None)).unwrap();
        assert!(!listed.is_unconfigured());
    }

    #[test]
    fn test_regex_must_match_whole_origin() {
        let policy = OriginPolicy::from_settings(&settings(&[], Some(r"https://[a-z0-9-]+\.onrender\.com"))).unwrap();
        assert!(!policy.allows_any());
        assert!(policy.allows("https://pdf2csv-frontend.onrender.com"));
        assert!(!policy.allows("https://evil.com/?https://x.onrender.com"));
        assert!(!policy.allows("https://x.onrender.com.evil.com"));
    }

    #[test]
    fn test_list_and_regex_combine() {
        let policy =
            OriginPolicy::from_settings(&settings(&["http://localhost:3000/"], Some(r"https://.*\.example\.org"))).unwrap();
        assert!(policy.allows("http://localhost:3000"));
        assert!(policy.allows("https://app.example.org"));
        assert!(!policy.allows("https://example.net"));
    }

    #[test]
    fn test_bad_regex() {
        assert!(OriginPolicy::from_settings(&settings(&[], Some("(open"))).is_err());
    }
}
