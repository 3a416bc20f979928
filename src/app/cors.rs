use crate::utils::error::{Result, SentimentError};
use axum::http::{request::Parts, HeaderValue};
use regex::Regex;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Origin allow-list. Entries containing `*` are globs over a single host
/// label run (`https://*.vercel.app`); a lone `*` admits every origin.
#[derive(Debug, Clone)]
pub struct OriginMatcher {
    any: bool,
    exact: Vec<String>,
    patterns: Vec<Regex>,
}

impl OriginMatcher {
    pub fn new(origins: &[String]) -> Result<Self> {
        let mut matcher = Self {
            any: false,
            exact: Vec::new(),
            patterns: Vec::new(),
        };

        for origin in origins {
            let origin = origin.trim().trim_end_matches('/');
            if origin == "*" {
                matcher.any = true;
            } else if origin.contains('*') {
                matcher.patterns.push(glob_to_regex(origin)?);
            } else {
                matcher.exact.push(origin.to_string());
            }
        }

        Ok(matcher)
    }

    pub fn matches(&self, origin: &str) -> bool {
        self.any
            || self.exact.iter().any(|o| o == origin)
            || self.patterns.iter().any(|re| re.is_match(origin))
    }

    pub fn allows_any(&self) -> bool {
        self.any
    }
}

fn glob_to_regex(glob: &str) -> Result<Regex> {
    let body = glob
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[^/]*");
    Regex::new(&format!("^{}$", body)).map_err(|e| SentimentError::InvalidConfigValueError {
        field: "cors_allowed_origins".to_string(),
        value: glob.to_string(),
        reason: e.to_string(),
    })
}

/// Credentialed CORS: browsers reject `*` together with credentials, so
/// methods and headers are mirrored from the preflight request instead.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let matcher = OriginMatcher::new(origins)?;

    let allow_origin = if matcher.allows_any() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
            origin
                .to_str()
                .map(|o| matcher.matches(o))
                .unwrap_or(false)
        })
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}
