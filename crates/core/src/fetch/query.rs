//! Request addressing: which resource, which filters, which base URLs

use tripline_domain::{ApiConfig, ResourceEndpoint, Result};
use url::Url;

/// A read or write against one upstream resource family.
///
/// Parameters are appended in a fixed order so the same query always
/// resolves to the same URL, and therefore the same cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceQuery {
    endpoint: ResourceEndpoint,
    params: Vec<(&'static str, String)>,
}

impl ResourceQuery {
    pub const fn new(endpoint: ResourceEndpoint) -> Self {
        Self { endpoint, params: Vec::new() }
    }

    pub const fn endpoint(&self) -> ResourceEndpoint {
        self.endpoint
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.param("id", id.into())
    }

    pub fn slug(self, slug: impl Into<String>) -> Self {
        self.param("slug", slug.into())
    }

    pub fn category(self, category: impl Into<String>) -> Self {
        self.param("category", category.into())
    }

    pub fn search(self, search: impl Into<String>) -> Self {
        self.param("search", search.into())
    }

    pub fn limit(self, limit: usize) -> Self {
        self.param("limit", limit.to_string())
    }

    /// Filter feedback by the event it belongs to.
    pub fn event_id(self, event_id: impl Into<String>) -> Self {
        self.param("eventId", event_id.into())
    }

    /// Administrative action such as `purge`.
    pub fn action(self, action: impl Into<String>) -> Self {
        self.param("action", action.into())
    }

    /// `base` with `endpoint=` and every parameter appended.
    pub fn resolve(&self, base: &Url) -> Url {
        let mut url = base.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("endpoint", self.endpoint.as_str());
            for (name, value) in &self.params {
                pairs.append_pair(name, value);
            }
        }
        url
    }

    fn param(mut self, name: &'static str, value: String) -> Self {
        self.params.retain(|(existing, _)| *existing != name);
        self.params.push((name, value));
        self
    }
}

/// Primary base URL followed by fallbacks, tried in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub primary: Url,
    pub fallbacks: Vec<Url>,
}

impl Endpoints {
    pub const fn new(primary: Url, fallbacks: Vec<Url>) -> Self {
        Self { primary, fallbacks }
    }

    /// # Errors
    ///
    /// Returns `TriplineError::Config` when any URL fails to parse.
    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        Ok(Self::new(api.primary_url()?, api.fallback_urls()?))
    }

    pub fn primary_for(&self, query: &ResourceQuery) -> Url {
        query.resolve(&self.primary)
    }

    /// Every URL `query` may be served from, primary first.
    pub fn candidates(&self, query: &ResourceQuery) -> Vec<Url> {
        std::iter::once(&self.primary).chain(&self.fallbacks).map(|base| query.resolve(base)).collect()
    }
}

/// Rate-limit key for a resolved URL: its path plus query string.
pub fn rate_limit_key(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn resolves_parameters_in_call_order() {
        let query = ResourceQuery::new(ResourceEndpoint::Destinations).category("beach").limit(5);
        let resolved = query.resolve(&url("https://api.example.com/api"));
        assert_eq!(resolved.as_str(), "https://api.example.com/api?endpoint=destinations&category=beach&limit=5");
    }

    #[test]
    fn repeated_parameter_keeps_last_value() {
        let query = ResourceQuery::new(ResourceEndpoint::Events).limit(5).limit(10);
        assert_eq!(
            query.resolve(&url("http://localhost/api")).as_str(),
            "http://localhost/api?endpoint=events&limit=10"
        );
    }

    #[test]
    fn values_are_percent_encoded() {
        let query = ResourceQuery::new(ResourceEndpoint::Events).search("jazz & blues");
        let resolved = query.resolve(&url("http://localhost/api"));
        assert_eq!(resolved.query(), Some("endpoint=events&search=jazz+%26+blues"));
    }

    #[test]
    fn candidates_start_with_primary() {
        let endpoints = Endpoints::new(
            url("https://primary.example.com/api"),
            vec![url("https://backup.example.com/exec"), url("https://mirror.example.com/api")],
        );
        let hosts: Vec<String> = endpoints
            .candidates(&ResourceQuery::new(ResourceEndpoint::Events))
            .iter()
            .map(|u| u.host_str().unwrap().to_string())
            .collect();
        assert_eq!(hosts, ["primary.example.com", "backup.example.com", "mirror.example.com"]);
    }

    #[test]
    fn rate_limit_key_ignores_host() {
        let query = ResourceQuery::new(ResourceEndpoint::Events).slug("fest");
        let a = query.resolve(&url("https://a.example.com/api"));
        let b = query.resolve(&url("https://b.example.com/api"));
        assert_eq!(rate_limit_key(&a), "/api?endpoint=events&slug=fest");
        assert_eq!(rate_limit_key(&a), rate_limit_key(&b));
    }
}
