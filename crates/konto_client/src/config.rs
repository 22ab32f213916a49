use crate::error::Error;
use url::Url;

/// Connection settings for the hosted backend.
///
/// Both values are required up front: a missing or unparseable endpoint is a
/// construction error, not a request-time surprise.
#[derive(Clone, Debug)]
pub struct Config {
    base_url: Url,
    api_key: String,
}

impl Config {
    /// Validates the backend endpoint and public API key.
    ///
    /// # Errors
    /// Returns an error if `base_url` cannot be parsed, has no host, uses a
    /// scheme other than `http`/`https`, or if `api_key` is empty.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, Error> {
        let url = Url::parse(base_url.trim())
            .map_err(|err| Error::Config(format!("invalid backend URL: {err}")))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(Error::Config(format!(
                    "invalid backend URL: unsupported scheme {scheme}"
                )));
            }
        }

        if url.host().is_none() {
            return Err(Error::Config(
                "invalid backend URL: no host specified".to_string(),
            ));
        }

        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(Error::Config("API key must not be empty".to_string()));
        }

        Ok(Self {
            base_url: url,
            api_key: api_key.to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Builds a URL under the identity surface (`/auth/v1`).
    pub(crate) fn auth_endpoint(&self, path: &str) -> String {
        self.endpoint("auth/v1", path)
    }

    /// Builds a URL under the data surface (`/rest/v1`).
    pub(crate) fn rest_endpoint(&self, path: &str) -> String {
        self.endpoint("rest/v1", path)
    }

    fn endpoint(&self, surface: &str, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{surface}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn accepts_http_and_https() {
        assert!(Config::new("http://localhost:54321", "anon").is_ok());
        assert!(Config::new("https://project.konto.dev", "anon").is_ok());
    }

    #[test]
    fn rejects_unsupported_scheme() {
        let err = Config::new("ftp://example.com", "anon").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn rejects_unparseable_url() {
        assert!(Config::new("not a url", "anon").is_err());
    }

    #[test]
    fn rejects_empty_api_key() {
        let err = Config::new("https://example.com", "  ").unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn endpoints_join_without_duplicate_slashes() {
        let config = Config::new("https://example.com/", "anon").unwrap();
        assert_eq!(
            config.auth_endpoint("/token"),
            "https://example.com/auth/v1/token"
        );
        assert_eq!(
            config.rest_endpoint("profiles"),
            "https://example.com/rest/v1/profiles"
        );
    }
}
