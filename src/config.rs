//! Runtime settings for the detection service and the identity provider.
//!
//! Settings are an explicit value handed to the components that need them.
//! Defaults point at the production service; each field can be overridden
//! from the environment.

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://aeki-api-service.azurewebsites.net";
pub const DEFAULT_API_ROUTE: &str = "/api/latest";
pub const PREDICT_ONE_ENDPOINT: &str = "/object-detection/predict";
pub const PREDICT_BATCH_ENDPOINT: &str = "/object-detection/predict/batch";

pub const DEFAULT_CLIENT_ID: &str = "84daa76c-57d6-4a7b-863e-6a906211a3ac";
pub const DEFAULT_AUTHORITY: &str =
    "https://login.microsoftonline.com/6784bddd-735e-476f-b767-f2ddcaa828f7";
pub const DEFAULT_TOKEN_CACHE: &str = ".token.cache";

/// Service and identity-provider configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// The only endpoint that is ever sent credentials.
    pub api_default_url: String,
    pub api_route: String,
    pub client_id: String,
    pub authority: String,
    pub scopes: Vec<String>,
    pub token_cache: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_default_url: DEFAULT_API_URL.to_string(),
            api_route: DEFAULT_API_ROUTE.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            authority: DEFAULT_AUTHORITY.to_string(),
            scopes: vec![format!("{DEFAULT_CLIENT_ID}/user_impersonation")],
            token_cache: PathBuf::from(DEFAULT_TOKEN_CACHE),
        }
    }
}

impl Settings {
    /// Builds settings from `BBOXER_*` environment variables, falling back
    /// to the defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = non_empty("BBOXER_API_DEFAULT_URL") {
            settings.api_default_url = url;
        }
        if let Some(route) = non_empty("BBOXER_API_ROUTE") {
            settings.api_route = route;
        }
        if let Some(client_id) = non_empty("BBOXER_CLIENT_ID") {
            settings.client_id = client_id;
        }
        if let Some(authority) = non_empty("BBOXER_AUTHORITY") {
            settings.authority = authority;
        }
        if let Some(scopes) = non_empty("BBOXER_SCOPES") {
            settings.scopes = scopes.split_whitespace().map(str::to_string).collect();
        }
        settings
    }

    /// Full URL of the single-image prediction endpoint under `base`.
    pub fn predict_one_url(&self, base: &str) -> String {
        format!(
            "{}{}{}",
            trim_base(base),
            self.api_route,
            PREDICT_ONE_ENDPOINT
        )
    }

    /// Full URL of the batch prediction endpoint under `base`.
    pub fn predict_batch_url(&self, base: &str) -> String {
        format!(
            "{}{}{}",
            trim_base(base),
            self.api_route,
            PREDICT_BATCH_ENDPOINT
        )
    }

    /// Whether `base` names the default endpoint.
    pub fn is_default_endpoint(&self, base: &str) -> bool {
        trim_base(base) == trim_base(&self.api_default_url)
    }
}

fn trim_base(base: &str) -> &str {
    base.strip_suffix('/').unwrap_or(base)
}
