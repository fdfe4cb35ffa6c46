use crate::config::ProxySettings;
use anyhow::{Context, Result};
use url::Url;

/// Routes page fetches through the anti-blocking fetch proxy when a key is set
#[derive(Debug, Clone)]
pub struct ProxyRoute {
    api_key: Option<String>,
    endpoint: Option<Url>,
    settings: ProxySettings,
}

impl ProxyRoute {
    pub fn new(api_key: Option<String>, settings: ProxySettings) -> Result<Self> {
        let endpoint = match api_key {
            Some(_) => Some(
                Url::parse(&settings.endpoint)
                    .with_context(|| format!("Invalid proxy endpoint '{}'", settings.endpoint))?,
            ),
            None => None,
        };
        Ok(Self {
            api_key,
            endpoint,
            settings,
        })
    }

    /// Fetch target URLs directly
    pub fn direct() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            settings: ProxySettings::default(),
        }
    }

    pub fn is_direct(&self) -> bool {
        self.api_key.is_none()
    }

    /// URL the browser should actually load for `target`
    pub fn wrap(&self, target: &str) -> String {
        let (Some(key), Some(endpoint)) = (&self.api_key, &self.endpoint) else {
            return target.to_string();
        };

        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("api_key", key)
            .append_pair("url", target)
            .append_pair("country", &self.settings.country)
            .append_pair("residential", bool_param(self.settings.residential))
            .append_pair("render_js", bool_param(self.settings.render_js))
            .append_pair("timeout", &self.settings.timeout_ms.to_string());
        url.into()
    }
}

fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
