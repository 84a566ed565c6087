//! Page location and user agent lookup.

/// Reads the page metadata stamped onto every entry.
pub trait PageInfo: Send + Sync {
    /// The current page location.
    fn url(&self) -> String;
    fn user_agent(&self) -> String;
}

/// A `PageInfo` whose values are fixed at construction.
#[derive(Debug, Clone)]
pub struct StaticPageInfo {
    url: String,
    user_agent: String,
}

impl StaticPageInfo {
    pub fn new(url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Identifies this process: `<crate>/<version> (<os>)`.
    pub fn default_user_agent() -> String {
        format!(
            "{}/{} ({})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS
        )
    }
}

impl Default for StaticPageInfo {
    fn default() -> Self {
        let url = std::env::current_dir()
            .map(|dir| format!("file://{}", dir.display()))
            .unwrap_or_else(|_| "about:blank".to_string());
        Self::new(url, Self::default_user_agent())
    }
}

impl PageInfo for StaticPageInfo {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }
}
