//! Report configuration.
//!
//! Defaults are overridden by environment variables, which the command-line
//! front-end overrides in turn with its flags.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::warn;

/// Backend used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Prefix of the exported file name.
pub const DEFAULT_TITLE_PREFIX: &str = "Informe detallado de";

/// Timeout applied to every backend request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub const BACKEND_URL_VAR: &str = "USABILITY_REPORT_BACKEND_URL";
pub const TITLE_PREFIX_VAR: &str = "USABILITY_REPORT_TITLE_PREFIX";
pub const HEADER_IMAGE_VAR: &str = "USABILITY_REPORT_HEADER_IMAGE";
pub const HTTP_TIMEOUT_VAR: &str = "USABILITY_REPORT_HTTP_TIMEOUT_SECS";

/// Settings shared by the compiler, the backend client and the exporter.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    /// Base URL of the survey backend.
    pub backend_url: String,
    /// Text placed before the design test name in the exported file name.
    pub title_prefix: String,
    /// Image drawn at the top of the cover page.
    pub header_image: Option<PathBuf>,
    pub http_timeout: Duration,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            title_prefix: DEFAULT_TITLE_PREFIX.to_string(),
            header_image: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl ReportConfig {
    /// Defaults overridden by the `USABILITY_REPORT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Defaults overridden by the values `lookup` returns for each variable
    /// name.  Blank values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(url) = read(BACKEND_URL_VAR) {
            config.backend_url = url;
        }
        if let Some(prefix) = read(TITLE_PREFIX_VAR) {
            config.title_prefix = prefix;
        }
        if let Some(path) = read(HEADER_IMAGE_VAR) {
            config.header_image = Some(PathBuf::from(path));
        }
        if let Some(raw) = read(HTTP_TIMEOUT_VAR) {
            match raw.parse::<u64>() {
                Ok(secs) => config.http_timeout = Duration::from_secs(secs),
                Err(_) => warn!(
                    "Ignoring {}={:?}: expected a whole number of seconds",
                    HTTP_TIMEOUT_VAR, raw
                ),
            }
        }

        config
    }

    /// File name of the exported report for a design test.  Path separators
    /// in the name are replaced so the report always lands in the output
    /// directory.
    pub fn file_name(&self, design_test_name: &str) -> String {
        let name: String = design_test_name
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
            .collect();
        format!("{} {}.pdf", self.title_prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_without_variables() {
        assert_eq!(ReportConfig::from_lookup(|_| None), ReportConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = ReportConfig::from_lookup(lookup(&[
            (BACKEND_URL_VAR, "https://api.example.com"),
            (TITLE_PREFIX_VAR, "Reporte de"),
            (HEADER_IMAGE_VAR, "logo.png"),
            (HTTP_TIMEOUT_VAR, "5"),
        ]));

        assert_eq!(config.backend_url, "https://api.example.com");
        assert_eq!(config.title_prefix, "Reporte de");
        assert_eq!(config.header_image, Some(PathBuf::from("logo.png")));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn blank_and_invalid_values_are_ignored() {
        let config = ReportConfig::from_lookup(lookup(&[
            (TITLE_PREFIX_VAR, "   "),
            (HTTP_TIMEOUT_VAR, "soon"),
        ]));
        assert_eq!(config.title_prefix, DEFAULT_TITLE_PREFIX);
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
    }

    #[test]
    fn file_name_replaces_path_separators() {
        let config = ReportConfig::default();
        assert_eq!(
            config.file_name("Tienda/Web"),
            "Informe detallado de Tienda-Web.pdf"
        );
    }
}
