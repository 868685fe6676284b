use serde::Deserialize;

pub const DEFAULT_PROJECT: &str = "project_1";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const ENV_PREFIX: &str = "IMJS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load widget configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("sensor endpoint {0:?} must start with http:// or https://")]
    InvalidEndpoint(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetConfig {
    /// Base URL of the sensor service; fetching is disabled when unset
    #[serde(default)]
    pub sensor_endpoint: Option<String>,
    pub project: String,
    pub listen_addr: String,
}

impl WidgetConfig {
    /// Trimmed endpoint, `None` when missing or blank
    pub fn sensor_endpoint(&self) -> Option<&str> {
        self.sensor_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if let Some(endpoint) = self.sensor_endpoint() {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
            }
        }
        Ok(self)
    }
}

/// Defaults, then `config/sensor_widget.*` if present, then `IMJS_*` variables
pub fn load_widget_config() -> Result<WidgetConfig, ConfigError> {
    load_widget_config_with(config::Environment::with_prefix(ENV_PREFIX))
}

pub fn load_widget_config_with(env: config::Environment) -> Result<WidgetConfig, ConfigError> {
    let settings = config::Config::builder()
        .set_default("project", DEFAULT_PROJECT)?
        .set_default("listen_addr", DEFAULT_LISTEN_ADDR)?
        .add_source(config::File::with_name("config/sensor_widget").required(false))
        .add_source(env)
        .build()?;

    let widget_config: WidgetConfig = settings.try_deserialize()?;
    widget_config.validate()
}
