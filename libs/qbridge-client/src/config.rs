use std::path::Path;

use serde::Deserialize;

use qbridge_api::BridgeError;

/// Client configuration, read from TOML.
///
/// ```toml
/// host = "localhost"
/// port = 5001
/// transport = "target/release/libtransport_replay.so"
///
/// [transport_config]
/// fixtures = "fixtures.toml"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path to the transport plugin library.
    pub transport: String,
    /// Passed to the plugin as JSON.
    #[serde(default)]
    pub transport_config: toml::Table,
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    5001
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("read '{}': {e}", path.display())))?;
        Self::parse(&content)
            .map_err(|e| BridgeError::Config(format!("'{}': {e}", path.display())))
    }

    pub fn parse(content: &str) -> Result<Self, BridgeError> {
        toml::from_str(content).map_err(|e| BridgeError::Config(format!("parse: {e}")))
    }

    pub fn transport_config_json(&self) -> Result<String, BridgeError> {
        serde_json::to_string(&self.transport_config)
            .map_err(|e| BridgeError::Config(format!("transport_config: {e}")))
    }
}
