//! # Config Loader
//!
//! 节点配置加载：按扩展名选择 TOML/JSON，反序列化为 `SensingConfig`，
//! 并在任何数据源启动前完成全部致命校验。
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("sensing.toml"))?;
//! println!("Peer: {}", config.device.expected_peer);
//! # Ok::<(), contracts::ContractError>(())
//! ```

mod format;
mod validator;

pub use contracts::SensingConfig;
pub use format::ConfigFormat;
pub use validator::validate;

use contracts::ContractError;
use std::path::Path;

/// Loads `SensingConfig` from TOML/JSON and rejects anything `validate`
/// would refuse, so a returned config is safe to arm sources with.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read, decode and validate a config file; the extension picks the format.
    pub fn load_from_path(path: &Path) -> Result<SensingConfig, ContractError> {
        let format = ConfigFormat::of_path(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Decode and validate config text.
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<SensingConfig, ContractError> {
        let config = format.decode(content)?;
        validate(&config)?;
        Ok(config)
    }

    pub fn to_toml(config: &SensingConfig) -> Result<String, ContractError> {
        ConfigFormat::Toml.encode(config)
    }

    pub fn to_json(config: &SensingConfig) -> Result<String, ContractError> {
        ConfigFormat::Json.encode(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::TransportConfig;
    use std::io::Write;

    const NODE_TOML: &str = r#"
[device]
expected_peer = "1a:00:00:00:00:00"

[ring]
capacity = 1140
evict_block = 114

[rssi]
window = 20
quorum = 5

[motion]
threshold = 0.5

[calibration]
enabled = true
packets = 100

[publish]
topic = "csi/data"
period_ms = 100

[transport]
kind = "file"
path = "telemetry.log"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(NODE_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.publish.topic, "csi/data");
        assert_eq!(config.transport.kind(), "file");
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(NODE_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.ring.capacity, config2.ring.capacity);
        assert_eq!(config.device.expected_peer, config2.device.expected_peer);
        assert_eq!(config.transport, config2.transport);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(NODE_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.publish.topic, config2.publish.topic);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[ring]
capacity = 100
evict_block = 100
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("ring.evict_block"));
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "transport": {{ "kind": "log" }} }}"#).unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.transport, TransportConfig::Log);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }
}
