//! 配置文件格式
//!
//! TOML 为主，JSON 用于机器生成的配置。所有段落均可省略，缺省值见
//! `contracts::SensingConfig`。

use std::error::Error;
use std::path::Path;

use contracts::{ContractError, SensingConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// 扩展名（不区分大小写）到格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        [Self::Toml, Self::Json]
            .into_iter()
            .find(|format| ext.eq_ignore_ascii_case(format.extension()))
    }

    /// 按路径扩展名判断格式
    pub fn of_path(path: &Path) -> Result<Self, ContractError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| {
                ContractError::config_parse(format!(
                    "unsupported config format for {} (expected .toml or .json)",
                    path.display()
                ))
            })
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }

    /// 反序列化（不做校验）
    pub fn decode(self, content: &str) -> Result<SensingConfig, ContractError> {
        let decoded: Result<SensingConfig, Box<dyn Error + Send + Sync>> = match self {
            Self::Toml => toml::from_str(content).map_err(Into::into),
            Self::Json => serde_json::from_str(content).map_err(Into::into),
        };

        decoded.map_err(|source| ContractError::ConfigParse {
            message: format!("{} syntax: {source}", self.extension()),
            source: Some(source),
        })
    }

    /// 序列化为人类可读文本
    pub fn encode(self, config: &SensingConfig) -> Result<String, ContractError> {
        let encoded = match self {
            Self::Toml => toml::to_string_pretty(config).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
        };

        encoded.map_err(|e| {
            ContractError::config_parse(format!("cannot render config as {}: {e}", self.extension()))
        })
    }
}
