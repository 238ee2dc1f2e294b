use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// 发布渠道，对应 sdkmanager 的 --channel=<n>
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Stable = 0,
    Beta = 1,
    Dev = 2,
    Canary = 3,
}

impl Channel {
    /// stable 是工具默认渠道，不需要显式传参
    pub fn flag_value(self) -> Option<u8> {
        match self {
            Channel::Stable => None,
            other => Some(other as u8),
        }
    }
}

/// 代理类型，对应 --proxy=<type>
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    #[default]
    None,
    Http,
    Socks,
}

impl ProxyType {
    pub fn flag_value(self) -> Option<&'static str> {
        match self {
            ProxyType::None => None,
            ProxyType::Http => Some("http"),
            ProxyType::Socks => Some("socks"),
        }
    }
}

/// 代理设置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub proxy_type: ProxyType,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Android SDK 根目录，同时用于定位 sdkmanager 和 --sdk_root 参数
    pub sdk_root: Option<PathBuf>,
    /// 发布渠道
    pub channel: Channel,
    /// 列表中包含已废弃的包
    pub include_obsolete: bool,
    /// 强制走 http
    pub no_https: bool,
    /// 代理设置
    pub proxy: ProxyConfig,
    /// 输出中出现 Error: 行时把操作判定为失败。默认关闭，保持工具的
    /// 历史行为：进程退出即视为成功
    pub fail_on_error: bool,
    /// 操作日志目录
    pub report_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Self {
            sdk_root: None,
            channel: Channel::Stable,
            include_obsolete: false,
            no_https: false,
            proxy: ProxyConfig::default(),
            fail_on_error: false,
            report_dir: PathBuf::from(home).join(".lian/sdkmanager"),
        }
    }
}

impl Config {
    pub fn load_or_default() -> Result<Self> {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let config_path = PathBuf::from(home).join(".config/lian-sdkmanager/config.toml");

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_tool_defaults() {
        let config = Config::default();
        assert!(config.sdk_root.is_none());
        assert_eq!(config.channel, Channel::Stable);
        assert!(!config.include_obsolete);
        assert!(!config.no_https);
        assert_eq!(config.proxy.proxy_type, ProxyType::None);
        assert!(!config.fail_on_error);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
sdk_root = "/opt/android-sdk"
channel = "canary"
fail_on_error = true

[proxy]
proxy_type = "http"
host = "127.0.0.1"
port = 8080
"#,
        )
        .expect("parse config");

        assert_eq!(
            config.sdk_root.as_deref(),
            Some(std::path::Path::new("/opt/android-sdk"))
        );
        assert_eq!(config.channel, Channel::Canary);
        assert!(config.fail_on_error);
        assert_eq!(config.proxy.proxy_type, ProxyType::Http);
        assert_eq!(config.proxy.host, "127.0.0.1");
        assert_eq!(config.proxy.port, 8080);
        // 未给出的字段取默认值
        assert!(!config.include_obsolete);
        assert!(!config.no_https);
    }

    #[test]
    fn channel_flag_values() {
        assert_eq!(Channel::Stable.flag_value(), None);
        assert_eq!(Channel::Beta.flag_value(), Some(1));
        assert_eq!(Channel::Dev.flag_value(), Some(2));
        assert_eq!(Channel::Canary.flag_value(), Some(3));
    }
}
