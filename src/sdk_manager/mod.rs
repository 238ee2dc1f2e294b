//! sdkmanager 封装：列表查询与安装 / 卸载 / 整体升级

pub mod parser;
pub mod streaming;
pub mod types;

// 重新导出常用类型和函数
pub use streaming::run_confirming_command;
pub use types::{
    AvailablePackage, AvailableUpdate, CommandOutput, InstalledPackage, SdkManagerError,
    SdkManagerList,
};

use crate::config::Config;
use anyhow::Result;
use parser::parse_list_output;
use std::path::{Path, PathBuf};
use std::process::Command;
use tokio::sync::mpsc;

/// sdk_root / ANDROID_HOME 下 sdkmanager 的相对位置，新目录布局优先
const TOOL_CANDIDATES: [&str; 2] = [
    "cmdline-tools/latest/bin/sdkmanager",
    "tools/bin/sdkmanager",
];

#[derive(Debug, Clone)]
pub struct SdkManager {
    pub tool_path: PathBuf,
}

impl SdkManager {
    /// 定位 sdkmanager 可执行文件。
    ///
    /// 依次尝试配置的 sdk_root 和 ANDROID_HOME 环境变量（各自检查
    /// cmdline-tools/latest/bin 与旧版 tools/bin），最后回落到 PATH。
    pub fn locate(config: &Config) -> Result<Self, SdkManagerError> {
        let mut roots: Vec<PathBuf> = Vec::new();
        if let Some(root) = &config.sdk_root {
            roots.push(root.clone());
        }
        if let Ok(home) = std::env::var("ANDROID_HOME") {
            if !home.is_empty() {
                roots.push(PathBuf::from(home));
            }
        }

        for root in &roots {
            for rel in TOOL_CANDIDATES {
                let candidate = root.join(rel);
                if candidate.is_file() {
                    return Ok(SdkManager {
                        tool_path: candidate,
                    });
                }
            }
        }

        if Command::new("which")
            .arg("sdkmanager")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
        {
            return Ok(SdkManager {
                tool_path: PathBuf::from("sdkmanager"),
            });
        }

        Err(SdkManagerError::ToolNotFound)
    }

    pub fn tool(&self) -> &Path {
        &self.tool_path
    }

    // ===== 查询 =====

    /// 获取已安装 / 可安装 / 可升级的包列表。
    /// 同步执行：进程跑完后再解析捕获的完整输出。
    pub fn list(&self, config: &Config) -> Result<SdkManagerList> {
        let mut args = vec!["--list".to_string()];
        args.extend(standard_args(config));

        let output = Command::new(&self.tool_path)
            .args(&args)
            .output()
            .map_err(SdkManagerError::Launch)?;
        if !output.status.success() {
            // 输出能捕获多少解析多少，空输出解析为空列表
            log::warn!(
                "sdkmanager --list 退出码 {:?}，按已捕获的输出解析",
                output.status.code()
            );
        }
        Ok(parse_list_output(&String::from_utf8_lossy(&output.stdout)))
    }

    // ===== 变更 =====

    /// 安装包（自动确认）
    pub fn install(
        &self,
        packages: &[String],
        config: &Config,
        info_tx: mpsc::UnboundedSender<String>,
    ) -> Result<CommandOutput> {
        self.install_or_uninstall(true, packages, config, info_tx)
    }

    /// 卸载包（自动确认）
    pub fn uninstall(
        &self,
        packages: &[String],
        config: &Config,
        info_tx: mpsc::UnboundedSender<String>,
    ) -> Result<CommandOutput> {
        self.install_or_uninstall(false, packages, config, info_tx)
    }

    /// 安装或卸载。包路径原样传给 sdkmanager，不做合法性校验。
    pub fn install_or_uninstall(
        &self,
        install: bool,
        packages: &[String],
        config: &Config,
        info_tx: mpsc::UnboundedSender<String>,
    ) -> Result<CommandOutput> {
        let mut args: Vec<String> = Vec::new();
        if !install {
            args.push("--uninstall".to_string());
        }
        args.extend(packages.iter().cloned());
        args.extend(standard_args(config));
        run_confirming_command(&self.tool_path, &args, info_tx, config.fail_on_error)
    }

    /// 升级全部已安装包（sdkmanager update，自动确认）
    pub fn update_all(
        &self,
        config: &Config,
        info_tx: mpsc::UnboundedSender<String>,
    ) -> Result<CommandOutput> {
        let mut args = vec!["update".to_string()];
        args.extend(standard_args(config));
        run_confirming_command(&self.tool_path, &args, info_tx, config.fail_on_error)
    }
}

/// 组装各命令共用的标准参数
fn standard_args(config: &Config) -> Vec<String> {
    let mut args = vec!["--verbose".to_string()];

    if let Some(channel) = config.channel.flag_value() {
        args.push(format!("--channel={}", channel));
    }
    if let Some(root) = &config.sdk_root {
        args.push(format!("--sdk_root={}", root.display()));
    }
    if config.include_obsolete {
        args.push("--include_obsolete".to_string());
    }
    if config.no_https {
        args.push("--no_https".to_string());
    }
    if let Some(kind) = config.proxy.proxy_type.flag_value() {
        args.push(format!("--proxy={}", kind));
        if !config.proxy.host.is_empty() {
            args.push(format!("--proxy_host={}", config.proxy.host));
        }
        if config.proxy.port > 0 {
            args.push(format!("--proxy_port={}", config.proxy.port));
        }
    }

    args
}
