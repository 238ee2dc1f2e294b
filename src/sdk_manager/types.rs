//! SdkManager 相关数据类型定义

use thiserror::Error;

/// 已安装的 SDK 包（"Installed packages:" 区块）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub path: String,
    pub description: String,
    pub version: String,
    pub location: String,
}

/// 远程仓库中可安装的 SDK 包（"Available Packages:" 区块）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailablePackage {
    pub path: String,
    pub description: String,
    pub version: String,
}

/// 存在新版本的已安装包（"Available Updates:" 区块）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableUpdate {
    pub path: String,
    pub installed_version: String,
    pub available_version: String,
}

/// `--list` 的完整解析结果，三个列表均保持 sdkmanager 的输出顺序，
/// 不去重、不排序
#[derive(Debug, Clone, Default)]
pub struct SdkManagerList {
    pub installed: Vec<InstalledPackage>,
    pub available: Vec<AvailablePackage>,
    pub updates: Vec<AvailableUpdate>,
}

/// 命令输出结果
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CommandOutput {
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// sdkmanager 调用层错误
#[derive(Debug, Error)]
pub enum SdkManagerError {
    #[error("未找到 sdkmanager，请在配置中设置 sdk_root 或导出 ANDROID_HOME")]
    ToolNotFound,

    #[error("启动 sdkmanager 失败: {0}")]
    Launch(#[from] std::io::Error),
}
