use anyhow::Result;
use chrono::Local;
use std::fs;
use std::path::PathBuf;

/// 操作日志保存器：install / uninstall / update 的完整输出按日期归档
pub struct ReportSaver {
    base_dir: PathBuf,
}

impl ReportSaver {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// 保存一次操作的完整输出，返回日志文件路径。
    /// 目录结构: <base>/YYYY/MM/DD/HH-mm-<op>.log
    pub fn save(&self, content: &str, operation: &str) -> Result<PathBuf> {
        let now = Local::now();

        let dir = self
            .base_dir
            .join(now.format("%Y").to_string())
            .join(now.format("%m").to_string())
            .join(now.format("%d").to_string());
        fs::create_dir_all(&dir)?;

        let filename = format!("{}-{}.log", now.format("%H-%M"), operation);
        let filepath = dir.join(filename);

        let mut full_content = String::new();
        full_content.push_str(&format!(
            "sdkmanager {} 日志\n生成时间: {}\n\n",
            operation,
            now.format("%Y-%m-%d %H:%M:%S")
        ));
        full_content.push_str(content);

        fs::write(&filepath, full_content)?;

        Ok(filepath)
    }
}
