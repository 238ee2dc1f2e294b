//! sdkmanager 列表输出解析

use super::types::{AvailablePackage, AvailableUpdate, InstalledPackage, SdkManagerList};

/// 清理工具输出中的 ANSI 转义序列和控制字符。
///
/// `sdkmanager --verbose` 会把 `\r` 就地刷新的进度条
/// （"[=====      ] 25% Fetch remote repository..."）混在列表输出前面，
/// 这里统一把裸 `\r` 断成换行，去掉 CSI 转义序列和其余控制字符。
pub fn clean_tool_output(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                // CSI 序列：ESC [ 参数... 直到字母结束
                if chars.peek() == Some(&'[') {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        chars.next();
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    cleaned.push('\n');
                }
            }
            c if c.is_control() && c != '\n' && c != '\t' => {}
            _ => cleaned.push(c),
        }
    }

    cleaned
}

/// 列表输出的分区
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Installed,
    Available,
    Updates,
}

impl Section {
    /// 识别分区标题行（大小写不敏感的子串匹配）。
    /// "installed updates:" 不属于三个已知分区，退回 None。
    fn from_header(lower: &str) -> Option<Section> {
        if lower.contains("installed packages:") {
            Some(Section::Installed)
        } else if lower.contains("available packages:") {
            Some(Section::Available)
        } else if lower.contains("available updates:") {
            Some(Section::Updates)
        } else if lower.contains("installed updates:") {
            Some(Section::None)
        } else {
            None
        }
    }
}

/// 解析 `sdkmanager --list` 的完整输出。
///
/// 单趟状态机：分区标题行切换状态；区块内把字段值按出现顺序压入缓冲栈，
/// 遇到空行时弹栈组装一条记录（updates 区里下一个包名行也会终结上一条，
/// 该区不保证以空行收尾）。表头、分隔线、path/id 回显行不计入字段，
/// Dependencies 之后的行整段跳过。字段数量不足的缓冲整条丢弃，
/// 视为工具输出噪声，不作为错误上报。
pub fn parse_list_output(output: &str) -> SdkManagerList {
    let cleaned = clean_tool_output(output);
    let mut result = SdkManagerList::default();
    let mut section = Section::None;
    let mut skipping_dependencies = false;
    let mut buffered: Vec<String> = Vec::new();

    for line in cleaned.lines() {
        let lower = line.to_lowercase();

        if let Some(next) = Section::from_header(&lower) {
            flush_buffered(&mut result, section, &mut buffered);
            skipping_dependencies = false;
            section = next;
            continue;
        }

        if section == Section::None {
            continue;
        }

        if lower.contains("dependencies") {
            skipping_dependencies = true;
            continue;
        }

        if line.trim().is_empty() {
            flush_buffered(&mut result, section, &mut buffered);
            skipping_dependencies = false;
            continue;
        }

        // 行首字母 = 新的包路径行
        if line.chars().next().map_or(false, |c| c.is_ascii_alphabetic()) {
            if section == Section::Updates && !buffered.is_empty() {
                flush_buffered(&mut result, section, &mut buffered);
            }
            skipping_dependencies = false;
            buffered.push(line.to_string());
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            let key = key.to_lowercase();
            if key.contains("path")
                || key.contains("id")
                || key.contains("------")
                || skipping_dependencies
            {
                continue;
            }
            buffered.push(value.trim().to_string());
        }
    }

    flush_buffered(&mut result, section, &mut buffered);

    result
}

/// 把缓冲栈按后进先出弹出，组装成当前分区的记录。
/// 压栈顺序是包名在底、字段值在上，所以各分区按固定的倒序取值。
fn flush_buffered(result: &mut SdkManagerList, section: Section, buffered: &mut Vec<String>) {
    match section {
        Section::Installed => {
            if let (Some(location), Some(version), Some(description), Some(path)) =
                (buffered.pop(), buffered.pop(), buffered.pop(), buffered.pop())
            {
                result.installed.push(InstalledPackage {
                    path: path.trim().to_string(),
                    description: description.trim().to_string(),
                    version: version.trim().to_string(),
                    location: location.trim().to_string(),
                });
            }
        }
        Section::Available => {
            if let (Some(version), Some(description), Some(path)) =
                (buffered.pop(), buffered.pop(), buffered.pop())
            {
                result.available.push(AvailablePackage {
                    path: path.trim().to_string(),
                    description: description.trim().to_string(),
                    version: version.trim().to_string(),
                });
            }
        }
        Section::Updates => {
            if let (Some(available_version), Some(installed_version), Some(path)) =
                (buffered.pop(), buffered.pop(), buffered.pop())
            {
                result.updates.push(AvailableUpdate {
                    path: path.trim().to_string(),
                    installed_version: installed_version.trim().to_string(),
                    available_version: available_version.trim().to_string(),
                });
            }
        }
        Section::None => {}
    }
    buffered.clear();
}
