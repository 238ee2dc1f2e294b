//! 交互式命令执行（install / uninstall / update）

use super::parser::clean_tool_output;
use super::types::{CommandOutput, SdkManagerError};
use anyhow::Result;
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use tokio::sync::mpsc;

/// Info: 前缀的信息行（大小写不敏感）
fn is_info_line(line: &str) -> bool {
    has_prefix_ignore_case(line, "info:")
}

/// Error: 前缀的错误行（大小写不敏感）
fn is_error_line(line: &str) -> bool {
    has_prefix_ignore_case(line, "error:")
}

fn has_prefix_ignore_case(line: &str, prefix: &str) -> bool {
    line.get(..prefix.len())
        .map_or(false, |head| head.eq_ignore_ascii_case(prefix))
}

/// 单个输出流的读取结果
#[derive(Default)]
struct DrainedStream {
    text: String,
    saw_error: bool,
}

impl DrainedStream {
    fn accept_line(&mut self, line_buffer: &mut String, info_tx: &mpsc::UnboundedSender<String>, keep_in_log: bool) {
        let cleaned = clean_tool_output(line_buffer);
        line_buffer.clear();
        let line = cleaned.trim_end();
        if line.trim().is_empty() {
            return;
        }
        if is_info_line(line) {
            let _ = info_tx.send(line.to_string());
        }
        if is_error_line(line) {
            self.saw_error = true;
        }
        if keep_in_log {
            self.text.push_str(line);
            self.text.push('\n');
        }
    }
}

/// 从子进程输出流逐行读取。
/// `\n` 结尾的行计入完整日志，`\r` 就地刷新的进度段只参与行级判定、
/// 不追加到日志；Info: 前缀行按原始顺序转发给 info_tx，其余行对
/// 调用方的 sink 不可见。
fn drain_stream_lines(
    stream: Option<impl Read>,
    info_tx: &mpsc::UnboundedSender<String>,
) -> DrainedStream {
    let mut drained = DrainedStream::default();
    if let Some(mut reader) = stream {
        let mut buffer = [0u8; 1024];
        let mut line_buffer = String::new();

        while let Ok(n) = reader.read(&mut buffer) {
            if n == 0 {
                break;
            }
            let chunk = String::from_utf8_lossy(&buffer[..n]);
            for c in chunk.chars() {
                match c {
                    '\n' => drained.accept_line(&mut line_buffer, info_tx, true),
                    '\r' => drained.accept_line(&mut line_buffer, info_tx, false),
                    _ => line_buffer.push(c),
                }
            }
        }
        if !line_buffer.is_empty() {
            drained.accept_line(&mut line_buffer, info_tx, true);
        }
    }
    drained
}

/// 执行需要交互确认的 sdkmanager 命令。
///
/// sdkmanager 的 install / uninstall / update 会在产生其余输出之前
/// 同步弹出一次 y/N 确认，且提示文本与普通输出无法区分，因此启动后
/// 立即写入一行 "y" 并关闭 stdin，不等待提示出现。这是对外部工具
/// 行为的契约依赖：恰好一次提示，出现在最前。
///
/// 随后阻塞等待进程退出，期间两个读取线程分别排空 stdout / stderr，
/// 把 Info: 前缀行转发给 info_tx。
///
/// 返回的 success 默认恒为 true：退出码和 Error: 行历史上均不作为
/// 失败依据。开启 fail_on_error 后，任一输出流出现 Error: 前缀行
/// 即判定失败；退出码始终只记录日志。
pub fn run_confirming_command(
    program: &Path,
    args: &[String],
    info_tx: mpsc::UnboundedSender<String>,
    fail_on_error: bool,
) -> Result<CommandOutput> {
    use std::os::unix::process::CommandExt;

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    unsafe {
        cmd.pre_exec(|| {
            // 独立进程组，并随父进程退出，避免残留 sdkmanager 进程
            libc::setpgid(0, 0);
            libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
            Ok(())
        });
    }
    let mut child = cmd.spawn().map_err(SdkManagerError::Launch)?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = writeln!(stdin, "y") {
            log::warn!("写入确认输入失败: {}", e);
        }
        // drop 关闭管道，工具若再次读取将得到 EOF
    }

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let info_tx_clone = info_tx.clone();
    let stdout_handle =
        std::thread::spawn(move || drain_stream_lines(stdout, &info_tx_clone));
    let stderr_handle =
        std::thread::spawn(move || drain_stream_lines(stderr, &info_tx));

    let drained_out = stdout_handle.join().unwrap_or_default();
    let drained_err = stderr_handle.join().unwrap_or_default();

    let status = child.wait()?;
    log::debug!("sdkmanager 退出码 {:?}，不参与成败判定", status.code());

    let success = !(fail_on_error && (drained_out.saw_error || drained_err.saw_error));

    Ok(CommandOutput {
        stdout: drained_out.text,
        stderr: drained_err.text,
        success,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sh() -> PathBuf {
        PathBuf::from("/bin/sh")
    }

    fn sh_args(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn info_prefix_matches_case_insensitively() {
        assert!(is_info_line("Info: installing"));
        assert!(is_info_line("INFO: installing"));
        assert!(is_info_line("info:"));
        assert!(!is_info_line("Information desk"));
        assert!(!is_info_line("Warning: Info: nested"));
        assert!(!is_info_line(""));
    }

    #[test]
    fn forwards_only_info_lines_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let script = "read reply; \
                      echo 'Info: step one'; \
                      echo 'Warning: noise'; \
                      echo 'plain line'; \
                      echo 'info: step two'";
        let output = run_confirming_command(&sh(), &sh_args(script), tx, false).unwrap();

        assert!(output.success);
        assert_eq!(rx.try_recv().unwrap(), "Info: step one");
        assert_eq!(rx.try_recv().unwrap(), "info: step two");
        assert!(rx.try_recv().is_err());
        // 非 Info 行仍保留在完整日志里
        assert!(output.stdout.contains("Warning: noise"));
        assert!(output.stdout.contains("plain line"));
    }

    #[test]
    fn confirmation_reaches_child_stdin() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let script = "read reply; echo \"Info: answered $reply\"";
        run_confirming_command(&sh(), &sh_args(script), tx, false).unwrap();
        assert_eq!(rx.try_recv().unwrap(), "Info: answered y");
    }

    #[test]
    fn success_ignores_exit_code_and_error_lines_by_default() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let script = "echo 'Error: boom'; exit 1";
        let output = run_confirming_command(&sh(), &sh_args(script), tx, false).unwrap();
        assert!(output.success);
        assert!(output.stdout.contains("Error: boom"));
    }

    #[test]
    fn fail_on_error_flags_error_lines() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let script = "echo 'error: failed to install'; exit 0";
        let output = run_confirming_command(&sh(), &sh_args(script), tx, true).unwrap();
        assert!(!output.success);
    }

    #[test]
    fn stderr_is_captured_separately() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let script = "echo 'out line'; echo 'err line' >&2";
        let output = run_confirming_command(&sh(), &sh_args(script), tx, false).unwrap();
        assert!(output.stdout.contains("out line"));
        assert!(output.stderr.contains("err line"));
        assert!(output.combined_output().contains("err line"));
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let program = PathBuf::from("/nonexistent/sdkmanager");
        let result = run_confirming_command(&program, &[], tx, false);
        assert!(result.is_err());
    }
}
