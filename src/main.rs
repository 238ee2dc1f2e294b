mod config;
mod report;
mod sdk_manager;

use anyhow::{bail, Result};
use report::ReportSaver;
use sdk_manager::{SdkManager, SdkManagerList};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 加载配置
    let config = config::Config::load_or_default()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        std::process::exit(2);
    }
    let command = args[0].as_str();
    let packages = args[1..].to_vec();

    match command {
        "list" => {
            let manager = SdkManager::locate(&config)?;
            let cfg = config.clone();
            let list = tokio::task::spawn_blocking(move || manager.list(&cfg)).await??;
            print_listing(&list);
        }
        "install" | "uninstall" => {
            if packages.is_empty() {
                bail!("{} 需要至少一个包路径", command);
            }
            let manager = SdkManager::locate(&config)?;
            let ok = run_mutation(manager, config, command, packages).await?;
            if !ok {
                std::process::exit(1);
            }
        }
        "update" => {
            let manager = SdkManager::locate(&config)?;
            let ok = run_mutation(manager, config, "update", Vec::new()).await?;
            if !ok {
                std::process::exit(1);
            }
        }
        _ => {
            eprintln!("未知命令: {}", command);
            print_usage();
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_usage() {
    eprintln!("用法: lian-sdkmanager <命令> [包路径...]");
    eprintln!("命令:");
    eprintln!("  list                 列出已安装 / 可安装 / 可升级的包");
    eprintln!("  install <包路径>...   安装包");
    eprintln!("  uninstall <包路径>... 卸载包");
    eprintln!("  update               升级全部已安装包");
}

fn print_listing(list: &SdkManagerList) {
    println!("已安装 ({}):", list.installed.len());
    for pkg in &list.installed {
        println!("  {} {}  [{}]", pkg.path, pkg.version, pkg.location);
    }
    println!();
    println!("可安装 ({}):", list.available.len());
    for pkg in &list.available {
        println!("  {} {}  {}", pkg.path, pkg.version, pkg.description);
    }
    println!();
    println!("可升级 ({}):", list.updates.len());
    for pkg in &list.updates {
        println!(
            "  {} {} -> {}",
            pkg.path, pkg.installed_version, pkg.available_version
        );
    }
}

/// 执行一次变更操作：Info: 行实时打印，结束后归档完整日志
async fn run_mutation(
    manager: SdkManager,
    config: config::Config,
    operation: &str,
    packages: Vec<String>,
) -> Result<bool> {
    let (info_tx, mut info_rx) = mpsc::unbounded_channel();

    let printer = tokio::spawn(async move {
        while let Some(line) = info_rx.recv().await {
            println!("{}", line);
        }
    });

    let op = operation.to_string();
    let cfg = config.clone();
    let output = tokio::task::spawn_blocking(move || match op.as_str() {
        "install" => manager.install(&packages, &cfg, info_tx),
        "uninstall" => manager.uninstall(&packages, &cfg, info_tx),
        _ => manager.update_all(&cfg, info_tx),
    })
    .await??;

    let _ = printer.await;

    let saver = ReportSaver::new(config.report_dir.clone());
    match saver.save(&output.combined_output(), operation) {
        Ok(path) => println!("日志已保存: {}", path.display()),
        Err(e) => log::error!("保存日志失败: {}", e),
    }

    if output.success {
        println!("{} 完成", operation);
    } else {
        eprintln!("{} 失败，详见日志", operation);
    }

    Ok(output.success)
}
