//! Session Event Monitor CLI
//!
//! 系统侧的事件源(launchd/sleepwatcher 之类的钩子)通过
//! `sem trigger` 或向 `sem watch` 的标准输入写事件名来投递事件,
//! 其余子命令覆盖测试、历史查询与配置导入导出。

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use session_event_monitor::{
    catalog, default_notifier, export_json, import_json, ConfigService, ConfigStore,
    EventDispatcher, EventKind, RecordStore,
};

#[derive(Parser)]
#[command(name = "sem")]
#[command(about = "Session Event Monitor - 响应锁屏/休眠等系统事件")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 投递一次事件(系统钩子调用)
    Trigger {
        /// 事件名,如 SYSTEM_LOCK
        #[arg(long)]
        event: String,
    },
    /// 从标准输入逐行读取事件名并持续派发
    Watch,
    /// 列出全部事件及其 tag 与系统频道
    Events {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 发送一条测试推送,验证渠道凭据
    NotifyTest,
    /// 发送一条测试 webhook,验证端点配置
    WebhookTest,
    /// 事件历史
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// 配置查看与导入导出
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// 打印本地脚本的约定路径
    ScriptPath,
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// 列出记录,最新在前
    List {
        /// 最多显示 N 条
        #[arg(long, short, default_value = "20")]
        limit: usize,
        /// 只看最近 N 天
        #[arg(long)]
        days: Option<i64>,
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 记录总数
    Count,
    /// 今天/近三天/总计统计
    Stats {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 清空全部历史
    Clear,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// 打印当前生效配置
    Show,
    /// 导出配置到文件或标准输出
    Export {
        /// 输出文件,缺省打到标准输出
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// 从文件导入配置,失败时现有配置不变
    Import {
        /// 导出文件路径
        input: PathBuf,
    },
}

fn build_dispatcher() -> Result<(Arc<ConfigService>, Arc<RecordStore>, EventDispatcher)> {
    let config = Arc::new(ConfigService::new(ConfigStore::new()));
    let records = Arc::new(RecordStore::open_default()?);
    let dispatcher = EventDispatcher::new(config.clone(), records.clone(), default_notifier());
    Ok((config, records, dispatcher))
}

fn parse_event(name: &str) -> Result<EventKind> {
    EventKind::from_name(name).with_context(|| {
        let known: Vec<&str> = EventKind::ALL.iter().map(|e| e.name()).collect();
        format!("unknown event {:?}, expected one of {}", name, known.join(", "))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 控制日志级别,默认 info
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("session_event_monitor=info,sem=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Trigger { event } => {
            let kind = parse_event(&event)?;
            let (_config, _records, dispatcher) = build_dispatcher()?;
            dispatcher.dispatch(kind, Local::now());
            // 给 fire-and-forget 的出站请求留出发出的时间
            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        }
        Commands::Watch => {
            let (_config, _records, dispatcher) = build_dispatcher()?;
            info!("watching stdin for event names, one per line");

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let name = line.trim();
                if name.is_empty() {
                    continue;
                }
                match EventKind::from_name(name) {
                    Some(kind) => dispatcher.dispatch(kind, Local::now()),
                    None => warn!(name, "ignoring unknown event"),
                }
            }
        }
        Commands::Events { json } => {
            let entries = catalog();
            if json {
                let out: Vec<serde_json::Value> = entries
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "tag": e.tag,
                            "name": e.name,
                            "osChannel": e.os_channel,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for e in entries {
                    println!("{:>4}  {:<14} {}", e.tag, e.name, e.os_channel);
                }
            }
        }
        Commands::NotifyTest => {
            let (_config, _records, dispatcher) = build_dispatcher()?;
            dispatcher.send_test_notify();
            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        }
        Commands::WebhookTest => {
            let (_config, _records, dispatcher) = build_dispatcher()?;
            dispatcher.send_test_webhook();
            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        }
        Commands::History { command } => {
            let records = RecordStore::open_default()?;
            match command {
                HistoryCommands::List { limit, days, json } => {
                    let since = days.map(|d| Local::now() - chrono::Duration::days(d));
                    let rows = records.records(since, Some(limit))?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&rows)?);
                    } else {
                        for row in rows {
                            println!(
                                "{:>6}  {}  {}",
                                row.id,
                                row.time.format("%Y-%m-%d %H:%M:%S"),
                                row.event
                            );
                        }
                    }
                }
                HistoryCommands::Count => {
                    println!("{}", records.count()?);
                }
                HistoryCommands::Stats { json } => {
                    let stats = records.stats(Local::now())?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&stats)?);
                    } else {
                        println!("today: {}", stats.today);
                        println!("last 3 days: {}", stats.last_three_days);
                        println!("total: {}", stats.total);
                    }
                }
                HistoryCommands::Clear => {
                    records.clear()?;
                    println!("history cleared");
                }
            }
        }
        Commands::Config { command } => {
            let service = ConfigService::new(ConfigStore::new());
            match command {
                ConfigCommands::Show => {
                    println!("{}", export_json(&service.snapshot()));
                }
                ConfigCommands::Export { output } => {
                    let exported = export_json(&service.snapshot());
                    match output {
                        Some(path) => {
                            std::fs::write(&path, &exported).with_context(|| {
                                format!("failed to write export to {}", path.display())
                            })?;
                            println!("config exported to {}", path.display());
                        }
                        None => println!("{}", exported),
                    }
                }
                ConfigCommands::Import { input } => {
                    let data = std::fs::read_to_string(&input)
                        .with_context(|| format!("failed to read {}", input.display()))?;
                    match import_json(&data) {
                        Ok(config) => {
                            service.replace(config);
                            println!("config imported from {}", input.display());
                        }
                        Err(e) => bail!("import failed: {}", e),
                    }
                }
            }
        }
        Commands::ScriptPath => {
            println!("{}", session_event_monitor::script_path().display());
        }
    }

    Ok(())
}
