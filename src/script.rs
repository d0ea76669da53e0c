//! 本地脚本执行
//!
//! 用户把可执行脚本放在固定位置,事件触发时以事件名为
//! 唯一参数启动。不等待退出,不采集输出,只记录启动失败。

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 脚本所在目录
pub fn script_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("session-event-monitor")
        .join("scripts")
}

/// 固定的脚本路径
pub fn script_path() -> PathBuf {
    script_dir().join("script")
}

/// 脚本启动器
pub struct ScriptRunner {
    path: PathBuf,
}

impl ScriptRunner {
    pub fn new() -> Self {
        Self {
            path: script_path(),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 异步启动脚本,调用方立刻返回
    pub fn run(&self, arg: &str) {
        match tokio::process::Command::new(&self.path).arg(arg).spawn() {
            Ok(mut child) => {
                debug!(script = %self.path.display(), arg, "script launched");
                // 后台等待退出,避免留下僵尸进程
                tokio::spawn(async move {
                    let _ = child.wait().await;
                });
            }
            Err(e) => {
                warn!(script = %self.path.display(), error = %e, "failed to launch script");
            }
        }
    }
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new()
    }
}
