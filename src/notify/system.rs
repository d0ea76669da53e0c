//! 本地系统通知
//!
//! 配置错误与手动测试的反馈通道:推送渠道本身不可用时,
//! 用户必须在本机看到原因。

use std::sync::Arc;
use tracing::{info, warn};

/// 本机通知的抽象,桌面实现与测试替身共用
pub trait SystemNotifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// macOS 上通过 osascript 弹出通知横幅
pub struct OsascriptNotifier;

impl SystemNotifier for OsascriptNotifier {
    fn notify(&self, title: &str, message: &str) {
        // {:?} 转义引号,避免拼出破碎的 AppleScript
        let script = format!("display notification {:?} with title {:?}", message, title);
        match std::process::Command::new("osascript")
            .arg("-e")
            .arg(&script)
            .spawn()
        {
            Ok(mut child) => {
                // 后台回收,守护进程长跑时不积累僵尸进程
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
            }
            Err(e) => warn!(error = %e, "failed to spawn osascript for local notification"),
        }
    }
}

/// 无桌面环境时退化为日志输出
pub struct LogNotifier;

impl SystemNotifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!(title, message, "local notification");
    }
}

/// 按平台选择默认实现
pub fn default_notifier() -> Arc<dyn SystemNotifier> {
    if cfg!(target_os = "macos") {
        Arc::new(OsascriptNotifier)
    } else {
        Arc::new(LogNotifier)
    }
}

#[cfg(test)]
pub mod testing {
    use super::SystemNotifier;
    use std::sync::Mutex;

    /// 记录所有通知调用的测试替身
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    impl SystemNotifier for RecordingNotifier {
        fn notify(&self, title: &str, message: &str) {
            self.sent
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
        }
    }
}
