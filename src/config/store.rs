//! 配置持久化与导入导出
//!
//! load 永不失败:文件缺失或损坏一律回到默认配置。
//! save 失败只记日志,内存里的配置始终是运行期的权威状态。

use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use thiserror::Error;
use tracing::{debug, warn};

use super::AppConfig;

/// 配置导入失败的原因,区别于运行期解码(导入要向用户报错)
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("configuration data is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("configuration data has the wrong shape, expected a JSON object")]
    WrongShape,
}

/// 配置文件读写
pub struct ConfigStore {
    path: PathBuf,
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("session-event-monitor")
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            path: config_dir().join("config.json"),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// 读取配置,任何失败都回到默认值
    pub fn load(&self) -> AppConfig {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no config file, using defaults");
                return AppConfig::default();
            }
        };

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "config file corrupt, using defaults");
                AppConfig::default()
            }
        }
    }

    /// 写回配置,失败仅记日志,不向调用方传播
    pub fn save(&self, config: &AppConfig) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "failed to create config directory");
                return;
            }
        }

        let content = match serde_json::to_string_pretty(config) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "failed to serialize config");
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, content) {
            warn!(path = %self.path.display(), error = %e, "failed to write config file");
        }
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 导出为规范 JSON:键序固定,带缩进
pub fn export_json(config: &AppConfig) -> String {
    // 字段顺序由结构体定义决定,对同一配置输出稳定
    serde_json::to_string_pretty(config).unwrap_or_else(|_| "{}".to_string())
}

/// 导入配置:非法 JSON 或顶层不是对象都算导入失败,
/// 对象内部仍然逐字段容错
pub fn import_json(data: &str) -> Result<AppConfig, ImportError> {
    let value: Value = serde_json::from_str(data)?;
    if !value.is_object() {
        return Err(ImportError::WrongShape);
    }
    Ok(AppConfig::from_value(&value))
}

/// 配置服务 - 进程内唯一的配置持有者
///
/// 所有变更都经由 update 串行落盘,替代散落各处的字段改写。
pub struct ConfigService {
    store: ConfigStore,
    state: RwLock<AppConfig>,
}

impl ConfigService {
    pub fn new(store: ConfigStore) -> Self {
        let state = RwLock::new(store.load());
        Self { store, state }
    }

    /// 当前配置的一份拷贝,派发逻辑每次取新快照
    pub fn snapshot(&self) -> AppConfig {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 串行化的变更入口:改内存,随即落盘
    pub fn update<F: FnOnce(&mut AppConfig)>(&self, mutate: F) {
        let mut guard = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        mutate(&mut guard);
        self.store.save(&guard);
    }

    /// 整体替换(导入成功后使用)
    pub fn replace(&self, config: AppConfig) {
        self.update(|c| *c = config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotifyChannel;
    use crate::event::EventKind;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let store = ConfigStore::with_path(PathBuf::from("/nonexistent/path/config.json"));
        assert_eq!(store.load(), AppConfig::default());
    }

    #[test]
    fn test_export_import_roundtrip() {
        let mut config = AppConfig::default();
        config.exec_script = true;
        config.record_events = true;
        config.notify_channel = NotifyChannel::Pushover;
        config.notify_credentials.pushover.token = "t0k3n".to_string();
        config.notify_credentials.pushover.user = "u5er".to_string();
        config.quiet_hours.start = "22:00".to_string();
        config.quiet_hours.cycle.friday = true;
        config.webhook.enabled = true;
        config.webhook.url = "https://hooks.example.com/ping".to_string();
        config.webhook.enabled_events.insert(EventKind::SystemWake);

        let exported = export_json(&config);
        let imported = import_json(&exported).unwrap();
        assert_eq!(imported, config);
    }

    #[test]
    fn test_export_is_stable() {
        let config = AppConfig::default();
        assert_eq!(export_json(&config), export_json(&config.clone()));
    }

    #[test]
    fn test_import_rejects_invalid_json() {
        assert!(matches!(
            import_json("not json at all"),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn test_import_rejects_non_object() {
        assert!(matches!(import_json("[1, 2, 3]"), Err(ImportError::WrongShape)));
        assert!(matches!(import_json("42"), Err(ImportError::WrongShape)));
    }

    #[test]
    fn test_service_update_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let service = ConfigService::new(ConfigStore::with_path(path.clone()));

        service.update(|c| c.record_events = true);
        assert!(service.snapshot().record_events);

        // 重新加载应读到已持久化的变更
        let reloaded = ConfigStore::with_path(path).load();
        assert!(reloaded.record_events);
    }

    #[test]
    fn test_service_replace() {
        let dir = tempfile::tempdir().unwrap();
        let service =
            ConfigService::new(ConfigStore::with_path(dir.path().join("config.json")));
        let mut next = AppConfig::default();
        next.notify_channel = NotifyChannel::Bark;
        service.replace(next.clone());
        assert_eq!(service.snapshot(), next);
    }
}
