//! Session Event Monitor - 响应系统会话/电源事件
//!
//! 核心是事件派发与勿扰策略:收到一次锁屏/休眠类事件后,
//! 依据配置与当前时间决定记录、推送、webhook、脚本四个
//! 分支各自是否执行,分支之间互相隔离。

pub mod config;
pub mod dispatch;
pub mod disturb;
pub mod event;
pub mod notify;
pub mod record;
pub mod script;
pub mod webhook;

pub use config::store::{export_json, import_json, ConfigService, ConfigStore, ImportError};
pub use config::{AppConfig, NotifyChannel, QuietHours, WebhookConfig};
pub use dispatch::{plan, DispatchPlan, EventDispatcher};
pub use event::{catalog, EventDescriptor, EventKind};
pub use notify::system::{default_notifier, LogNotifier, OsascriptNotifier, SystemNotifier};
pub use notify::{notify_title, NotifyError, NotifyManager};
pub use record::{Record, RecordStats, RecordStore};
pub use script::{script_path, ScriptRunner};
pub use webhook::{DeviceInfo, WebhookManager, WebhookPayload};
