//! 事件派发策略 - 核心扇出逻辑
//!
//! 每次事件独立处理:读一份新的配置快照、求一次新的勿扰判定,
//! 然后按固定顺序展开四个互不影响的分支:
//! 记录 → (活跃事件过滤) → 推送通知 → webhook → 本地脚本。
//! 任何分支失败或跳过都不影响其余分支,没有事务也没有回滚。

use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::store::ConfigService;
use crate::config::{AppConfig, NotifyChannel};
use crate::disturb;
use crate::event::EventKind;
use crate::notify::system::SystemNotifier;
use crate::notify::{notify_title, NotifyManager, TEST_MESSAGE};
use crate::record::RecordStore;
use crate::script::ScriptRunner;
use crate::webhook::WebhookManager;

/// 一次派发要触发的分支集合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPlan {
    pub record: bool,
    pub notify: bool,
    pub webhook: bool,
    pub script: bool,
}

/// 纯决策:给定事件、配置快照和当前时间,算出要走哪些分支
///
/// 记录先于活跃事件过滤:开了记录开关就记,哪怕事件未激活。
pub fn plan(kind: EventKind, config: &AppConfig, now: DateTime<Local>) -> DispatchPlan {
    let record = config.record_events;

    if !config.active_events.contains(&kind) {
        return DispatchPlan {
            record,
            notify: false,
            webhook: false,
            script: false,
        };
    }

    let quiet = disturb::is_quiet(now, config);
    let notify_suppressed = quiet && config.quiet_hours.suppress.notify;

    DispatchPlan {
        record,
        notify: config.notify_channel != NotifyChannel::None && !notify_suppressed,
        // webhook 与推送共用同一个勿扰抑制开关
        webhook: config.webhook.enabled && !notify_suppressed,
        script: config.exec_script && !(quiet && config.quiet_hours.suppress.script),
    }
}

/// 事件派发器,持有全部下游执行器
pub struct EventDispatcher {
    config: Arc<ConfigService>,
    records: Arc<RecordStore>,
    notify: NotifyManager,
    webhook: WebhookManager,
    script: ScriptRunner,
    system: Arc<dyn SystemNotifier>,
}

impl EventDispatcher {
    pub fn new(
        config: Arc<ConfigService>,
        records: Arc<RecordStore>,
        system: Arc<dyn SystemNotifier>,
    ) -> Self {
        Self {
            config,
            records,
            notify: NotifyManager::new(),
            webhook: WebhookManager::new(system.clone()),
            script: ScriptRunner::new(),
            system,
        }
    }

    /// 替换脚本启动器(测试与自定义路径用)
    pub fn with_script(mut self, script: ScriptRunner) -> Self {
        self.script = script;
        self
    }

    /// 处理一次事件发生
    pub fn dispatch(&self, kind: EventKind, occurred_at: DateTime<Local>) {
        let config = self.config.snapshot();
        let plan = plan(kind, &config, occurred_at);
        debug!(event = kind.name(), ?plan, "dispatching event");

        if plan.record {
            if let Err(e) = self.records.insert(kind.name(), true, occurred_at) {
                warn!(event = kind.name(), error = %e, "failed to record event");
            }
        }

        if plan.notify {
            self.send_notify(&config, Some(kind));
        }

        if plan.webhook {
            self.webhook.send(kind, occurred_at, &config.webhook);
        }

        if plan.script {
            self.script.run(kind.name());
        }
    }

    /// 手动测试通知:跳过记录/过滤/webhook/脚本,只走推送分支
    pub fn send_test_notify(&self) {
        let config = self.config.snapshot();
        self.send_notify(&config, None);
    }

    /// 手动测试 webhook,配置错误直接回显给用户
    pub fn send_test_webhook(&self) {
        let config = self.config.snapshot();
        if let Err(e) = self.webhook.send_test(&config.webhook) {
            warn!(error = %e, "webhook test rejected");
            self.system.notify("Webhook test failed", &e.to_string());
        }
    }

    fn send_notify(&self, config: &AppConfig, event: Option<EventKind>) {
        let title = notify_title();
        let message = match event {
            Some(kind) => kind.name().to_string(),
            None => TEST_MESSAGE.to_string(),
        };

        match self.notify.send(config, &title, &message) {
            Ok(true) => {}
            Ok(false) => debug!("no notify channel selected, nothing sent"),
            Err(e) => {
                // 配置残缺不能悄悄吞掉,用户必须知道缺的是什么
                warn!(error = %e, "notify dispatch rejected");
                self.system.notify(&title, &e.to_string());
            }
        }
    }
}
