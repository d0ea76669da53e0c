//! 事件目录 - 六种会话/电源事件的静态映射
//!
//! 每种事件有固定的数字 tag(持久化用,一经发布不可改号)、
//! 原始名称(记录与 payload 用)和对应的系统通知频道。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 系统会话/电源事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// 屏幕休眠
    ScreenSleep,
    /// 屏幕唤醒
    ScreenWake,
    /// 系统休眠
    SystemSleep,
    /// 系统唤醒
    SystemWake,
    /// 锁屏
    SystemLock,
    /// 解锁
    SystemUnlock,
}

/// 事件描述符 - tag/名称/系统通知频道的一行映射
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDescriptor {
    pub kind: EventKind,
    pub tag: u32,
    pub name: &'static str,
    pub os_channel: &'static str,
}

impl EventKind {
    /// 全部事件,目录顺序固定
    pub const ALL: [EventKind; 6] = [
        EventKind::ScreenSleep,
        EventKind::ScreenWake,
        EventKind::SystemSleep,
        EventKind::SystemWake,
        EventKind::SystemLock,
        EventKind::SystemUnlock,
    ];

    /// 持久化用的稳定数字 tag
    pub fn tag(self) -> u32 {
        match self {
            EventKind::ScreenSleep => 110,
            EventKind::ScreenWake => 111,
            EventKind::SystemSleep => 120,
            EventKind::SystemWake => 121,
            EventKind::SystemLock => 130,
            EventKind::SystemUnlock => 131,
        }
    }

    /// 原始名称,用于历史记录、脚本参数和 webhook payload
    pub fn name(self) -> &'static str {
        match self {
            EventKind::ScreenSleep => "SCREEN_SLEEP",
            EventKind::ScreenWake => "SCREEN_WAKE",
            EventKind::SystemSleep => "SYSTEM_SLEEP",
            EventKind::SystemWake => "SYSTEM_WAKE",
            EventKind::SystemLock => "SYSTEM_LOCK",
            EventKind::SystemUnlock => "SYSTEM_UNLOCK",
        }
    }

    /// 绑定的系统通知频道标识,供 OS 适配层订阅
    pub fn os_channel(self) -> &'static str {
        match self {
            EventKind::ScreenSleep => "NSWorkspaceScreensDidSleepNotification",
            EventKind::ScreenWake => "NSWorkspaceScreensDidWakeNotification",
            EventKind::SystemSleep => "NSWorkspaceWillSleepNotification",
            EventKind::SystemWake => "NSWorkspaceDidWakeNotification",
            EventKind::SystemLock => "com.apple.screenIsLocked",
            EventKind::SystemUnlock => "com.apple.screenIsUnlocked",
        }
    }

    pub fn from_tag(tag: u32) -> Option<EventKind> {
        EventKind::ALL.iter().copied().find(|e| e.tag() == tag)
    }

    pub fn from_name(name: &str) -> Option<EventKind> {
        EventKind::ALL.iter().copied().find(|e| e.name() == name)
    }

    pub fn from_os_channel(channel: &str) -> Option<EventKind> {
        EventKind::ALL.iter().copied().find(|e| e.os_channel() == channel)
    }
}

/// 完整目录,UI 枚举与适配层映射共用
pub fn catalog() -> [EventDescriptor; 6] {
    EventKind::ALL.map(|kind| EventDescriptor {
        kind,
        tag: kind.tag(),
        name: kind.name(),
        os_channel: kind.os_channel(),
    })
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// 配置文档里事件以数字 tag 存储
impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.tag())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = u32::deserialize(deserializer)?;
        EventKind::from_tag(tag)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown event tag: {}", tag)))
    }
}
