//! 勿扰时段判定
//!
//! 纯函数:给定当前时间与配置,判断此刻是否处于勿扰窗口。
//! 每次派发事件时重新求值,不做缓存。
//!
//! 已知限制:跨午夜窗口(end 早于 start)不受支持,此时窗口为空。

use chrono::{DateTime, Datelike, Local, NaiveTime, Timelike, Weekday};
use tracing::warn;

use crate::config::{AppConfig, QuietHours};

/// 此刻是否勿扰:总开关关闭时恒为 false
pub fn is_quiet(now: DateTime<Local>, config: &AppConfig) -> bool {
    config.do_not_disturb_enabled && in_window(now, &config.quiet_hours)
}

/// 不看总开关,仅判断 now 是否落在配置的星期与时间窗口内
pub fn in_window(now: DateTime<Local>, hours: &QuietHours) -> bool {
    if !weekday_enabled(now.weekday(), hours) {
        return false;
    }

    let (Some(start), Some(end)) = (
        parse_time_of_day(&hours.start),
        parse_time_of_day(&hours.end),
    ) else {
        warn!(
            start = %hours.start,
            end = %hours.end,
            "quiet hours time of day not parseable, treating as not quiet"
        );
        return false;
    };

    // 起止均为开区间:start 分钟之后、end 分钟之前
    let t = now.time();
    t > start && t < end
}

fn weekday_enabled(day: Weekday, hours: &QuietHours) -> bool {
    match day {
        Weekday::Sun => hours.cycle.sunday,
        Weekday::Mon => hours.cycle.monday,
        Weekday::Tue => hours.cycle.tuesday,
        Weekday::Wed => hours.cycle.wednesday,
        Weekday::Thu => hours.cycle.thursday,
        Weekday::Fri => hours.cycle.friday,
        Weekday::Sat => hours.cycle.saturday,
    }
}

/// 解析 "HH:MM",秒固定为 0
fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let (h, m) = s.split_once(':')?;
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    // split_once 已确保没有秒段
    debug_assert_eq!(time.second(), 0);
    Some(time)
}
