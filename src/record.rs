//! 事件历史存储
//!
//! SQLite 单表追加:行一旦写入不再修改,只支持整表清空。
//! 写串行(连接互斥),查询按时间倒序,时间列带索引。

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveTime};
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 一条事件记录
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub id: i64,
    pub event: String,
    pub is_notify: bool,
    pub time: DateTime<Local>,
}

/// 历史统计:今天 / 近三天 / 总计
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecordStats {
    pub today: u64,
    pub last_three_days: u64,
    pub total: u64,
}

/// 历史存储
pub struct RecordStore {
    conn: Mutex<Connection>,
}

fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("session-event-monitor")
}

impl RecordStore {
    /// 打开默认位置的数据库
    pub fn open_default() -> Result<Self> {
        Self::open(data_dir().join("records.db"))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create data directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open record database {}", path.display()))?;
        Self::init(conn)
    }

    /// 内存数据库,测试用
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS record (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event TEXT NOT NULL,
                is_notify INTEGER NOT NULL,
                time TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_record_time ON record(time);",
        )
        .context("failed to initialize record schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 追加一条记录,返回自增 id
    pub fn insert(&self, event: &str, is_notify: bool, time: DateTime<Local>) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO record (event, is_notify, time) VALUES (?1, ?2, ?3)",
            rusqlite::params![event, is_notify, time.to_rfc3339()],
        )
        .context("failed to insert record")?;
        Ok(conn.last_insert_rowid())
    }

    /// 查询记录,总是按时间倒序(最新在前)
    pub fn records(
        &self,
        since: Option<DateTime<Local>>,
        limit: Option<usize>,
    ) -> Result<Vec<Record>> {
        let mut sql =
            String::from("SELECT id, event, is_notify, time FROM record");
        if since.is_some() {
            sql.push_str(" WHERE time >= ?1");
        }
        sql.push_str(" ORDER BY time DESC, id DESC");
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }

        let conn = self.lock();
        let mut stmt = conn.prepare(&sql).context("failed to prepare record query")?;
        let map_row = |row: &rusqlite::Row| -> rusqlite::Result<(i64, String, bool, String)> {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        };
        let rows = match since {
            Some(s) => stmt.query_map(rusqlite::params![s.to_rfc3339()], map_row),
            None => stmt.query_map([], map_row),
        }
        .context("failed to query records")?;

        let mut out = Vec::new();
        for row in rows {
            let (id, event, is_notify, time) = row.context("failed to read record row")?;
            let time = DateTime::parse_from_rfc3339(&time)
                .with_context(|| format!("record {} has unparseable time {:?}", id, time))?
                .with_timezone(&Local);
            out.push(Record {
                id,
                event,
                is_notify,
                time,
            });
        }
        Ok(out)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM record", [], |row| row.get(0))
            .context("failed to count records")?;
        Ok(count.max(0) as u64)
    }

    /// 清空全部历史
    pub fn clear(&self) -> Result<()> {
        let conn = self.lock();
        conn.execute("DELETE FROM record", [])
            .context("failed to clear records")?;
        Ok(())
    }

    /// 今天 / 近三天 / 总计数量,供界面统计展示
    pub fn stats(&self, now: DateTime<Local>) -> Result<RecordStats> {
        let today = self.count_since(start_of_day(now, 0))?;
        let last_three_days = self.count_since(start_of_day(now, 2))?;
        let total = self.count()?;
        Ok(RecordStats {
            today,
            last_three_days,
            total,
        })
    }

    fn count_since(&self, since: DateTime<Local>) -> Result<u64> {
        let conn = self.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM record WHERE time >= ?1",
                rusqlite::params![since.to_rfc3339()],
                |row| row.get(0),
            )
            .context("failed to count records by range")?;
        Ok(count.max(0) as u64)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// 往前数 days_back 天的当天零点
fn start_of_day(now: DateTime<Local>, days_back: i64) -> DateTime<Local> {
    let date = now.date_naive() - Duration::days(days_back);
    match date.and_time(NaiveTime::MIN).and_local_timezone(Local) {
        chrono::LocalResult::Single(t) | chrono::LocalResult::Ambiguous(t, _) => t,
        chrono::LocalResult::None => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 5, h, m, s).unwrap()
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let store = RecordStore::in_memory().unwrap();
        let a = store.insert("SYSTEM_LOCK", true, at(10, 0, 0)).unwrap();
        let b = store.insert("SYSTEM_UNLOCK", true, at(10, 1, 0)).unwrap();
        let c = store.insert("SYSTEM_LOCK", true, at(10, 2, 0)).unwrap();
        assert!(a < b && b < c);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_records_newest_first() {
        let store = RecordStore::in_memory().unwrap();
        store.insert("SCREEN_SLEEP", true, at(8, 0, 0)).unwrap();
        store.insert("SCREEN_WAKE", true, at(9, 0, 0)).unwrap();
        store.insert("SYSTEM_LOCK", true, at(10, 0, 0)).unwrap();

        let records = store.records(None, None).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].event, "SYSTEM_LOCK");
        assert_eq!(records[2].event, "SCREEN_SLEEP");
        // 时间与 id 都不升
        for pair in records.windows(2) {
            assert!(pair[0].time >= pair[1].time);
            assert!(pair[0].id > pair[1].id);
        }
    }

    #[test]
    fn test_records_since_and_limit() {
        let store = RecordStore::in_memory().unwrap();
        for h in 6..12 {
            store.insert("SYSTEM_WAKE", true, at(h, 0, 0)).unwrap();
        }

        let recent = store.records(Some(at(9, 0, 0)), None).unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent.iter().all(|r| r.time >= at(9, 0, 0)));

        let limited = store.records(None, Some(2)).unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].time, at(11, 0, 0));
    }

    #[test]
    fn test_clear_removes_everything() {
        let store = RecordStore::in_memory().unwrap();
        store.insert("SYSTEM_LOCK", true, at(10, 0, 0)).unwrap();
        store.insert("SYSTEM_UNLOCK", true, at(11, 0, 0)).unwrap();
        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.records(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_stats_windows() {
        let store = RecordStore::in_memory().unwrap();
        let now = at(12, 0, 0);
        // 今天两条
        store.insert("SYSTEM_LOCK", true, at(9, 0, 0)).unwrap();
        store.insert("SYSTEM_UNLOCK", true, at(10, 0, 0)).unwrap();
        // 昨天一条
        store
            .insert(
                "SYSTEM_LOCK",
                true,
                Local.with_ymd_and_hms(2026, 8, 4, 9, 0, 0).unwrap(),
            )
            .unwrap();
        // 五天前一条,只计入总数
        store
            .insert(
                "SYSTEM_LOCK",
                true,
                Local.with_ymd_and_hms(2026, 7, 31, 9, 0, 0).unwrap(),
            )
            .unwrap();

        let stats = store.stats(now).unwrap();
        assert_eq!(stats.today, 2);
        assert_eq!(stats.last_three_days, 3);
        assert_eq!(stats.total, 4);
    }
}
