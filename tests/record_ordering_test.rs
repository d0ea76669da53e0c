//! 历史存储集成测试 - 并发写入下的计数与排序

use chrono::{Local, TimeZone};
use session_event_monitor::{
    AppConfig, ConfigService, ConfigStore, EventDispatcher, EventKind, LogNotifier, RecordStore,
};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_dispatch_produces_exactly_n_records() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(ConfigService::new(ConfigStore::with_path(
        dir.path().join("config.json"),
    )));
    service.update(|c| c.record_events = true);
    let records = Arc::new(RecordStore::in_memory().unwrap());
    let dispatcher = Arc::new(EventDispatcher::new(
        service,
        records.clone(),
        Arc::new(LogNotifier),
    ));

    // 同一时刻的 N 次并发派发
    let now = Local::now();
    let n = 32;
    let mut handles = Vec::new();
    for i in 0..n {
        let dispatcher = dispatcher.clone();
        let kind = if i % 2 == 0 {
            EventKind::SystemLock
        } else {
            EventKind::SystemUnlock
        };
        handles.push(tokio::task::spawn_blocking(move || {
            dispatcher.dispatch(kind, now);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(records.count().unwrap() as usize, n);

    // 最新在前:id 严格递减,时间不升
    let rows = records.records(None, None).unwrap();
    assert_eq!(rows.len(), n);
    for pair in rows.windows(2) {
        assert!(pair[0].id > pair[1].id);
        assert!(pair[0].time >= pair[1].time);
    }
}

#[test]
fn test_rapid_sequential_inserts_keep_order() {
    let store = RecordStore::in_memory().unwrap();
    let base = Local.with_ymd_and_hms(2026, 8, 5, 9, 0, 0).unwrap();
    for i in 0..50i64 {
        store
            .insert("SYSTEM_WAKE", true, base + chrono::Duration::seconds(i))
            .unwrap();
    }

    let rows = store.records(None, None).unwrap();
    assert_eq!(rows.len(), 50);
    for pair in rows.windows(2) {
        assert!(pair[0].time > pair[1].time);
        assert!(pair[0].id > pair[1].id);
    }

    // 范围下界过滤
    let since = base + chrono::Duration::seconds(40);
    assert_eq!(store.records(Some(since), None).unwrap().len(), 10);
}
