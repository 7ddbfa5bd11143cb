use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use logledger::config::Config;
use logledger::{LogEntry, Logger, LoggerError, MsgKind, NO_CHECKPOINT, ObserverResult, PeerEvent};

fn in_memory(capacity: usize) -> Arc<Logger> {
    let mut config = Config::in_memory();
    config.store.capacity = capacity;
    Logger::initialize(config).expect("Failed to initialize logger")
}

fn texts(entries: &[LogEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.text.as_str()).collect()
}

#[test]
fn test_oldest_entries_are_evicted() {
    let logger = in_memory(3);
    for text in ["A", "B", "C", "D"] {
        logger.log(text).unwrap();
    }

    let entries = logger.query(NO_CHECKPOINT).unwrap();
    assert_eq!(texts(&entries), vec!["B", "C", "D"]);
    assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn test_query_returns_entries_after_checkpoint() {
    let logger = in_memory(1000);
    for i in 0..5 {
        logger.log(format!("entry {i}")).unwrap();
    }

    let entries = logger.query(2).unwrap();
    assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![3, 4]);
    assert!(logger.query(4).unwrap().is_empty());
}

#[test]
fn test_empty_store_returns_nothing() {
    let logger = in_memory(10);
    assert!(logger.query(NO_CHECKPOINT).unwrap().is_empty());
    assert!(logger.query_peer_events(NO_CHECKPOINT).unwrap().is_empty());
}

#[test]
fn test_concurrent_appends_get_unique_gapless_ids() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 250;

    let logger = in_memory(THREADS * PER_THREAD);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = logger.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger
                        .append(format!("thread {t} message {i}"), MsgKind::Info)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let entries = logger.query(NO_CHECKPOINT).unwrap();
    assert_eq!(entries.len(), THREADS * PER_THREAD);

    let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
    let expected: Vec<i64> = (0..(THREADS * PER_THREAD) as i64).collect();
    assert_eq!(ids, expected);

    let unique: HashSet<_> = entries.iter().map(|e| e.text.clone()).collect();
    assert_eq!(unique.len(), THREADS * PER_THREAD);
}

#[test]
fn test_concurrent_readers_see_ordered_snapshots() {
    let logger = in_memory(50);

    let writer = {
        let logger = logger.clone();
        thread::spawn(move || {
            for i in 0..2000 {
                logger.log(format!("{i}")).unwrap();
            }
        })
    };

    let reader = {
        let logger = logger.clone();
        thread::spawn(move || {
            let mut checkpoint = NO_CHECKPOINT;
            for _ in 0..500 {
                let entries = logger.query(checkpoint).unwrap();
                assert!(entries.len() <= 50);
                assert!(entries.windows(2).all(|w| w[1].id == w[0].id + 1));
                if let Some(last) = entries.last() {
                    assert!(last.id > checkpoint);
                    checkpoint = last.id;
                }
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
}

#[test]
fn test_failing_and_panicking_observers_are_isolated() {
    let logger = in_memory(100);
    let delivered = Arc::new(AtomicUsize::new(0));

    logger
        .subscribe(|_: &LogEntry| -> ObserverResult { Err("observer failed".into()) })
        .unwrap();
    logger
        .subscribe(|_: &LogEntry| -> ObserverResult { panic!("observer panicked") })
        .unwrap();
    let counter = delivered.clone();
    logger
        .subscribe(move |_: &LogEntry| -> ObserverResult {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    for i in 0..3 {
        assert_eq!(logger.log(format!("message {i}")).unwrap(), i);
    }

    assert_eq!(delivered.load(Ordering::SeqCst), 3);
    assert_eq!(logger.query(NO_CHECKPOINT).unwrap().len(), 3);
}

#[test]
fn test_peer_events_have_their_own_ids() {
    let logger = in_memory(100);
    let seen = Arc::new(AtomicUsize::new(0));

    let counter = seen.clone();
    logger
        .subscribe_peers(move |event: &PeerEvent| -> ObserverResult {
            assert!(event.blocked);
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    logger.log("first message").unwrap();
    logger.log("second message").unwrap();
    let id = logger
        .append_peer_event("203.0.113.7", true, "IP filter")
        .unwrap();

    assert_eq!(id, 0);
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    let events = logger.query_peer_events(NO_CHECKPOINT).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].address, "203.0.113.7");
    assert_eq!(events[0].reason, "IP filter");
    assert_eq!(logger.stats().next_message_id, 2);
    assert_eq!(logger.stats().next_peer_id, 1);
}

#[test]
fn test_shutdown_ends_the_lifecycle() {
    let logger = in_memory(10);
    let mut watch = logger.watch(8).unwrap();
    logger.log("only").unwrap();
    logger.shutdown().unwrap();

    assert_eq!(watch.receiver.try_recv().unwrap().text, "only");
    assert!(watch.receiver.try_recv().is_err());

    assert!(matches!(logger.log("late"), Err(LoggerError::NotInitialized)));
    assert!(matches!(
        logger.append_peer_event("198.51.100.1", false, ""),
        Err(LoggerError::NotInitialized)
    ));
    assert!(matches!(logger.watch(8), Err(LoggerError::NotInitialized)));
    assert!(matches!(logger.shutdown(), Err(LoggerError::NotInitialized)));
}

#[test]
fn test_appends_racing_shutdown_are_all_or_nothing() {
    const THREADS: usize = 4;

    let logger = in_memory(100_000);
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = delivered.clone();
    logger
        .subscribe(move |_: &LogEntry| -> ObserverResult {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = logger.clone();
            thread::spawn(move || {
                let mut accepted = 0usize;
                loop {
                    match logger.log(format!("thread {t}")) {
                        Ok(_) => accepted += 1,
                        Err(LoggerError::NotInitialized) => return accepted,
                        Err(err) => panic!("unexpected error: {err}"),
                    }
                }
            })
        })
        .collect();

    while logger.stats().next_message_id < 1000 {
        thread::yield_now();
    }
    logger.shutdown().unwrap();

    let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(delivered.load(Ordering::SeqCst), accepted);
    assert_eq!(logger.stats().next_message_id as usize, accepted);
    assert_eq!(logger.stats().messages, 0);
}
