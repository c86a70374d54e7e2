// Background loops end to end: real threads, events observed on the channel.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver};
use glam::DVec2;

use tilestream::config::StreamConfig;
use tilestream::streaming::{ChunkCoordinator, ChunkKey, ChunkRegion, Residency, StreamEvent};
use tilestream::world::{ChunkData, ChunkDataProvider, GridTileProvider};

const WAIT: Duration = Duration::from_secs(5);

struct Payload(Vec<i32>);

impl ChunkData for Payload {
    type Vertex = i32;

    fn vertices(&self) -> &[i32] {
        &self.0
    }
}

/// Counts calls per provider; optionally slow so requests overlap generation.
#[derive(Clone, Default)]
struct CountingProvider {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl ChunkDataProvider for CountingProvider {
    type Data = Payload;

    fn chunk_size_px(&self) -> i32 {
        100
    }

    fn generate_chunk_data(&self, key: ChunkKey) -> Payload {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Payload(vec![key.x, key.y])
    }
}

fn collect(rx: &Receiver<StreamEvent>, n: usize) -> Vec<StreamEvent> {
    let deadline = Instant::now() + WAIT;
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        let left = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(left) {
            Ok(ev) => out.push(ev),
            Err(_) => panic!("timed out after {} of {} events: {:?}", out.len(), n, out),
        }
    }
    out
}

fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn generated(events: &[StreamEvent]) -> Vec<ChunkKey> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Generated(k) => Some(*k),
            _ => None,
        })
        .collect()
}

#[test]
fn closest_chunk_comes_first() {
    let (tx, rx) = unbounded();
    let coord = ChunkCoordinator::start(CountingProvider::default(), &StreamConfig::default(), tx).unwrap();

    coord.set_user_position(DVec2::ZERO);
    coord.request_visible_region(ChunkRegion::new(0..4, 0..4));

    let keys = generated(&collect(&rx, 16));
    assert_eq!(keys.first(), Some(&ChunkKey::new(0, 0)));
    assert_eq!(keys.last(), Some(&ChunkKey::new(3, 3)));
    assert_eq!(coord.stats().resident, 16);
}

#[test]
fn each_chunk_is_generated_once_under_repeated_requests() {
    let provider = CountingProvider { delay: Duration::from_millis(2), ..Default::default() };
    let calls = provider.calls.clone();
    let (tx, rx) = unbounded();
    let coord = ChunkCoordinator::start(provider, &StreamConfig::default(), tx).unwrap();

    let region = ChunkRegion::new(-2..2, -2..2);
    for _ in 0..20 {
        coord.request_visible_region(region.clone());
        std::thread::sleep(Duration::from_millis(1));
    }

    let keys = generated(&collect(&rx, 16));
    let mut unique = keys.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 16);

    wait_until(|| coord.stats().queued == 0 && coord.stats().in_progress == 0);
    assert_eq!(calls.load(Ordering::SeqCst), 16);
    assert!(rx.try_recv().is_err());
}

#[test]
fn concurrent_requests_generate_each_chunk_once() {
    let provider = CountingProvider { delay: Duration::from_millis(1), ..Default::default() };
    let calls = provider.calls.clone();
    let (tx, rx) = unbounded();
    let coord = ChunkCoordinator::start(provider, &StreamConfig::default(), tx).unwrap();

    let region = ChunkRegion::new(0..6, 0..6);
    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..25 {
                    coord.request_visible_region(region.clone());
                    std::thread::yield_now();
                }
            });
        }
    });

    let mut keys = generated(&collect(&rx, 36));
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 36);

    wait_until(|| !coord.is_generating());
    let stats = coord.stats();
    assert_eq!((stats.queued, stats.in_progress), (0, 0));
    assert_eq!(stats.discarded_total, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 36);
    assert!(rx.try_recv().is_err());
}

#[test]
fn steady_region_requests_never_queue_resident_chunks() {
    let cfg = StreamConfig { generation_interval: Duration::from_micros(50), ..Default::default() };
    let (tx, rx) = unbounded();
    let coord = ChunkCoordinator::start(CountingProvider::default(), &cfg, tx).unwrap();

    let region = ChunkRegion::new(0..40, 0..40);
    let deadline = Instant::now() + Duration::from_millis(500);
    while Instant::now() < deadline {
        coord.request_visible_region(region.clone());
    }
    wait_until(|| {
        let s = coord.stats();
        s.resident == 1600 && s.queued == 0 && s.in_progress == 0
    });

    // a queued key that was already resident would be popped and discarded
    assert_eq!(coord.stats().discarded_total, 0);
    assert_eq!(coord.stats().generated_total, 1600);
    assert_eq!(generated(&rx.try_iter().collect::<Vec<_>>()).len(), 1600);
}

#[test]
fn shrinking_region_evicts_out_of_view_chunks() {
    let (tx, rx) = unbounded();
    let coord = ChunkCoordinator::start(GridTileProvider::new(9), &StreamConfig::default(), tx).unwrap();

    coord.request_visible_region(ChunkRegion::new(0..4, 0..4));
    collect(&rx, 16);

    let small = ChunkRegion::new(0..2, 0..2);
    coord.request_visible_region(small.clone());
    let events = collect(&rx, 12);

    for ev in &events {
        match ev {
            StreamEvent::Evicted(k) => assert!(!small.contains(*k), "evicted visible chunk {k:?}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    wait_until(|| !coord.is_evicting());
    let stats = coord.stats();
    assert_eq!(stats.resident, 4);
    assert_eq!(stats.recency_len, 4);
    assert!(coord.vertices(ChunkKey::new(3, 0)).is_empty());
    assert!(!coord.vertices(ChunkKey::new(1, 1)).is_empty());
}

#[test]
fn chunks_outside_the_latest_region_are_never_generated() {
    let provider = CountingProvider { delay: Duration::from_millis(5), ..Default::default() };
    let calls = provider.calls.clone();
    let (tx, rx) = unbounded();
    let coord = ChunkCoordinator::start(provider, &StreamConfig::default(), tx).unwrap();

    coord.request_visible_region(ChunkRegion::new(0..10, 0..10));
    // let a few generate, then move everything away
    collect(&rx, 2);
    let target = ChunkRegion::new(50..52, 50..51);
    coord.set_user_position(DVec2::new(5000.0, 5000.0));
    coord.request_visible_region(target.clone());

    wait_until(|| coord.stats().queued == 0 && coord.stats().in_progress == 0);
    std::thread::sleep(Duration::from_millis(20));

    let stats = coord.stats();
    assert!(stats.discarded_total > 0);
    assert_eq!(coord.residency(ChunkKey::new(50, 50)), Residency::Resident);
    assert_eq!(coord.residency(ChunkKey::new(51, 50)), Residency::Resident);
    // at most the one that was in flight when the region moved
    assert!(calls.load(Ordering::SeqCst) <= 2 + 1 + 2);
    assert!(coord.residency(ChunkKey::new(9, 9)) != Residency::Resident);
}

#[test]
fn reading_an_absent_chunk_is_empty_and_harmless() {
    let (tx, _rx) = unbounded();
    let coord = ChunkCoordinator::start(GridTileProvider::new(1), &StreamConfig::default(), tx).unwrap();

    assert!(coord.vertices(ChunkKey::new(7, 7)).is_empty());
    assert!(coord.chunk_data(ChunkKey::new(7, 7)).is_none());
    assert_eq!(coord.residency(ChunkKey::new(7, 7)), Residency::Absent);
    assert_eq!(coord.stats().recency_len, 0);
}

#[test]
fn shutdown_stops_new_work() {
    let provider = CountingProvider::default();
    let calls = provider.calls.clone();
    let (tx, rx) = unbounded();
    let mut coord = ChunkCoordinator::start(provider, &StreamConfig::default(), tx).unwrap();

    coord.request_visible_region(ChunkRegion::new(0..1, 0..1));
    collect(&rx, 1);
    coord.shutdown();

    let out = coord.request_visible_region(ChunkRegion::new(0..3, 0..3));
    assert_eq!(out.queued, 0);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // resident data stays readable after shutdown
    assert_eq!(coord.vertices(ChunkKey::new(0, 0)), vec![0, 0]);
}
