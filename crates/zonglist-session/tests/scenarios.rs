//! End-to-end scenarios with a driver and passengers sharing one store.

use std::sync::Arc;

use zonglist_core::{ClientContext, DriverInfo, ManualClock, PlaybackStatus, TrackInfo};
use zonglist_session::{SessionEvent, SessionManager, SubtreeKind, storage::MemoryStore};

const SESSION: &str = "tesla_driver_001";

fn track(video_id: &str, title: &str) -> TrackInfo {
    TrackInfo {
        video_id: video_id.to_string(),
        title: title.to_string(),
        artist: "Test Channel".to_string(),
        thumbnail: format!("https://i.ytimg.com/vi/{video_id}/mqdefault.jpg"),
        duration: "4:33".to_string(),
    }
}

struct Ride {
    clock: Arc<ManualClock>,
    driver: SessionManager<MemoryStore>,
    passenger: SessionManager<MemoryStore>,
}

async fn start_ride() -> Ride {
    let clock = Arc::new(ManualClock::new(0));
    let store = Arc::new(MemoryStore::with_clock(clock.clone()));
    let driver = SessionManager::new(store)
        .with_clock(clock.clone())
        .with_context(ClientContext::new("driver"));
    let passenger = driver.for_client(ClientContext::anonymous());

    driver
        .initialize_session(SESSION, DriverInfo::new("Tony", "Tesla Model Y"))
        .await
        .unwrap();
    Ride {
        clock,
        driver,
        passenger,
    }
}

#[tokio::test]
async fn test_lower_added_at_is_promoted_first() {
    let ride = start_ride().await;

    ride.clock.set(100);
    let a = ride.passenger.enqueue(SESSION, track("A", "Track A")).await.unwrap();
    ride.clock.set(50);
    let b = ride.passenger.enqueue(SESSION, track("B", "Track B")).await.unwrap();

    let snapshot = ride.driver.read_queue(SESSION).await.unwrap();
    let promoted = ride.driver.promote_next(SESSION, &snapshot).await.unwrap();
    assert_eq!(promoted.unwrap().entry_key, b.entry_key);

    let queue = ride.driver.read_queue(SESSION).await.unwrap();
    assert_eq!(queue, vec![a]);
    let current = ride.driver.read_current_track(SESSION).await.unwrap().unwrap();
    assert_eq!(current.info.video_id, "B");
}

#[tokio::test]
async fn test_play_immediately_keeps_queue() {
    let ride = start_ride().await;
    ride.passenger.enqueue(SESSION, track("A", "Track A")).await.unwrap();
    ride.passenger.enqueue(SESSION, track("B", "Track B")).await.unwrap();
    let before = ride.driver.read_queue(SESSION).await.unwrap();

    ride.clock.set(5_000);
    let x = ride.passenger.play_immediately(SESSION, track("X", "Track X")).await.unwrap();

    let session = ride.driver.read_session(SESSION).await.unwrap().unwrap();
    assert_eq!(session.ordered_queue(), before);
    assert_eq!(session.current_track, Some(x.clone()));
    assert_eq!(x.started_at, 5_000);
    assert_eq!(session.status, PlaybackStatus::Playing);
}

#[tokio::test]
async fn test_queue_subscription_sees_every_enqueue() {
    let ride = start_ride().await;
    let mut feed = ride.driver.subscribe(SESSION, SubtreeKind::Queue).await.unwrap();
    assert_eq!(feed.next().await.unwrap().unwrap(), SessionEvent::Queue(vec![]));

    let entry = ride.passenger.enqueue(SESSION, track("A", "Track A")).await.unwrap();
    assert_eq!(
        feed.next().await.unwrap().unwrap(),
        SessionEvent::Queue(vec![entry])
    );
}

#[tokio::test]
async fn test_entries_are_tagged_with_requester() {
    let ride = start_ride().await;
    let other = ride.passenger.for_client(ClientContext::unidentified());

    let mine = ride.passenger.enqueue(SESSION, track("A", "Track A")).await.unwrap();
    let theirs = other.enqueue(SESSION, track("B", "Track B")).await.unwrap();

    assert_eq!(mine.added_by, ride.passenger.context().identity);
    assert_eq!(theirs.added_by, "anonymous");
    assert_ne!(mine.entry_key, theirs.entry_key);
}

#[tokio::test]
async fn test_concurrent_removal_of_promoted_entry_is_harmless() {
    let ride = start_ride().await;
    let a = ride.passenger.enqueue(SESSION, track("A", "Track A")).await.unwrap();

    // Driver promotes while the passenger still shows the entry and removes it
    let snapshot = ride.driver.read_queue(SESSION).await.unwrap();
    ride.driver.promote_next(SESSION, &snapshot).await.unwrap();
    ride.passenger.dequeue_by_key(SESSION, &a.entry_key).await.unwrap();

    assert!(ride.driver.read_queue(SESSION).await.unwrap().is_empty());
    let current = ride.driver.read_current_track(SESSION).await.unwrap().unwrap();
    assert_eq!(current.info, a.info);
}

#[tokio::test]
async fn test_late_arriving_earlier_entry_reorders_queue() {
    let ride = start_ride().await;
    ride.clock.set(2_000);
    let late_clock = ride.passenger.enqueue(SESSION, track("A", "Track A")).await.unwrap();
    // A slow client's request stamped earlier lands afterwards
    ride.clock.set(1_000);
    let early_clock = ride.passenger.enqueue(SESSION, track("B", "Track B")).await.unwrap();

    let keys: Vec<_> = ride
        .driver
        .read_queue(SESSION)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.entry_key)
        .collect();
    assert_eq!(keys, vec![early_clock.entry_key, late_clock.entry_key]);
}

#[tokio::test]
async fn test_empty_promotion_goes_idle_for_all_subscribers() {
    let ride = start_ride().await;
    ride.driver.play_immediately(SESSION, track("X", "Track X")).await.unwrap();

    let mut status = ride.passenger.subscribe_status(SESSION).await.unwrap();
    let mut current = ride.passenger.subscribe_current_track(SESSION).await.unwrap();
    assert_eq!(status.next().await.unwrap().unwrap(), PlaybackStatus::Playing);
    assert!(current.next().await.unwrap().unwrap().is_some());

    assert_eq!(ride.driver.promote_next(SESSION, &[]).await.unwrap(), None);
    assert_eq!(status.next().await.unwrap().unwrap(), PlaybackStatus::Idle);
    assert_eq!(current.next().await.unwrap().unwrap(), None);
}
