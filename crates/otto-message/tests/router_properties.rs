// tests/router_properties.rs
// Integration coverage for the quantified router invariants from the
// design spec: exact-match, single-segment substitution, prefix '#',
// and remove-then-lookup.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use otto_message::{Message, Router};

fn bump(counter: Arc<AtomicUsize>) -> otto_message::Handler {
    Arc::new(move |_msg| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

#[test]
fn exact_pattern_always_matches_the_identical_topic() {
    let router = Router::new();
    let hits = Arc::new(AtomicUsize::new(0));
    router.insert("site/zone-1/sensor-7", bump(hits.clone())).unwrap();
    let message = Message::new("site/zone-1/sensor-7", "42", "sensor-7").unwrap();
    router.publish(&message);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn replacing_any_single_segment_with_plus_still_matches() {
    let topic = ["site", "zone-1", "sensor-7", "reading"];
    for replace_at in 0..topic.len() {
        let router = Router::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let mut pattern_segments = topic.to_vec();
        pattern_segments[replace_at] = "+";
        router
            .insert(&pattern_segments.join("/"), bump(hits.clone()))
            .unwrap();
        let message = Message::new(topic.join("/"), "x", "s").unwrap();
        router.publish(&message);
        assert_eq!(
            hits.load(Ordering::SeqCst),
            1,
            "pattern with '+' at index {replace_at} should match"
        );
    }
}

#[test]
fn hash_matches_every_topic_sharing_its_prefix() {
    let router = Router::new();
    let hits = Arc::new(AtomicUsize::new(0));
    router.insert("ss/d/station-1/#", bump(hits.clone())).unwrap();

    for suffix in ["temp", "humidity/raw", "humidity/avg/5m"] {
        let topic = format!("ss/d/station-1/{suffix}");
        router.publish(&Message::new(topic, "1", "station-1").unwrap());
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[test]
fn removed_handler_stops_receiving_while_pattern_still_matches() {
    let router = Router::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let token = router.insert("a/+/c", bump(hits.clone())).unwrap();

    router.publish(&Message::new("a/x/c", "1", "s").unwrap());
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    router.remove("a/+/c", Some(token)).unwrap();
    router.publish(&Message::new("a/y/c", "1", "s").unwrap());
    assert_eq!(hits.load(Ordering::SeqCst), 1, "handler must not fire after removal");
}
