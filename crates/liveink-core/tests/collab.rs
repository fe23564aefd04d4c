//! Two clients drawing over the in-memory hub.

use kurbo::Size;
use liveink_core::{
    InkingConfig, InkingManager, InkingTool, Instant, MemoryChannel, MemoryHub, MemoryMap,
    PointerEvent, PointerPoint, RecordingHost, RecordingSurface, SharedInkingSession,
    SharedStrokeMap, Stroke, StrokeOptions, UserRole,
};
use std::time::Duration;

type Session = SharedInkingSession<MemoryMap, MemoryChannel>;

struct Client {
    session: Session,
    host: RecordingHost,
}

fn client(hub: &MemoryHub, role: UserRole) -> Client {
    let host = RecordingHost::new();
    let config = InkingConfig::default();
    let mut manager = InkingManager::builder()
        .dry_surface(Box::new(RecordingSurface::new(Size::new(640.0, 480.0))))
        .wet_host(Box::new(host.clone()))
        .config(config.clone())
        .build()
        .unwrap();
    manager.activate();

    let session =
        SharedInkingSession::synchronize(manager, hub.map(), hub.channel(role), config.sync);
    Client { session, host }
}

fn tick_all(clients: &mut [&mut Client], now: Instant) {
    // Two rounds so that messages sent in the first are seen by everyone.
    for _ in 0..2 {
        for client in clients.iter_mut() {
            client.session.tick(now);
        }
    }
}

fn ids(client: &Client) -> Vec<String> {
    let mut ids: Vec<String> = client
        .session
        .manager()
        .strokes()
        .map(|s| s.id().to_string())
        .collect();
    ids.sort();
    ids
}

fn pt(x: f64, y: f64) -> PointerPoint {
    PointerPoint::new(x, y, 0.5)
}

fn stroke(id: &str, y: f64) -> Stroke {
    Stroke::new(
        StrokeOptions::default()
            .with_id(id)
            .with_points(vec![pt(0.0, y), pt(50.0, y), pt(100.0, y)]),
    )
}

#[test]
fn test_two_clients_see_each_others_strokes() {
    let hub = MemoryHub::new();
    let mut alice = client(&hub, UserRole::Presenter);
    let mut bob = client(&hub, UserRole::Attendee);
    let now = Instant::now();

    alice.session.manager_mut().add_stroke(stroke("from-alice", 0.0));
    bob.session.manager_mut().add_stroke(stroke("from-bob", 20.0));
    tick_all(&mut [&mut alice, &mut bob], now);

    for client in [&alice, &bob] {
        let manager = client.session.manager();
        assert_eq!(manager.stroke_count(), 2);
        assert!(manager.get_stroke("from-alice").is_some());
        assert!(manager.get_stroke("from-bob").is_some());
    }
}

#[test]
fn test_erase_propagates() {
    let hub = MemoryHub::new();
    let mut alice = client(&hub, UserRole::Presenter);
    let mut bob = client(&hub, UserRole::Attendee);
    let now = Instant::now();

    alice.session.manager_mut().add_stroke(stroke("s", 0.0));
    tick_all(&mut [&mut alice, &mut bob], now);
    assert_eq!(bob.session.manager().stroke_count(), 1);

    bob.session.manager_mut().erase(kurbo::Point::new(50.0, 0.0));
    tick_all(&mut [&mut alice, &mut bob], now);
    assert_eq!(alice.session.manager().stroke_count(), 0);
}

#[test]
fn test_point_erase_propagates_fragments() {
    let hub = MemoryHub::new();
    let mut alice = client(&hub, UserRole::Presenter);
    let mut bob = client(&hub, UserRole::Attendee);
    let now = Instant::now();

    alice.session.manager_mut().add_stroke(stroke("s", 0.0));
    tick_all(&mut [&mut alice, &mut bob], now);

    alice.session.manager_mut().point_erase(kurbo::Point::new(50.0, 0.0));
    tick_all(&mut [&mut alice, &mut bob], now);

    let bob_manager = bob.session.manager();
    assert!(bob_manager.get_stroke("s").is_none());
    assert_eq!(bob_manager.stroke_count(), 2);
    for fragment in alice.session.manager().strokes() {
        assert_eq!(bob_manager.get_stroke(fragment.id()), Some(fragment));
    }
}

#[test]
fn test_clear_propagates() {
    let hub = MemoryHub::new();
    let mut alice = client(&hub, UserRole::Presenter);
    let mut bob = client(&hub, UserRole::Attendee);
    let now = Instant::now();

    alice.session.manager_mut().add_stroke(stroke("a", 0.0));
    bob.session.manager_mut().add_stroke(stroke("b", 20.0));
    tick_all(&mut [&mut alice, &mut bob], now);

    bob.session.manager_mut().clear();
    tick_all(&mut [&mut alice, &mut bob], now);
    assert_eq!(alice.session.manager().stroke_count(), 0);
    assert_eq!(bob.session.manager().stroke_count(), 0);
}

#[test]
fn test_late_joiner_loads_document() {
    let hub = MemoryHub::new();
    let mut alice = client(&hub, UserRole::Presenter);
    alice.session.manager_mut().add_stroke(stroke("a", 0.0));
    alice.session.tick(Instant::now());

    let carol = client(&hub, UserRole::Guest);
    assert!(carol.session.manager().get_stroke("a").is_some());
}

#[test]
fn test_pointer_stroke_reaches_peer_as_wet_then_dry() {
    let hub = MemoryHub::new();
    let mut alice = client(&hub, UserRole::Presenter);
    let mut bob = client(&hub, UserRole::Attendee);
    let start = Instant::now();

    let manager = alice.session.manager_mut();
    manager.pointer_down(&PointerEvent::new(1, pt(320.0, 240.0)));
    manager.pointer_move(&PointerEvent::new(1, pt(340.0, 240.0)));
    tick_all(&mut [&mut alice, &mut bob], start);

    assert_eq!(bob.session.remote_wet_stroke_count(), 1);
    assert_eq!(bob.host.attached_count(), 1);
    assert_eq!(bob.session.manager().stroke_count(), 0);

    alice
        .session
        .manager_mut()
        .pointer_up(&PointerEvent::new(1, pt(360.0, 240.0)));
    tick_all(&mut [&mut alice, &mut bob], start + Duration::from_millis(50));

    assert_eq!(bob.session.remote_wet_stroke_count(), 0);
    assert_eq!(bob.host.attached_count(), 0);
    assert_eq!(alice.host.attached_count(), 0);
    assert_eq!(bob.session.manager().stroke_count(), 1);
    assert_eq!(alice.session.manager().stroke_count(), 1);
}

#[test]
fn test_abandoned_wet_stroke_expires() {
    let hub = MemoryHub::new();
    let mut alice = client(&hub, UserRole::Presenter);
    let mut bob = client(&hub, UserRole::Attendee);
    let start = Instant::now();

    alice
        .session
        .manager_mut()
        .pointer_down(&PointerEvent::new(1, pt(10.0, 10.0)));
    tick_all(&mut [&mut alice, &mut bob], start);
    assert_eq!(bob.host.attached_count(), 1);

    // Alice never lifts the pointer. Only Bob keeps ticking.
    bob.session.tick(start + Duration::from_secs(5));
    assert_eq!(bob.host.attached_count(), 1);
    bob.session.tick(start + Duration::from_secs(16));
    assert_eq!(bob.session.remote_wet_stroke_count(), 0);
    assert_eq!(bob.host.attached_count(), 0);
}

#[test]
fn test_remote_stroke_during_point_erase_keeps_local_erase() {
    let hub = MemoryHub::new();
    let mut alice = client(&hub, UserRole::Presenter);
    let mut bob = client(&hub, UserRole::Attendee);
    let start = Instant::now();

    alice.session.manager_mut().add_stroke(stroke("s", 0.0));
    tick_all(&mut [&mut alice, &mut bob], start);

    // Ink (50, 0) sits at the centre of the 640x480 viewport.
    let at = PointerEvent::new(1, PointerPoint::new(370.0, 240.0, 0.5));
    let manager = alice.session.manager_mut();
    manager.set_tool(InkingTool::PointEraser);
    manager.pointer_down(&at);
    alice.session.tick(start);
    alice.session.tick(start + Duration::from_millis(40));
    assert!(alice.session.manager().get_stroke("s").is_none());

    bob.session.manager_mut().add_stroke(stroke("b", 20.0));
    bob.session.tick(start + Duration::from_millis(40));
    alice.session.tick(start + Duration::from_millis(50));
    assert!(alice.session.manager().get_stroke("b").is_some());

    alice.session.manager_mut().pointer_up(&at);
    tick_all(&mut [&mut alice, &mut bob], start + Duration::from_millis(60));

    assert!(hub.map().get("s").is_none());
    assert!(bob.session.manager().get_stroke("s").is_none());
    assert_eq!(bob.session.manager().stroke_count(), 3);
    assert_eq!(ids(&alice), ids(&bob));
}

#[test]
fn test_remote_stroke_during_update_batch_is_not_echoed() {
    let hub = MemoryHub::new();
    let mut alice = client(&hub, UserRole::Presenter);
    let mut bob = client(&hub, UserRole::Attendee);
    let now = Instant::now();

    bob.session.manager_mut().begin_update();
    alice.session.manager_mut().add_stroke(stroke("a", 0.0));
    alice.session.tick(now);
    bob.session.tick(now);
    bob.session.manager_mut().end_update();
    tick_all(&mut [&mut alice, &mut bob], now);

    assert_eq!(hub.op_count(), 1);
    assert!(bob.session.manager().get_stroke("a").is_some());
}

#[test]
fn test_local_batch_survives_remote_traffic() {
    let hub = MemoryHub::new();
    let mut alice = client(&hub, UserRole::Presenter);
    let mut bob = client(&hub, UserRole::Attendee);
    let now = Instant::now();

    bob.session.manager_mut().begin_update();
    bob.session.manager_mut().add_stroke(stroke("from-bob", 20.0));
    alice.session.manager_mut().add_stroke(stroke("from-alice", 0.0));
    tick_all(&mut [&mut alice, &mut bob], now);
    assert!(hub.map().get("from-bob").is_none());

    bob.session.manager_mut().end_update();
    tick_all(&mut [&mut alice, &mut bob], now);
    assert!(hub.map().get("from-bob").is_some());
    assert_eq!(ids(&alice), ids(&bob));
    assert_eq!(hub.op_count(), 2);
}
