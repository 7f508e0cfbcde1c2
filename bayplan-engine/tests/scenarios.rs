use bayplan_core::geometry::Point2;
use bayplan_core::snapshot::Snapshot;
use bayplan_engine::coords::ScalePreset;
use bayplan_engine::history::HistoryStore;
use bayplan_engine::placement::{SeededJitter, overlap};
use bayplan_engine::replication::ReplicationOutcome;
use bayplan_engine::session::Session;

fn session(length_mm: i64) -> Session {
    let mut session = Session::default();
    session.initialize(length_mm).expect("荷台长度应当有效");
    session
}

fn snapshot(tag: u32) -> Snapshot {
    Snapshot::new(Vec::new(), 5000 + tag, u64::from(tag), 10.0)
}

#[test]
fn far_corner_request_is_clamped_inside() {
    let mut session = session(8000);
    let id = session
        .place_tire_at(Point2::new(1000.0, 1000.0), 700.0, None)
        .expect("放置应当成功");
    let tire = session.tire(id).expect("轮胎存在");
    assert!((tire.position.x() - 170.0).abs() < 1e-9);
    assert!((tire.position.y() - 730.0).abs() < 1e-9);
}

fn place_colocated_pair(session: &mut Session) -> f64 {
    let first = session
        .place_tire_at(Point2::new(90.0, 400.0), 600.0, None)
        .expect("第一个轮胎");
    let second = session
        .place_tire_at(Point2::new(90.0, 400.0), 600.0, None)
        .expect("第二个轮胎");

    let a = session.tire(first).expect("第一个轮胎存在");
    let b = session.tire(second).expect("第二个轮胎存在");
    assert!(overlap(a, b) < 1e-9);
    a.center().distance(b.center())
}

#[test]
fn colocated_tires_end_exactly_one_diameter_apart() {
    let mut session = session(8000);
    let distance = place_colocated_pair(&mut session);
    assert!((distance - 60.0).abs() < 1e-9, "圆心距离 {distance}");
}

#[test]
fn colocated_tires_separate_exactly_with_seeded_jitter() {
    for seed in 0..50 {
        let mut session = Session::default().with_tie_break(SeededJitter::new(seed));
        session.initialize(8000).expect("荷台长度应当有效");
        let distance = place_colocated_pair(&mut session);
        assert!((distance - 60.0).abs() < 1e-9, "种子 {seed} 的圆心距离 {distance}");
    }
}

#[test]
fn replication_stops_at_bay_end() {
    let mut short = session(5000);
    let base = short
        .place_tire_at(Point2::new(0.0, 200.0), 700.0, None)
        .expect("基准轮胎");
    let outcome = short.replicate(base, 5, 50.0).expect("复制");
    assert_eq!(
        outcome,
        ReplicationOutcome::Partial {
            placed: 3,
            requested: 5
        }
    );
    assert_eq!(short.tires().len(), 4);

    let mut long = session(15000);
    let base = long
        .place_tire_at(Point2::new(0.0, 200.0), 700.0, None)
        .expect("基准轮胎");
    let outcome = long.replicate(base, 5, 50.0).expect("复制");
    assert_eq!(outcome, ReplicationOutcome::Complete { placed: 5 });
    let ys: Vec<f64> = long.tires().iter().map(|tire| tire.position.y()).collect();
    let expected = [200.0, 275.0, 350.0, 425.0, 500.0, 575.0];
    for (actual, expected) in ys.iter().zip(expected) {
        assert!((actual - expected).abs() < 1e-9);
    }
}

#[test]
fn replication_without_room_leaves_history_untouched() {
    let mut session = session(5000);
    let base = session.create_tire(700.0).expect("基准轮胎");
    let before = session.history().len();
    let outcome = session.replicate(base, 2, 50.0).expect("复制");
    assert_eq!(outcome, ReplicationOutcome::NonePlaced { requested: 2 });
    assert_eq!(session.history().len(), before);
}

#[test]
fn undo_on_fresh_history_is_noop() {
    let mut store = HistoryStore::new();
    assert!(store.undo().is_none());
    assert!(store.redo().is_none());

    let mut session = session(6000);
    assert!(!session.undo());
    assert!(!session.redo());
    assert!(session.tires().is_empty());
}

#[test]
fn undo_walks_back_to_first_snapshot() {
    let mut store = HistoryStore::new();
    for tag in 0..5 {
        store.push(snapshot(tag));
    }
    for _ in 0..4 {
        assert!(store.undo().is_some());
    }
    assert_eq!(store.index(), Some(0));
    assert_eq!(store.current().map(Snapshot::bay_length_mm), Some(5000));
    assert!(store.undo().is_none());

    assert_eq!(store.redo().map(Snapshot::bay_length_mm), Some(5001));
}

#[test]
fn push_after_undo_discards_redo_branch() {
    let mut store = HistoryStore::new();
    for tag in 0..4 {
        store.push(snapshot(tag));
    }
    store.undo();
    store.undo();
    store.push(snapshot(9));
    assert_eq!(store.len(), 3);
    assert!(!store.can_redo());
    assert_eq!(store.current().map(Snapshot::bay_length_mm), Some(5009));
}

#[test]
fn session_undo_redo_round_trip() {
    let mut session = session(8000);
    let first = session.create_tire(600.0).expect("创建");
    session
        .place_tire_at(Point2::new(0.0, 0.0), 500.0, None)
        .expect("放置");
    let full = session.snapshot();

    assert!(session.undo());
    assert_eq!(session.tires().len(), 1);
    assert!(session.tire(first).is_some());
    assert!(session.redo());
    assert_eq!(session.snapshot(), full);

    assert!(session.go_to(0));
    assert!(session.tires().is_empty());
    assert!(!session.go_to(10));
    assert!(session.tires().is_empty());
}

#[test]
fn narrow_layout_keeps_physical_positions() {
    let mut session = session(10000);
    let id = session
        .place_tire_at(Point2::new(50.0, 500.0), 650.0, None)
        .expect("放置");
    assert!(session.set_scale_preset(ScalePreset::Narrow));

    let tire = session.tire(id).expect("轮胎存在");
    let coords = session.coords();
    assert!((coords.display_to_mm(tire.position.x()) - 500.0).abs() < 1e-6);
    assert!((coords.display_to_mm(tire.position.y()) - 5000.0).abs() < 1e-6);
}
