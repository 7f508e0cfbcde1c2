//! 放置与历史栈的性质测试。
//!
//! 1. 直径不超过荷台宽度时，约束后的圆完全位于荷台内
//! 2. 毫米与显示单位的往返换算在两种预设下都成立
//! 3. 收敛的碰撞消解结果与其他对象互不重叠
//! 4. 任意 push/undo/redo/go_to 序列与简单模型一致

use bayplan_core::bay::Bay;
use bayplan_core::geometry::{Bounds2D, Point2};
use bayplan_core::snapshot::Snapshot;
use bayplan_core::tire::{Tire, TireId};
use bayplan_engine::coords::{CoordinateSystem, ScalePreset, ScaleSettings};
use bayplan_engine::history::HistoryStore;
use bayplan_engine::placement::{AngularTieBreak, PlacementEngine, PlacementSettings};
use proptest::prelude::*;

const TOLERANCE: f64 = 1e-9;

fn engine(length: f64) -> PlacementEngine {
    PlacementEngine::new(
        Bounds2D::from_size(240.0, length),
        PlacementSettings::default(),
    )
}

#[derive(Debug, Clone)]
enum Op {
    Push(u32),
    Undo,
    Redo,
    GoTo(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..1000).prop_map(Op::Push),
        Just(Op::Undo),
        Just(Op::Redo),
        (0usize..12).prop_map(Op::GoTo),
    ]
}

proptest! {
    #[test]
    fn clamp_keeps_circle_within_bay(
        x in -2000.0f64..2000.0,
        y in -2000.0f64..4000.0,
        diameter in 1.0f64..240.0,
        length in 500.0f64..1500.0,
    ) {
        let engine = engine(length);
        let clamped = engine.clamp(Point2::new(x, y), diameter);
        prop_assert!(clamped.x() >= -TOLERANCE);
        prop_assert!(clamped.y() >= -TOLERANCE);
        prop_assert!(clamped.x() + diameter <= 240.0 + TOLERANCE);
        prop_assert!(clamped.y() + diameter <= length + TOLERANCE);
    }

    #[test]
    fn clamp_is_idempotent(
        x in -500.0f64..800.0,
        y in -500.0f64..1500.0,
        diameter in 1.0f64..240.0,
    ) {
        let engine = engine(800.0);
        let once = engine.clamp(Point2::new(x, y), diameter);
        let twice = engine.clamp(once, diameter);
        prop_assert!((once.x() - twice.x()).abs() < TOLERANCE);
        prop_assert!((once.y() - twice.y()).abs() < TOLERANCE);
    }

    #[test]
    fn unit_conversion_round_trips(mm in 0.0f64..20000.0, narrow in any::<bool>()) {
        let mut coords = CoordinateSystem::new(2400, ScaleSettings::default());
        if narrow {
            coords.set_preset(ScalePreset::Narrow);
        }
        let back = coords.display_to_mm(coords.mm_to_display(mm));
        prop_assert!((back - mm).abs() < 1e-6);
    }

    #[test]
    fn bay_bounds_follow_physical_size(length_mm in 5000u32..=15000, narrow in any::<bool>()) {
        let mut coords = CoordinateSystem::new(2400, ScaleSettings::default());
        if narrow {
            coords.set_preset(ScalePreset::Narrow);
        }
        let bounds = coords.bay_bounds(&Bay::new(2400, length_mm));
        prop_assert!((coords.display_to_mm(bounds.width()) - 2400.0).abs() < 1e-6);
        prop_assert!((coords.display_to_mm(bounds.length()) - f64::from(length_mm)).abs() < 1e-6);
    }

    #[test]
    fn converged_resolution_has_no_overlap(
        peers in prop::collection::vec((0.0f64..180.0, 0.0f64..740.0), 0..4),
        x in -100.0f64..300.0,
        y in -100.0f64..900.0,
    ) {
        let engine = engine(800.0);
        let layout: Vec<Tire> = peers
            .iter()
            .enumerate()
            .map(|(index, (px, py))| {
                Tire::new(TireId::new(index as u64 + 1), 600.0, 60.0, Point2::new(*px, *py), None)
            })
            .collect();
        let moving = Tire::new(TireId::new(99), 400.0, 40.0, Point2::new(x, y), None);

        let result = engine.resolve_collisions(
            moving.position,
            moving.diameter(),
            Some(moving.id()),
            &layout,
            &mut AngularTieBreak,
        );
        let mut placed = moving.clone();
        placed.position = result.position;

        prop_assert!(result.passes <= 3);
        prop_assert!(result.position.x() >= -TOLERANCE);
        prop_assert!(result.position.x() + 40.0 <= 240.0 + TOLERANCE);
        if result.converged {
            for other in &layout {
                let gap = placed.center().distance(other.center()) - 50.0;
                prop_assert!(gap >= -TOLERANCE, "overlap with {}: {}", other.id(), gap);
            }
        }
    }

    #[test]
    fn history_matches_model(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut store = HistoryStore::new();
        let mut model: Vec<u32> = Vec::new();
        let mut index = 0usize;

        for op in &ops {
            match op {
                Op::Push(tag) => {
                    if !model.is_empty() {
                        model.truncate(index + 1);
                    }
                    model.push(*tag);
                    index = model.len() - 1;
                    store.push(Snapshot::new(Vec::new(), *tag, 0, 10.0));
                }
                Op::Undo => {
                    let moved = store.undo().is_some();
                    prop_assert_eq!(moved, !model.is_empty() && index > 0);
                    if moved {
                        index -= 1;
                    }
                }
                Op::Redo => {
                    let moved = store.redo().is_some();
                    prop_assert_eq!(moved, index + 1 < model.len());
                    if moved {
                        index += 1;
                    }
                }
                Op::GoTo(target) => {
                    let moved = store.go_to(*target).is_some();
                    prop_assert_eq!(moved, *target < model.len());
                    if moved {
                        index = *target;
                    }
                }
            }

            prop_assert_eq!(store.len(), model.len());
            prop_assert_eq!(
                store.current().map(Snapshot::bay_length_mm),
                model.get(index).copied()
            );
            prop_assert_eq!(store.can_undo(), !model.is_empty() && index > 0);
            prop_assert_eq!(store.can_redo(), index + 1 < model.len());
        }
    }
}
