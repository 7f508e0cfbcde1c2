use bayplan_core::geometry::{Bounds2D, Point2, Vector2};
use bayplan_core::tire::{Tire, TireId};

pub const TAP_THRESHOLD: f64 = 5.0;

/// 一次拖拽手势的起点状态。坐标均为荷台相对的显示单位。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragTracker {
    tire: TireId,
    start_pointer: Point2,
    grab_offset: Vector2,
    start_position: Point2,
    start_in_bay: bool,
    radius: f64,
    started: bool,
}

/// 单次移动给出的候选位置。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragCandidate {
    pub position: Point2,
    pub in_bay: bool,
}

/// 手势结束时的分类：移动距离小于阈值且未发生移动事件时视为点击。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Tap,
    Move,
}

impl DragTracker {
    pub fn begin(tire: &Tire, pointer: Point2) -> Self {
        Self {
            tire: tire.id(),
            start_pointer: pointer,
            grab_offset: tire.position.vector_to(pointer),
            start_position: tire.position,
            start_in_bay: tire.in_bay,
            radius: tire.radius(),
            started: false,
        }
    }

    #[inline]
    pub fn tire(&self) -> TireId {
        self.tire
    }

    #[inline]
    pub fn start_position(&self) -> Point2 {
        self.start_position
    }

    #[inline]
    pub fn start_in_bay(&self) -> bool {
        self.start_in_bay
    }

    #[inline]
    pub fn started(&self) -> bool {
        self.started
    }

    /// 记录一次移动，返回保持抓取偏移后的左上角位置，以及圆心是否落在荷台内部。
    pub fn update(&mut self, pointer: Point2, bay: &Bounds2D) -> DragCandidate {
        self.started = true;
        let position = Point2::new(
            pointer.x() - self.grab_offset.x(),
            pointer.y() - self.grab_offset.y(),
        );
        let center = Point2::new(position.x() + self.radius, position.y() + self.radius);
        DragCandidate {
            position,
            in_bay: bay.contains_strict(center),
        }
    }

    pub fn finish(&self, pointer: Point2, tap_threshold: f64) -> GestureKind {
        let moved = self.start_pointer.distance(pointer);
        if moved < tap_threshold && !self.started {
            GestureKind::Tap
        } else {
            GestureKind::Move
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tire() -> Tire {
        Tire::new(TireId::new(4), 600.0, 60.0, Point2::new(100.0, 100.0), None)
    }

    #[test]
    fn update_keeps_grab_offset() {
        let bay = Bounds2D::from_size(240.0, 800.0);
        let mut tracker = DragTracker::begin(&tire(), Point2::new(110.0, 120.0));
        let candidate = tracker.update(Point2::new(60.0, 320.0), &bay);
        assert_eq!(candidate.position, Point2::new(50.0, 300.0));
        assert!(candidate.in_bay);
        assert!(tracker.started());

        let outside = tracker.update(Point2::new(400.0, 320.0), &bay);
        assert!(!outside.in_bay);
    }

    #[test]
    fn short_press_without_move_is_tap() {
        let tracker = DragTracker::begin(&tire(), Point2::new(110.0, 120.0));
        assert_eq!(
            tracker.finish(Point2::new(112.0, 121.0), TAP_THRESHOLD),
            GestureKind::Tap
        );
        assert_eq!(
            tracker.finish(Point2::new(120.0, 120.0), TAP_THRESHOLD),
            GestureKind::Move
        );
    }

    #[test]
    fn any_move_event_disables_tap() {
        let bay = Bounds2D::from_size(240.0, 800.0);
        let mut tracker = DragTracker::begin(&tire(), Point2::new(110.0, 120.0));
        tracker.update(Point2::new(111.0, 120.0), &bay);
        assert_eq!(
            tracker.finish(Point2::new(110.0, 120.0), TAP_THRESHOLD),
            GestureKind::Move
        );
    }
}
