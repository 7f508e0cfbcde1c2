use std::f64::consts::TAU;

use bayplan_core::geometry::{Bounds2D, Point2, Vector2};
use bayplan_core::tire::{Tire, TireId};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

pub const COLLISION_PASSES: usize = 3;
pub const COINCIDENT_EPSILON: f64 = 0.001;

/// π(3 − √5)，相邻整数映射到的方向彼此错开。
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// 两个圆心重合时选择推开方向。返回值必须是单位向量。
pub trait TieBreak {
    fn direction(&mut self, moving: Option<TireId>, other: TireId) -> Vector2;
}

/// 由碰撞双方 ID 推导固定角度，结果可复现。
#[derive(Debug, Clone, Copy, Default)]
pub struct AngularTieBreak;

impl TieBreak for AngularTieBreak {
    fn direction(&mut self, moving: Option<TireId>, other: TireId) -> Vector2 {
        let moving = moving.map_or(0, TireId::get);
        let key = other.get().wrapping_add(moving.wrapping_mul(31)).wrapping_add(1);
        Vector2::from_angle((key % 4096) as f64 * GOLDEN_ANGLE)
    }
}

/// 带种子的随机方向，供需要抖动行为但仍要可复现的场景使用。
#[derive(Debug, Clone)]
pub struct SeededJitter {
    rng: SmallRng,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }
}

impl TieBreak for SeededJitter {
    fn direction(&mut self, _moving: Option<TireId>, _other: TireId) -> Vector2 {
        Vector2::from_angle(self.rng.random_range(0.0..TAU))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementSettings {
    pub passes: usize,
    pub epsilon: f64,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            passes: COLLISION_PASSES,
            epsilon: COINCIDENT_EPSILON,
        }
    }
}

/// 碰撞消解结果。`converged` 为假表示迭代次数用尽时仍有重叠。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub position: Point2,
    pub converged: bool,
    pub passes: usize,
}

/// 单个圆形对象的边界约束与碰撞消解。不修改任何状态，调用方负责提交结果。
#[derive(Debug, Clone, Copy)]
pub struct PlacementEngine {
    bounds: Bounds2D,
    settings: PlacementSettings,
}

impl PlacementEngine {
    pub fn new(bounds: Bounds2D, settings: PlacementSettings) -> Self {
        Self { bounds, settings }
    }

    #[inline]
    pub fn bounds(&self) -> Bounds2D {
        self.bounds
    }

    /// 约束圆（而非包围盒）完全位于荷台内。输入输出均为左上角坐标。
    ///
    /// 直径超过荷台宽度时仍然执行：圆心先被抬到半径处，再被压回 `宽度 - 半径`，
    /// 结果必然越界，这是可接受的退化情形。
    pub fn clamp(&self, position: Point2, diameter: f64) -> Point2 {
        let radius = diameter / 2.0;
        let center = self.clamp_center(top_left_to_center(position, radius), radius);
        center_to_top_left(center, radius)
    }

    fn clamp_center(&self, center: Point2, radius: f64) -> Point2 {
        Point2::new(
            clamp_axis(center.x(), radius, self.bounds.width()),
            clamp_axis(center.y(), radius, self.bounds.length()),
        )
    }

    /// 与 `layout` 中其他荷台内对象逐对排斥，固定轮数的有界松弛。
    ///
    /// 每轮对所有对象计算重叠并沿圆心连线推开，轮末重新约束到荷台内；
    /// 至少跑完两轮且某轮无碰撞时提前结束。高密度下不保证完全分离。
    pub fn resolve_collisions(
        &self,
        position: Point2,
        diameter: f64,
        exclude: Option<TireId>,
        layout: &[Tire],
        tie_break: &mut dyn TieBreak,
    ) -> Resolution {
        let radius = diameter / 2.0;
        let mut current = self.clamp(position, diameter);
        let mut center = top_left_to_center(current, radius);
        let mut converged = false;
        let mut passes = 0;

        for pass in 0..self.settings.passes {
            passes = pass + 1;
            let mut collided = false;

            for other in layout
                .iter()
                .filter(|tire| tire.in_bay && Some(tire.id()) != exclude)
            {
                let required = radius + other.radius();
                let delta = other.center().vector_to(center);
                let actual = delta.length();
                if actual >= required {
                    continue;
                }
                collided = true;
                let overlap = required - actual;
                let direction = if actual < self.settings.epsilon {
                    tie_break.direction(exclude, other.id())
                } else {
                    delta.scale(1.0 / actual)
                };
                center = center.translate(direction.scale(overlap));
            }

            current = self.clamp(center_to_top_left(center, radius), diameter);
            center = top_left_to_center(current, radius);
            converged = !collided;
            if converged && pass > 0 {
                break;
            }
        }

        trace!(
            x = current.x(),
            y = current.y(),
            passes,
            converged,
            "collision resolution finished"
        );

        Resolution {
            position: current,
            converged,
            passes,
        }
    }
}

/// 两个对象的重叠量（显示单位），不重叠时为 0。
pub fn overlap(a: &Tire, b: &Tire) -> f64 {
    let required = a.radius() + b.radius();
    (required - a.center().distance(b.center())).max(0.0)
}

#[inline]
fn clamp_axis(center: f64, radius: f64, extent: f64) -> f64 {
    let mut value = center;
    if value < radius {
        value = radius;
    }
    if value > extent - radius {
        value = extent - radius;
    }
    value
}

#[inline]
fn top_left_to_center(position: Point2, radius: f64) -> Point2 {
    Point2::new(position.x() + radius, position.y() + radius)
}

#[inline]
fn center_to_top_left(center: Point2, radius: f64) -> Point2 {
    Point2::new(center.x() - radius, center.y() - radius)
}
