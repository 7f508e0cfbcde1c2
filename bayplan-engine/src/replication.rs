use bayplan_core::catalog::CatalogCode;
use bayplan_core::geometry::Point2;
use bayplan_core::tire::{Tire, TireId, TireIdAllocator};
use tracing::{debug, info, warn};

use crate::coords::CoordinateSystem;
use crate::errors::EngineError;
use crate::placement::{PlacementEngine, TieBreak};

/// 复制结果。首个候选即越界与中途越界需要区分，以便调用方给出不同提示。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationOutcome {
    Complete { placed: usize },
    Partial { placed: usize, requested: usize },
    NonePlaced { requested: usize },
}

impl ReplicationOutcome {
    pub fn placed(&self) -> usize {
        match self {
            Self::Complete { placed } | Self::Partial { placed, .. } => *placed,
            Self::NonePlaced { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplicationRequest {
    pub base: TireId,
    pub count: usize,
    pub spacing_mm: f64,
}

/// 沿荷台长度方向从基准轮胎向后逐个生成副本，每一步都经过碰撞消解。
pub struct ReplicationPlanner<'a> {
    engine: &'a PlacementEngine,
    coords: &'a CoordinateSystem,
}

impl<'a> ReplicationPlanner<'a> {
    pub fn new(engine: &'a PlacementEngine, coords: &'a CoordinateSystem) -> Self {
        Self { engine, coords }
    }

    /// 新副本直接追加到 `layout`，越界时保留已放置的部分。
    pub fn replicate(
        &self,
        layout: &mut Vec<Tire>,
        request: ReplicationRequest,
        catalog_code: Option<CatalogCode>,
        ids: &mut TireIdAllocator,
        tie_break: &mut dyn TieBreak,
    ) -> Result<ReplicationOutcome, EngineError> {
        let base = layout
            .iter()
            .find(|tire| tire.id() == request.base)
            .ok_or(EngineError::TireNotFound(request.base.get()))?;
        if !base.in_bay {
            return Err(EngineError::NotInBay(request.base.get()));
        }

        let diameter = base.diameter();
        let diameter_mm = base.diameter_mm();
        let start_x = base.position.x();
        let mut current_y = base.position.y();
        let spacing = self.coords.mm_to_display(request.spacing_mm);
        let bounds = self.engine.bounds();

        if diameter > bounds.width() {
            warn!(
                base = request.base.get(),
                diameter_mm, "replicated tire exceeds bay width"
            );
        }

        for step in 0..request.count {
            let candidate_y = current_y + diameter + spacing;
            if candidate_y + diameter > bounds.length() {
                info!(
                    base = request.base.get(),
                    placed = step,
                    requested = request.count,
                    "replication stopped at bay end"
                );
                return Ok(if step == 0 {
                    ReplicationOutcome::NonePlaced {
                        requested: request.count,
                    }
                } else {
                    ReplicationOutcome::Partial {
                        placed: step,
                        requested: request.count,
                    }
                });
            }

            let id = ids.next_id();
            let resolution = self.engine.resolve_collisions(
                Point2::new(start_x, candidate_y),
                diameter,
                Some(id),
                layout,
                tie_break,
            );
            debug!(
                tire = id.get(),
                x = resolution.position.x(),
                y = resolution.position.y(),
                "replica placed"
            );
            current_y = resolution.position.y();
            layout.push(Tire::new(
                id,
                diameter_mm,
                diameter,
                resolution.position,
                catalog_code.clone(),
            ));
        }

        Ok(ReplicationOutcome::Complete {
            placed: request.count,
        })
    }
}

#[cfg(test)]
mod tests {
    use bayplan_core::bay::Bay;

    use super::*;
    use crate::coords::ScaleSettings;
    use crate::placement::{AngularTieBreak, PlacementSettings};

    fn setup(length_mm: u32) -> (PlacementEngine, CoordinateSystem) {
        let coords = CoordinateSystem::new(2400, ScaleSettings::default());
        let engine = PlacementEngine::new(
            coords.bay_bounds(&Bay::new(2400, length_mm)),
            PlacementSettings::default(),
        );
        (engine, coords)
    }

    fn base_layout(y: f64) -> (Vec<Tire>, TireIdAllocator) {
        let mut ids = TireIdAllocator::new();
        let base = Tire::new(ids.next_id(), 700.0, 70.0, Point2::new(0.0, y), None);
        (vec![base], ids)
    }

    fn request(count: usize) -> ReplicationRequest {
        ReplicationRequest {
            base: TireId::new(1),
            count,
            spacing_mm: 50.0,
        }
    }

    #[test]
    fn copies_are_spaced_along_length() {
        let (engine, coords) = setup(15000);
        let (mut layout, mut ids) = base_layout(0.0);
        let code = CatalogCode::parse("12");
        let outcome = ReplicationPlanner::new(&engine, &coords)
            .replicate(
                &mut layout,
                request(2),
                code.clone(),
                &mut ids,
                &mut AngularTieBreak,
            )
            .expect("replicate");

        assert_eq!(outcome, ReplicationOutcome::Complete { placed: 2 });
        assert_eq!(layout.len(), 3);
        assert!((layout[1].position.y() - 75.0).abs() < 1e-9);
        assert!((layout[2].position.y() - 150.0).abs() < 1e-9);
        assert_eq!(layout[2].catalog_code, code);
        assert_eq!(layout[2].id().get(), 3);
    }

    #[test]
    fn first_step_overflow_places_nothing() {
        let (engine, coords) = setup(5000);
        let (mut layout, mut ids) = base_layout(430.0);
        let outcome = ReplicationPlanner::new(&engine, &coords)
            .replicate(
                &mut layout,
                request(3),
                None,
                &mut ids,
                &mut AngularTieBreak,
            )
            .expect("replicate");

        assert_eq!(outcome, ReplicationOutcome::NonePlaced { requested: 3 });
        assert_eq!(outcome.placed(), 0);
        assert_eq!(layout.len(), 1);
        assert_eq!(ids.last(), 1);
    }

    #[test]
    fn floating_base_is_rejected() {
        let (engine, coords) = setup(8000);
        let (mut layout, mut ids) = base_layout(0.0);
        layout[0].in_bay = false;
        let err = ReplicationPlanner::new(&engine, &coords)
            .replicate(
                &mut layout,
                request(1),
                None,
                &mut ids,
                &mut AngularTieBreak,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::NotInBay(1)));
        assert_eq!(layout.len(), 1);
    }
}
