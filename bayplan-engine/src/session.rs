use std::fmt;

use bayplan_core::bay::{BAY_WIDTH_MM, Bay, LengthLimits};
use bayplan_core::catalog::{CatalogCode, CatalogEntry, CatalogProvider};
use bayplan_core::geometry::Point2;
use bayplan_core::snapshot::Snapshot;
use bayplan_core::tire::{Tire, TireId, TireIdAllocator};
use tracing::{debug, info, warn};

use crate::coords::{CoordinateSystem, ScalePreset, ScaleSettings};
use crate::errors::EngineError;
use crate::gesture::{DragCandidate, DragTracker, GestureKind, TAP_THRESHOLD};
use crate::history::HistoryStore;
use crate::placement::{AngularTieBreak, PlacementEngine, PlacementSettings, TieBreak};
use crate::replication::{ReplicationOutcome, ReplicationPlanner, ReplicationRequest};
use crate::viewport::Viewport;

pub const CREATION_PADDING: f64 = 10.0;
pub const GUIDE_INTERVAL_MM: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub bay_width_mm: u32,
    pub length_limits: LengthLimits,
    pub scale: ScaleSettings,
    pub placement: PlacementSettings,
    /// 显式创建时距离荷台右下角的内缩量（显示单位）。
    pub creation_padding: f64,
    pub tap_threshold: f64,
    pub guide_interval_mm: u32,
    pub history_depth: Option<usize>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            bay_width_mm: BAY_WIDTH_MM,
            length_limits: LengthLimits::default(),
            scale: ScaleSettings::default(),
            placement: PlacementSettings::default(),
            creation_padding: CREATION_PADDING,
            tap_threshold: TAP_THRESHOLD,
            guide_interval_mm: GUIDE_INTERVAL_MM,
            history_depth: None,
        }
    }
}

/// 布局概况：轮胎总数与荷台内轮胎占用的长度（毫米，取最远下边缘）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSummary {
    pub tire_count: usize,
    pub in_bay_count: usize,
    pub occupied_length_mm: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// 点击荷台内带品番的轮胎会顺带查询目录。
    Tap { product: Option<CatalogEntry> },
    Moved { committed: bool },
}

/// 一次装载规划会话的全部可变状态。所有引擎操作都通过它进行，
/// 内存中的轮胎集合是唯一的事实来源。
pub struct Session {
    settings: SessionSettings,
    bay: Bay,
    coords: CoordinateSystem,
    tires: Vec<Tire>,
    ids: TireIdAllocator,
    history: HistoryStore,
    catalog: Option<Box<dyn CatalogProvider>>,
    selected: Option<CatalogEntry>,
    tie_break: Box<dyn TieBreak>,
    viewport: Viewport,
    drag: Option<DragTracker>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("bay", &self.bay)
            .field("scale_factor", &self.coords.scale_factor())
            .field("tires", &self.tires.len())
            .field("history", &self.history.len())
            .field("catalog", &self.catalog.as_ref().map(|c| c.len()))
            .field("selected", &self.selected.as_ref().map(|e| e.code.as_str()))
            .finish()
    }
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            bay: Bay::unconfigured(settings.bay_width_mm),
            coords: CoordinateSystem::new(settings.bay_width_mm, settings.scale),
            tires: Vec::new(),
            ids: TireIdAllocator::new(),
            history: HistoryStore::with_max_depth(settings.history_depth),
            catalog: None,
            selected: None,
            tie_break: Box::new(AngularTieBreak),
            viewport: Viewport::default(),
            drag: None,
        }
    }

    pub fn with_catalog(mut self, catalog: impl CatalogProvider + 'static) -> Self {
        self.set_catalog(catalog);
        self
    }

    pub fn with_tie_break(mut self, tie_break: impl TieBreak + 'static) -> Self {
        self.tie_break = Box::new(tie_break);
        self
    }

    pub fn set_catalog(&mut self, catalog: impl CatalogProvider + 'static) {
        self.catalog = Some(Box::new(catalog));
        self.selected = None;
    }

    #[inline]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[inline]
    pub fn bay(&self) -> &Bay {
        &self.bay
    }

    #[inline]
    pub fn coords(&self) -> &CoordinateSystem {
        &self.coords
    }

    #[inline]
    pub fn tires(&self) -> &[Tire] {
        &self.tires
    }

    pub fn tire(&self, id: TireId) -> Option<&Tire> {
        self.tires.iter().find(|tire| tire.id() == id)
    }

    #[inline]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    #[inline]
    pub fn selected_product(&self) -> Option<&CatalogEntry> {
        self.selected.as_ref()
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.bay.is_configured()
    }

    #[inline]
    pub fn last_tire_id(&self) -> u64 {
        self.ids.last()
    }

    /// 当前布局对应的放置引擎。
    pub fn placement_engine(&self) -> PlacementEngine {
        PlacementEngine::new(self.coords.bay_bounds(&self.bay), self.settings.placement)
    }

    /// 解析用户输入的荷台长度并初始化。非数字或越界时不修改任何状态。
    pub fn initialize_from_input(&mut self, raw: &str) -> Result<(), EngineError> {
        let length = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| EngineError::InvalidBayLength {
                raw: raw.to_string(),
            })?;
        self.initialize(length)
    }

    /// 设定荷台长度，清空布局与历史，并压入初始的空布局快照。
    pub fn initialize(&mut self, length_mm: i64) -> Result<(), EngineError> {
        let limits = self.settings.length_limits;
        if !limits.contains(length_mm) {
            return Err(EngineError::BayLengthOutOfRange {
                length: length_mm,
                min: limits.min_mm,
                max: limits.max_mm,
            });
        }
        let length_mm = u32::try_from(length_mm).map_err(|_| EngineError::BayLengthOutOfRange {
            length: length_mm,
            min: limits.min_mm,
            max: limits.max_mm,
        })?;

        self.bay.set_length_mm(length_mm);
        self.tires.clear();
        self.ids.reset_to(0);
        self.history = HistoryStore::with_max_depth(self.settings.history_depth);
        self.drag = None;
        self.commit();
        info!(length_mm, "bay initialized");
        Ok(())
    }

    /// 结束会话，回到未配置荷台的状态。
    pub fn reset(&mut self) {
        self.bay.set_length_mm(0);
        self.tires.clear();
        self.ids.reset_to(0);
        self.history.clear();
        self.selected = None;
        self.viewport.reset();
        self.drag = None;
        info!("session reset");
    }

    /// 从外部快照恢复会话，恢复后的快照成为新的历史起点。
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), EngineError> {
        self.initialize(i64::from(snapshot.bay_length_mm()))?;
        self.materialize(snapshot);
        self.ids
            .reset_to(snapshot.id_counter().max(snapshot.max_tire_id()));
        self.history = HistoryStore::with_max_depth(self.settings.history_depth);
        self.commit();
        info!(tires = self.tires.len(), "snapshot loaded");
        Ok(())
    }

    /// 按指定直径显式创建；若当前选中产品直径一致，则带上其品番。
    pub fn create_tire(&mut self, diameter_mm: f64) -> Result<TireId, EngineError> {
        let code = self
            .selected
            .as_ref()
            .filter(|entry| (f64::from(entry.diameter_mm) - diameter_mm).abs() < f64::EPSILON)
            .map(|entry| entry.code.clone());
        self.create_explicit(diameter_mm, code)
    }

    /// 以当前选中产品的直径与品番显式创建。
    pub fn create_tire_from_selection(&mut self) -> Result<TireId, EngineError> {
        let entry = self.selected.as_ref().ok_or(EngineError::NoProductSelected)?;
        let diameter_mm = f64::from(entry.diameter_mm);
        let code = Some(entry.code.clone());
        self.create_explicit(diameter_mm, code)
    }

    fn create_explicit(
        &mut self,
        diameter_mm: f64,
        code: Option<CatalogCode>,
    ) -> Result<TireId, EngineError> {
        self.ensure_configured()?;
        validate_diameter(diameter_mm)?;
        if diameter_mm > f64::from(self.bay.width_mm()) {
            return Err(EngineError::TireExceedsBayWidth {
                diameter_mm,
                bay_width_mm: self.bay.width_mm(),
            });
        }

        let diameter = self.coords.mm_to_display(diameter_mm);
        let bounds = self.coords.bay_bounds(&self.bay);
        let padding = self.settings.creation_padding;
        let candidate = Point2::new(
            bounds.width() - diameter - padding,
            bounds.length() - diameter - padding,
        );
        let id = self.insert_tire(candidate, diameter_mm, code);
        self.commit();
        Ok(id)
    }

    /// 在指定位置放置。直径超过荷台宽度时只记录警告，对象仍会放下。
    pub fn place_tire_at(
        &mut self,
        position: Point2,
        diameter_mm: f64,
        code: Option<CatalogCode>,
    ) -> Result<TireId, EngineError> {
        self.ensure_configured()?;
        validate_diameter(diameter_mm)?;
        validate_position(position)?;
        if diameter_mm > f64::from(self.bay.width_mm()) {
            warn!(
                diameter_mm,
                bay_width_mm = self.bay.width_mm(),
                "tire diameter exceeds bay width"
            );
        }
        let id = self.insert_tire(position, diameter_mm, code);
        self.commit();
        Ok(id)
    }

    fn insert_tire(
        &mut self,
        candidate: Point2,
        diameter_mm: f64,
        code: Option<CatalogCode>,
    ) -> TireId {
        let diameter = self.coords.mm_to_display(diameter_mm);
        let id = self.ids.next_id();
        let resolution = self.placement_engine().resolve_collisions(
            candidate,
            diameter,
            Some(id),
            &self.tires,
            self.tie_break.as_mut(),
        );
        self.tires
            .push(Tire::new(id, diameter_mm, diameter, resolution.position, code));
        debug!(
            tire = id.get(),
            diameter_mm,
            x = resolution.position.x(),
            y = resolution.position.y(),
            "tire created"
        );
        id
    }

    pub fn delete_tire(&mut self, id: TireId) -> Result<Tire, EngineError> {
        let index = self
            .tires
            .iter()
            .position(|tire| tire.id() == id)
            .ok_or(EngineError::TireNotFound(id.get()))?;
        let removed = self.tires.remove(index);
        if self.drag.is_some_and(|drag| drag.tire() == id) {
            self.drag = None;
        }
        self.commit();
        debug!(tire = id.get(), "tire deleted");
        Ok(removed)
    }

    /// 单步移动：约束并消解碰撞后写回位置，不产生历史记录。
    pub fn move_tire(&mut self, id: TireId, position: Point2) -> Result<Point2, EngineError> {
        self.ensure_configured()?;
        validate_position(position)?;
        let engine = self.placement_engine();
        let index = self.tire_index(id)?;
        let diameter = self.tires[index].diameter();
        let resolution = engine.resolve_collisions(
            position,
            diameter,
            Some(id),
            &self.tires,
            self.tie_break.as_mut(),
        );
        let tire = &mut self.tires[index];
        tire.position = resolution.position;
        tire.in_bay = true;
        Ok(resolution.position)
    }

    pub fn begin_drag(&mut self, id: TireId, pointer: Point2) -> Result<(), EngineError> {
        if self.drag.is_some() {
            return Err(EngineError::DragInProgress);
        }
        validate_position(pointer)?;
        let tire = self.tire(id).ok_or(EngineError::TireNotFound(id.get()))?;
        self.drag = Some(DragTracker::begin(tire, pointer));
        Ok(())
    }

    /// 拖拽过程中的一次移动。圆心在荷台内时放置并消解碰撞，否则对象悬空于原始位置。
    pub fn drag_to(&mut self, pointer: Point2) -> Result<DragCandidate, EngineError> {
        self.ensure_configured()?;
        validate_position(pointer)?;
        let bounds = self.coords.bay_bounds(&self.bay);
        let tracker = self.drag.as_mut().ok_or(EngineError::NoActiveDrag)?;
        let id = tracker.tire();
        let candidate = tracker.update(pointer, &bounds);

        if candidate.in_bay {
            let position = self.move_tire(id, candidate.position)?;
            Ok(DragCandidate {
                position,
                in_bay: true,
            })
        } else {
            let index = self.tire_index(id)?;
            let tire = &mut self.tires[index];
            tire.position = candidate.position;
            tire.in_bay = false;
            Ok(candidate)
        }
    }

    /// 结束拖拽。仅当位置或是否在荷台内发生变化时才记录历史。
    pub fn end_drag(&mut self, pointer: Point2) -> Result<DragOutcome, EngineError> {
        let tracker = self.drag.take().ok_or(EngineError::NoActiveDrag)?;
        let index = self.tire_index(tracker.tire())?;
        let tire = &self.tires[index];
        let changed =
            tire.position != tracker.start_position() || tire.in_bay != tracker.start_in_bay();

        if tracker.finish(pointer, self.settings.tap_threshold) == GestureKind::Tap {
            let product = if tire.in_bay {
                match tire.catalog_code.clone() {
                    Some(code) => self.lookup_code(code.as_str()).ok(),
                    None => {
                        self.selected = None;
                        None
                    }
                }
            } else {
                None
            };
            return Ok(DragOutcome::Tap { product });
        }

        if changed {
            self.commit();
        }
        Ok(DragOutcome::Moved { committed: changed })
    }

    /// 从基准轮胎向后复制。副本的品番在调用时重新查询目录，查不到则不带品番。
    pub fn replicate(
        &mut self,
        base: TireId,
        count: usize,
        spacing_mm: f64,
    ) -> Result<ReplicationOutcome, EngineError> {
        self.ensure_configured()?;
        if !(spacing_mm.is_finite() && spacing_mm >= 0.0) {
            return Err(EngineError::InvalidSpacing(spacing_mm));
        }
        let base_code = self
            .tire(base)
            .ok_or(EngineError::TireNotFound(base.get()))?
            .catalog_code
            .clone();
        let code = match (&self.catalog, base_code) {
            (Some(catalog), Some(code)) => catalog.lookup(&code).map(|entry| entry.code.clone()),
            _ => None,
        };

        let engine = self.placement_engine();
        let coords = self.coords;
        let outcome = ReplicationPlanner::new(&engine, &coords).replicate(
            &mut self.tires,
            ReplicationRequest {
                base,
                count,
                spacing_mm,
            },
            code,
            &mut self.ids,
            self.tie_break.as_mut(),
        )?;

        if outcome.placed() > 0 {
            self.commit();
        }
        Ok(outcome)
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        match self.history.index() {
            Some(index) if index > 0 => self.go_to(index - 1),
            _ => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.index() {
            Some(index) => self.go_to(index + 1),
            None => false,
        }
    }

    /// 跳转到历史中的指定位置并据此重建布局；越界时什么也不做。
    pub fn go_to(&mut self, index: usize) -> bool {
        let Some(snapshot) = self.history.go_to(index).cloned() else {
            return false;
        };
        self.materialize(&snapshot);
        true
    }

    fn materialize(&mut self, snapshot: &Snapshot) {
        if snapshot.bay_length_mm() > 0 {
            self.bay.set_length_mm(snapshot.bay_length_mm());
        }
        let engine = self.placement_engine();
        let source_factor = snapshot.scale_factor();
        self.tires = snapshot
            .tires()
            .iter()
            .map(|record| {
                let diameter = self.coords.mm_to_display(record.diameter_mm);
                let position = self
                    .coords
                    .convert_from(Point2::new(record.x, record.y), source_factor);
                let mut tire = Tire::new(
                    record.id,
                    record.diameter_mm,
                    diameter,
                    position,
                    record.catalog_code.clone(),
                );
                tire.in_bay = record.in_bay;
                if tire.in_bay {
                    tire.position = engine.clamp(position, diameter);
                }
                tire
            })
            .collect();
        // 以快照中的最大 ID 为准，避免撤销后新建对象与现存对象撞号
        self.ids.reset_to(snapshot.max_tire_id());
        self.drag = None;
    }

    /// 根据可用显示宽度选择缩放预设；系数变化时重算所有轮胎的显示尺寸与位置。
    pub fn set_viewport_width(&mut self, available_width: f64) -> bool {
        let preset = self.coords.preset_for_width(available_width);
        self.set_scale_preset(preset)
    }

    /// 切换缩放预设。所有轮胎按新系数换算显示尺寸与位置；
    /// 荷台内的轮胎随后重新约束到边界内，悬空轮胎只换算不约束。
    pub fn set_scale_preset(&mut self, preset: ScalePreset) -> bool {
        let previous = self.coords.scale_factor();
        if !self.coords.set_preset(preset) {
            return false;
        }
        let engine = self.placement_engine();
        for tire in &mut self.tires {
            let diameter = self.coords.mm_to_display(tire.diameter_mm());
            tire.set_display_diameter(diameter);
            tire.position = self.coords.convert_from(tire.position, previous);
            if tire.in_bay && self.bay.is_configured() {
                tire.position = engine.clamp(tire.position, diameter);
            }
        }
        debug!(
            previous,
            current = self.coords.scale_factor(),
            "display scale changed"
        );
        true
    }

    /// 切换全局视图，返回新的缩放倍数。
    pub fn toggle_overview(&mut self, viewport_height: f64) -> f64 {
        let bay_length = self.coords.bay_bounds(&self.bay).length();
        self.viewport.toggle_overview(viewport_height, bay_length)
    }

    /// 按品番查询目录并设为当前选中产品；查不到时清除选中状态。
    pub fn lookup_code(&mut self, raw: &str) -> Result<CatalogEntry, EngineError> {
        let catalog = self
            .catalog
            .as_ref()
            .filter(|catalog| !catalog.is_empty())
            .ok_or(EngineError::CatalogUnavailable)?;
        let Some(code) = CatalogCode::parse(raw) else {
            self.selected = None;
            return Err(EngineError::EmptyCatalogCode);
        };
        match catalog.lookup(&code).cloned() {
            Some(entry) => {
                self.selected = Some(entry.clone());
                Ok(entry)
            }
            None => {
                self.selected = None;
                Err(EngineError::CatalogMiss(code.to_string()))
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn summary(&self) -> LayoutSummary {
        let bottom = self
            .tires
            .iter()
            .filter(|tire| tire.in_bay)
            .map(Tire::bottom)
            .fold(None, |acc: Option<f64>, value| {
                Some(acc.map_or(value, |current| current.max(value)))
            });
        LayoutSummary {
            tire_count: self.tires.len(),
            in_bay_count: self.tires.iter().filter(|tire| tire.in_bay).count(),
            occupied_length_mm: bottom
                .map(|value| self.coords.display_to_mm(value.max(0.0)).round() as u32),
        }
    }

    /// 参考线在显示单位下的纵向偏移。
    pub fn guide_offsets(&self) -> Vec<f64> {
        self.bay
            .guide_positions_mm(self.settings.guide_interval_mm)
            .into_iter()
            .map(|mm| self.coords.mm_to_display(f64::from(mm)))
            .collect()
    }

    /// 当前布局的深拷贝。
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            &self.tires,
            self.bay.length_mm(),
            self.ids.last(),
            self.coords.scale_factor(),
        )
    }

    fn commit(&mut self) {
        let snapshot = self.snapshot();
        self.history.push(snapshot);
    }

    fn ensure_configured(&self) -> Result<(), EngineError> {
        if self.bay.is_configured() {
            Ok(())
        } else {
            Err(EngineError::BayNotConfigured)
        }
    }

    fn tire_index(&self, id: TireId) -> Result<usize, EngineError> {
        self.tires
            .iter()
            .position(|tire| tire.id() == id)
            .ok_or(EngineError::TireNotFound(id.get()))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

fn validate_diameter(diameter_mm: f64) -> Result<(), EngineError> {
    if diameter_mm.is_finite() && diameter_mm > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidDiameter(diameter_mm))
    }
}

fn validate_position(position: Point2) -> Result<(), EngineError> {
    if position.x().is_finite() && position.y().is_finite() {
        Ok(())
    } else {
        Err(EngineError::NonFinitePosition {
            x: position.x(),
            y: position.y(),
        })
    }
}
