use std::path::{Path, PathBuf};

use bayplan_config::{AppConfig, TieBreakMode};
use bayplan_core::bay::LengthLimits;
use bayplan_core::catalog::CatalogProvider;
use bayplan_engine::coords::ScaleSettings;
use bayplan_engine::placement::{AngularTieBreak, PlacementSettings, SeededJitter};
use bayplan_engine::session::{Session, SessionSettings};
use bayplan_io::{CatalogLoader, CsvCatalogFacade};
use tracing::{info, warn};

use crate::catalog_locator::CatalogLocator;

/// 目录来源，便于前端呈现加载信息。
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogSource {
    Csv { path: PathBuf, entries: usize },
    Missing,
}

/// 统一封装构建好的会话与元信息。
#[derive(Debug)]
pub struct LoadedSession {
    pub session: Session,
    pub catalog: CatalogSource,
}

/// 将配置映射为引擎的会话参数。
pub fn session_settings(config: &AppConfig) -> SessionSettings {
    SessionSettings {
        bay_width_mm: config.bay.width_mm,
        length_limits: LengthLimits::new(config.bay.min_length_mm, config.bay.max_length_mm),
        scale: ScaleSettings {
            wide_scale: config.display.wide_scale,
            narrow_bay_width: config.display.narrow_bay_width,
            narrow_breakpoint: config.display.narrow_breakpoint,
        },
        placement: PlacementSettings {
            passes: config.placement.passes,
            epsilon: config.placement.epsilon,
        },
        creation_padding: config.placement.creation_padding,
        tap_threshold: config.gesture.tap_threshold,
        guide_interval_mm: config.bay.guide_interval_mm,
        history_depth: config.history.max_depth,
    }
}

/// 根据配置构建会话，并尝试加载产品目录。目录缺失或读取失败时会话仍可使用。
pub fn build_session(
    config: &AppConfig,
    catalog_override: Option<&Path>,
    base_dir: Option<&Path>,
) -> LoadedSession {
    let session = Session::new(session_settings(config));
    let mut session = match config.placement.tie_break {
        TieBreakMode::Angular => session.with_tie_break(AngularTieBreak),
        TieBreakMode::Seeded => {
            let jitter = match config.placement.seed {
                Some(seed) => SeededJitter::new(seed),
                None => SeededJitter::from_entropy(),
            };
            session.with_tie_break(jitter)
        }
    };
    session.set_viewport_width(config.display.default_viewport_width);

    let locator = CatalogLocator::from_config(catalog_override, base_dir, config);
    let catalog = match locator.resolve() {
        Some(path) => match CsvCatalogFacade::new().load(&path) {
            Ok(catalog) => {
                let entries = catalog.len();
                info!(path = %path.display(), entries, "产品目录加载成功");
                session.set_catalog(catalog);
                CatalogSource::Csv { path, entries }
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "加载产品目录失败，品番查询不可用");
                CatalogSource::Missing
            }
        },
        None => {
            if locator.has_candidates() {
                warn!("未找到配置的产品目录文件，品番查询不可用");
            }
            CatalogSource::Missing
        }
    };

    LoadedSession { session, catalog }
}
