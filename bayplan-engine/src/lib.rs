pub mod command;
pub mod coords;
pub mod gesture;
pub mod history;
pub mod placement;
pub mod replication;
pub mod session;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("bay length {raw:?} is not a whole number of millimeters")]
        InvalidBayLength { raw: String },
        #[error("bay length {length}mm is outside {min}..={max}mm")]
        BayLengthOutOfRange { length: i64, min: u32, max: u32 },
        #[error("bay is not configured")]
        BayNotConfigured,
        #[error("tire diameter {0}mm is not a positive number")]
        InvalidDiameter(f64),
        #[error("tire diameter {diameter_mm}mm exceeds bay width {bay_width_mm}mm")]
        TireExceedsBayWidth { diameter_mm: f64, bay_width_mm: u32 },
        #[error("replication spacing {0}mm is not a finite non-negative number")]
        InvalidSpacing(f64),
        #[error("position ({x}, {y}) is not finite")]
        NonFinitePosition { x: f64, y: f64 },
        #[error("tire with id {0} not found")]
        TireNotFound(u64),
        #[error("tire {0} is not inside the bay")]
        NotInBay(u64),
        #[error("catalog code is empty")]
        EmptyCatalogCode,
        #[error("catalog code {0} not found")]
        CatalogMiss(String),
        #[error("catalog is not loaded")]
        CatalogUnavailable,
        #[error("no catalog product is selected")]
        NoProductSelected,
        #[error("a drag gesture is already in progress")]
        DragInProgress,
        #[error("no drag gesture in progress")]
        NoActiveDrag,
    }
}

pub mod viewport {
    /// 全局视图下荷台占可用高度的比例。
    pub const OVERVIEW_FILL: f64 = 0.95;

    /// 视图状态：普通视图缩放为 1，全局视图让整条荷台落入可用高度。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Viewport {
        pub overview: bool,
        pub zoom: f64,
    }

    impl Viewport {
        /// 在普通视图与全局视图之间切换，返回切换后的缩放倍数。
        pub fn toggle_overview(&mut self, viewport_height: f64, bay_length: f64) -> f64 {
            if self.overview || bay_length <= 0.0 {
                self.reset();
            } else {
                self.overview = true;
                self.zoom = viewport_height * OVERVIEW_FILL / bay_length;
            }
            self.zoom
        }

        pub fn reset(&mut self) {
            *self = Self::default();
        }
    }

    impl Default for Viewport {
        fn default() -> Self {
            Self {
                overview: false,
                zoom: 1.0,
            }
        }
    }

}
