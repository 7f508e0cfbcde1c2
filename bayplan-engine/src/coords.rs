use bayplan_core::bay::Bay;
use bayplan_core::geometry::{Bounds2D, Point2};

pub const WIDE_SCALE_FACTOR: f64 = 10.0;
pub const NARROW_BAY_WIDTH: f64 = 190.0;
pub const NARROW_BREAKPOINT: f64 = 600.0;

/// 两种缩放预设：宽屏固定 10mm/单位，窄屏让荷台宽度映射到固定的显示宽度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalePreset {
    Wide,
    Narrow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleSettings {
    pub wide_scale: f64,
    pub narrow_bay_width: f64,
    /// 可用显示宽度不超过该值时切换到窄屏预设。
    pub narrow_breakpoint: f64,
}

impl Default for ScaleSettings {
    fn default() -> Self {
        Self {
            wide_scale: WIDE_SCALE_FACTOR,
            narrow_bay_width: NARROW_BAY_WIDTH,
            narrow_breakpoint: NARROW_BREAKPOINT,
        }
    }
}

/// 物理毫米与显示单位之间的换算。物理尺寸始终以毫米为准。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateSystem {
    preset: ScalePreset,
    scale_factor: f64,
    bay_width_mm: u32,
    settings: ScaleSettings,
}

impl CoordinateSystem {
    pub fn new(bay_width_mm: u32, settings: ScaleSettings) -> Self {
        let mut coords = Self {
            preset: ScalePreset::Wide,
            scale_factor: settings.wide_scale,
            bay_width_mm,
            settings,
        };
        coords.scale_factor = coords.factor_for(ScalePreset::Wide);
        coords
    }

    #[inline]
    pub fn preset(&self) -> ScalePreset {
        self.preset
    }

    /// 每个显示单位代表的毫米数。
    #[inline]
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    #[inline]
    pub fn mm_to_display(&self, mm: f64) -> f64 {
        mm / self.scale_factor
    }

    #[inline]
    pub fn display_to_mm(&self, units: f64) -> f64 {
        units * self.scale_factor
    }

    pub fn factor_for(&self, preset: ScalePreset) -> f64 {
        match preset {
            ScalePreset::Wide => self.settings.wide_scale,
            ScalePreset::Narrow => f64::from(self.bay_width_mm) / self.settings.narrow_bay_width,
        }
    }

    /// 根据可用显示宽度选择预设。
    pub fn preset_for_width(&self, available_width: f64) -> ScalePreset {
        if available_width <= self.settings.narrow_breakpoint {
            ScalePreset::Narrow
        } else {
            ScalePreset::Wide
        }
    }

    /// 切换预设，返回缩放系数是否发生变化。
    pub fn set_preset(&mut self, preset: ScalePreset) -> bool {
        let factor = self.factor_for(preset);
        let changed = (factor - self.scale_factor).abs() > f64::EPSILON;
        self.preset = preset;
        self.scale_factor = factor;
        changed
    }

    /// 荷台在显示单位下的可放置矩形。
    pub fn bay_bounds(&self, bay: &Bay) -> Bounds2D {
        Bounds2D::from_size(
            self.mm_to_display(f64::from(bay.width_mm())),
            self.mm_to_display(f64::from(bay.length_mm())),
        )
    }

    /// 将另一缩放系数下记录的显示坐标换算到当前系数。
    pub fn convert_from(&self, point: Point2, source_factor: f64) -> Point2 {
        if (source_factor - self.scale_factor).abs() <= f64::EPSILON {
            point
        } else {
            point.scale(source_factor / self.scale_factor)
        }
    }
}
