use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "BAYPLAN_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub bay: BayConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub replication: ReplicationConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 自动发现配置文件：优先读取环境变量 `BAYPLAN_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 荷台的物理尺寸与长度输入范围，单位均为毫米。
#[derive(Debug, Clone, Deserialize)]
pub struct BayConfig {
    #[serde(default = "BayConfig::default_width")]
    pub width_mm: u32,
    #[serde(default = "BayConfig::default_min_length")]
    pub min_length_mm: u32,
    #[serde(default = "BayConfig::default_max_length")]
    pub max_length_mm: u32,
    #[serde(default = "BayConfig::default_guide_interval")]
    pub guide_interval_mm: u32,
}

impl BayConfig {
    fn default_width() -> u32 {
        2400
    }

    fn default_min_length() -> u32 {
        5000
    }

    fn default_max_length() -> u32 {
        15000
    }

    fn default_guide_interval() -> u32 {
        1000
    }
}

impl Default for BayConfig {
    fn default() -> Self {
        Self {
            width_mm: Self::default_width(),
            min_length_mm: Self::default_min_length(),
            max_length_mm: Self::default_max_length(),
            guide_interval_mm: Self::default_guide_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "DisplayConfig::default_wide_scale")]
    pub wide_scale: f64,
    #[serde(default = "DisplayConfig::default_narrow_bay_width")]
    pub narrow_bay_width: f64,
    #[serde(default = "DisplayConfig::default_narrow_breakpoint")]
    pub narrow_breakpoint: f64,
    #[serde(default = "DisplayConfig::default_viewport_width")]
    pub default_viewport_width: f64,
}

impl DisplayConfig {
    fn default_wide_scale() -> f64 {
        10.0
    }

    fn default_narrow_bay_width() -> f64 {
        190.0
    }

    fn default_narrow_breakpoint() -> f64 {
        600.0
    }

    fn default_viewport_width() -> f64 {
        1280.0
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            wide_scale: Self::default_wide_scale(),
            narrow_bay_width: Self::default_narrow_bay_width(),
            narrow_breakpoint: Self::default_narrow_breakpoint(),
            default_viewport_width: Self::default_viewport_width(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreakMode {
    #[default]
    Angular,
    Seeded,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacementConfig {
    #[serde(default = "PlacementConfig::default_passes")]
    pub passes: usize,
    #[serde(default = "PlacementConfig::default_epsilon")]
    pub epsilon: f64,
    #[serde(default)]
    pub tie_break: TieBreakMode,
    /// 仅在 `tie_break = "seeded"` 时使用；缺省时从系统熵源取种子。
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "PlacementConfig::default_creation_padding")]
    pub creation_padding: f64,
}

impl PlacementConfig {
    fn default_passes() -> usize {
        3
    }

    fn default_epsilon() -> f64 {
        0.001
    }

    fn default_creation_padding() -> f64 {
        10.0
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            passes: Self::default_passes(),
            epsilon: Self::default_epsilon(),
            tie_break: TieBreakMode::default(),
            seed: None,
            creation_padding: Self::default_creation_padding(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplicationConfig {
    #[serde(default = "ReplicationConfig::default_count")]
    pub default_count: usize,
    #[serde(default)]
    pub default_spacing_mm: f64,
}

impl ReplicationConfig {
    fn default_count() -> usize {
        1
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            default_count: Self::default_count(),
            default_spacing_mm: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GestureConfig {
    #[serde(default = "GestureConfig::default_tap_threshold")]
    pub tap_threshold: f64,
}

impl GestureConfig {
    fn default_tap_threshold() -> f64 {
        5.0
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tap_threshold: Self::default_tap_threshold(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
