use std::env;
use std::path::{Path, PathBuf};

use bayplan_config::AppConfig;
use tracing::{debug, trace};

pub const CATALOG_ENV: &str = "BAYPLAN_CATALOG_CSV";

/// 按优先级收集目录 CSV 的候选路径：命令行覆盖、环境变量、配置文件。
/// 相对路径依次在基准目录与当前目录下查找。
#[derive(Debug, Clone)]
pub struct CatalogLocator {
    candidates: Vec<PathBuf>,
    search_roots: Vec<PathBuf>,
}

impl CatalogLocator {
    pub fn from_config(
        override_path: Option<&Path>,
        base_dir: Option<&Path>,
        config: &AppConfig,
    ) -> Self {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(path) = override_path {
            candidates.push(path.to_path_buf());
        }
        if let Some(path) = env::var_os(CATALOG_ENV) {
            candidates.push(PathBuf::from(path));
        }
        if let Some(path) = &config.catalog.path {
            candidates.push(path.clone());
        }

        let mut roots: Vec<PathBuf> = Vec::new();
        if let Some(dir) = base_dir {
            roots.push(dir.to_path_buf());
        }
        if let Ok(dir) = env::current_dir() {
            roots.push(dir);
        }

        // 去重，保持靠前优先级。
        let mut search_roots: Vec<PathBuf> = Vec::new();
        for root in roots {
            if !search_roots.iter().any(|existing| existing == &root) {
                search_roots.push(root);
            }
        }

        Self {
            candidates,
            search_roots,
        }
    }

    /// 第一个实际存在的候选文件。
    pub fn resolve(&self) -> Option<PathBuf> {
        for candidate in &self.candidates {
            if candidate.is_absolute() {
                if candidate.is_file() {
                    return Some(candidate.clone());
                }
                debug!(path = %candidate.display(), "目录文件为绝对路径但不存在");
                continue;
            }
            for root in &self.search_roots {
                let path = root.join(candidate);
                trace!(candidate = %path.display(), "catalog locator candidate");
                if path.is_file() {
                    return Some(path);
                }
            }
        }
        None
    }

    #[inline]
    pub fn has_candidates(&self) -> bool {
        !self.candidates.is_empty()
    }
}
