pub mod catalog_locator;
pub mod cli;
pub mod errors;
pub mod loader;

use std::path::Path;

use bayplan_config::AppConfig;
use errors::FrontendError;
use tracing::info;

pub use cli::{DemoOptions, DemoReport};

/// 根据配置构建会话并执行 CLI 演示。
pub fn run_cli_demo(
    config: &AppConfig,
    catalog_override: Option<&Path>,
    options: &DemoOptions,
) -> Result<DemoReport, FrontendError> {
    info!("启动 CLI 演示前端");
    let loaded = loader::build_session(config, catalog_override, None);
    cli::run_demo(loaded, config, options)
}
