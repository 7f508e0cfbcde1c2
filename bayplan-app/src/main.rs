use std::path::PathBuf;

use bayplan_config::{AppConfig, ConfigError};
use bayplan_frontend::DemoOptions;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_override: Option<PathBuf> = None;
    let mut catalog_override: Option<PathBuf> = None;
    let mut options = DemoOptions::default();

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| -> String {
            args.next().unwrap_or_else(|| {
                eprintln!("`{flag}` 需要提供参数");
                std::process::exit(1);
            })
        };
        match arg.as_str() {
            "--config" => config_override = Some(PathBuf::from(value("--config"))),
            "--catalog" => catalog_override = Some(PathBuf::from(value("--catalog"))),
            "--bay-length" => options.bay_length = Some(value("--bay-length")),
            "--code" => options.product_code = Some(value("--code")),
            "--load" => options.load = Some(PathBuf::from(value("--load"))),
            "--save" => options.save = Some(PathBuf::from(value("--save"))),
            "--cmd" => options.commands.push(value("--cmd")),
            other => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
        }
    }

    let config = load_configuration(config_override);
    init_logging(&config);
    info!("启动荷台装载规划应用");

    match bayplan_frontend::run_cli_demo(&config, catalog_override.as_deref(), &options) {
        Ok(report) => {
            info!(
                tires = report.summary.tire_count,
                history = report.history_len,
                "演示完成"
            );
            if report.failed_commands > 0 {
                warn!(failed = report.failed_commands, "部分命令执行失败");
            }
        }
        Err(err) => {
            error!(error = %err, "执行 CLI 演示失败");
            std::process::exit(1);
        }
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
