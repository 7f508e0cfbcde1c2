use std::path::PathBuf;

use bayplan_config::AppConfig;
use bayplan_core::geometry::Point2;
use bayplan_engine::command::{CommandBus, CommandContext, CommandRequest};
use bayplan_engine::replication::ReplicationOutcome;
use bayplan_engine::session::{LayoutSummary, Session};
use bayplan_io::{JsonSnapshotFacade, SnapshotLoader, SnapshotSaver};
use tracing::{info, warn};

use crate::errors::FrontendError;
use crate::loader::{CatalogSource, LoadedSession};

pub const DEFAULT_BAY_LENGTH: &str = "8000";

/// CLI 演示的输入选项。`commands` 为空时执行内置的示例脚本。
#[derive(Debug, Clone, Default)]
pub struct DemoOptions {
    pub bay_length: Option<String>,
    pub product_code: Option<String>,
    pub load: Option<PathBuf>,
    pub save: Option<PathBuf>,
    pub commands: Vec<String>,
}

/// 演示结束时的布局概况，便于调用方或测试检查结果。
#[derive(Debug, Clone, PartialEq)]
pub struct DemoReport {
    pub summary: LayoutSummary,
    pub history_len: usize,
    pub failed_commands: usize,
}

/// 简易 CLI 演示：初始化荷台（或读取快照），执行脚本，打印布局。
pub fn run_demo(
    loaded: LoadedSession,
    config: &AppConfig,
    options: &DemoOptions,
) -> Result<DemoReport, FrontendError> {
    let LoadedSession {
        mut session,
        catalog,
    } = loaded;

    println!("荷台装载规划 CLI 演示");
    match &catalog {
        CatalogSource::Csv { path, entries } => {
            println!("产品目录：{}（{} 条）", path.display(), entries);
        }
        CatalogSource::Missing => println!("未加载产品目录，品番查询不可用。"),
    }

    match &options.load {
        Some(path) => {
            let snapshot = JsonSnapshotFacade::new().load(path)?;
            session
                .load_snapshot(&snapshot)
                .map_err(|source| FrontendError::Snapshot {
                    path: path.clone(),
                    source,
                })?;
            println!("已从快照恢复布局：{}", path.display());
        }
        None => {
            let raw = options.bay_length.as_deref().unwrap_or(DEFAULT_BAY_LENGTH);
            session.initialize_from_input(raw)?;
        }
    }
    println!(
        "荷台：{}mm × {}mm，显示比例 1:{:.2}",
        session.bay().width_mm(),
        session.bay().length_mm(),
        session.coords().scale_factor()
    );

    let bus = CommandBus::new();
    let failed_commands = if options.commands.is_empty() {
        run_sample_script(&mut session, &bus, config, options.product_code.as_deref())
    } else {
        run_commands(&mut session, &bus, &options.commands)
    };

    print_layout(&session);

    if let Some(path) = &options.save {
        JsonSnapshotFacade::new().save(&session.snapshot(), path)?;
        println!("布局已保存到 {}", path.display());
    }

    let summary = session.summary();
    info!(
        tires = summary.tire_count,
        in_bay = summary.in_bay_count,
        failed_commands,
        "CLI 演示结束"
    );
    Ok(DemoReport {
        summary,
        history_len: session.history().len(),
        failed_commands,
    })
}

/// 逐条执行文本命令，返回失败条数。失败不会中断后续命令。
pub fn run_commands(session: &mut Session, bus: &CommandBus, commands: &[String]) -> usize {
    let mut context = CommandContext { session };
    let mut failed = 0;
    for line in commands {
        let Some(request) = CommandRequest::parse(line) else {
            continue;
        };
        if let Err(err) = dispatch_cli_command(bus, &request, &mut context) {
            warn!("CLI 命令执行失败: {err}");
            println!("[失败] {err}");
            failed += 1;
        }
    }
    failed
}

fn run_sample_script(
    session: &mut Session,
    bus: &CommandBus,
    config: &AppConfig,
    product_code: Option<&str>,
) -> usize {
    let mut failed = 0;

    if let Some(code) = product_code {
        match session.lookup_code(code) {
            Ok(entry) => {
                println!(
                    "选中产品 {}：{}，直径 {}mm，宽 {}mm，托盘 {}，备注 {}",
                    entry.code,
                    entry.size,
                    entry.diameter_mm,
                    entry.width_mm,
                    entry
                        .pallet_count
                        .map_or_else(|| "-".to_string(), |count| count.to_string()),
                    if entry.note.is_empty() {
                        "-"
                    } else {
                        entry.note.as_str()
                    }
                );
                if let Err(err) = session.create_tire_from_selection() {
                    println!("[失败] {err}");
                    failed += 1;
                }
            }
            Err(err) => {
                println!("[失败] 品番 {code}: {err}");
                failed += 1;
            }
        }
    }

    // 同一位置放两个，第二个被推开；之后从最靠后的一个继续向后复制
    for _ in 0..2 {
        if let Err(err) = session.place_tire_at(Point2::new(0.0, 0.0), 700.0, None) {
            println!("[失败] {err}");
            failed += 1;
        }
    }

    let base = session
        .tires()
        .iter()
        .filter(|tire| tire.in_bay)
        .max_by(|a, b| a.position.y().total_cmp(&b.position.y()))
        .map(|tire| tire.id());
    if let Some(base) = base {
        let count = config.replication.default_count;
        let spacing = config.replication.default_spacing_mm;
        match session.replicate(base, count, spacing) {
            Ok(ReplicationOutcome::Complete { placed }) => {
                println!("[复制] 从 {base} 向后复制 {placed} 个，间隔 {spacing}mm");
            }
            Ok(ReplicationOutcome::Partial { placed, requested }) => {
                println!(
                    "[复制] 请求 {requested} 个，第 {} 个起超出荷台，已放置 {placed} 个",
                    placed + 1
                );
            }
            Ok(ReplicationOutcome::NonePlaced { requested }) => {
                println!("[复制] 复制 {requested} 个会超出荷台，未放置");
            }
            Err(err) => {
                println!("[失败] {err}");
                failed += 1;
            }
        }
    }

    let script = ["create 650", "summary", "undo", "redo", "summary"].map(str::to_string);
    failed += run_commands(session, bus, &script);

    let commands: Vec<&str> = bus.available_commands().copied().collect();
    println!("支持的命令: {}", commands.join(", "));
    failed
}

fn dispatch_cli_command(
    bus: &CommandBus,
    request: &CommandRequest,
    context: &mut CommandContext<'_>,
) -> Result<(), FrontendError> {
    let response = bus.dispatch(request, context);
    if response.success {
        if let Some(message) = response.message {
            println!("[命令] {message}");
        }
        Ok(())
    } else {
        Err(FrontendError::Command {
            command: request.name.clone(),
            message: response.message.unwrap_or_else(|| "未知错误".to_string()),
        })
    }
}

fn print_layout(session: &Session) {
    let coords = session.coords();
    println!("当前布局：");
    if session.tires().is_empty() {
        println!("  （空）");
    }
    for tire in session.tires() {
        println!(
            "  - {}，直径 {:.0}mm，左上角=({:.0}mm, {:.0}mm)，{}，品番 {}",
            tire.id(),
            tire.diameter_mm(),
            coords.display_to_mm(tire.position.x()),
            coords.display_to_mm(tire.position.y()),
            if tire.in_bay { "荷台内" } else { "荷台外" },
            tire.catalog_code.as_ref().map_or("-", |code| code.as_str())
        );
    }

    let guides: Vec<String> = session
        .guide_offsets()
        .iter()
        .map(|offset| format!("{:.0}", coords.display_to_mm(*offset)))
        .collect();
    if !guides.is_empty() {
        println!("参考线 (mm): {}", guides.join(", "));
    }

    let summary = session.summary();
    println!(
        "共 {} 个轮胎，荷台内 {} 个，占用长度 {}",
        summary.tire_count,
        summary.in_bay_count,
        summary
            .occupied_length_mm
            .map_or_else(|| "-".to_string(), |mm| format!("{mm}mm"))
    );
    println!(
        "历史记录 {} 条，可撤销={}，可重做={}",
        session.history().len(),
        if session.can_undo() { "是" } else { "否" },
        if session.can_redo() { "是" } else { "否" }
    );
}
