use std::collections::HashMap;

use bayplan_core::tire::TireId;

use crate::replication::ReplicationOutcome;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    /// 按空白拆分一行文本命令，空行返回 `None`。
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let name = parts.next()?.to_string();
        Some(Self {
            name,
            args: parts.map(str::to_string).collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub session: &'a mut Session,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(UndoCommand);
        bus.register(RedoCommand);
        bus.register(CreateCommand);
        bus.register(DeleteCommand);
        bus.register(ReplicateCommand);
        bus.register(SummaryCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    pub fn available_commands(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

fn arg<T: std::str::FromStr>(
    request: &CommandRequest,
    index: usize,
    label: &str,
) -> Result<T, CommandResponse> {
    request
        .args
        .get(index)
        .and_then(|raw| raw.parse::<T>().ok())
        .ok_or_else(|| CommandResponse::err(format!("缺少或无效的参数: {label}")))
}

struct UndoCommand;

impl CommandHandler for UndoCommand {
    fn name(&self) -> &'static str {
        "undo"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if context.session.undo() {
            CommandResponse::ok("已撤销")
        } else {
            CommandResponse::err("没有可撤销的操作")
        }
    }
}

struct RedoCommand;

impl CommandHandler for RedoCommand {
    fn name(&self) -> &'static str {
        "redo"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if context.session.redo() {
            CommandResponse::ok("已重做")
        } else {
            CommandResponse::err("没有可重做的操作")
        }
    }
}

struct CreateCommand;

impl CommandHandler for CreateCommand {
    fn name(&self) -> &'static str {
        "create"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let result = match request.args.first() {
            Some(_) => match arg::<f64>(request, 0, "diameter") {
                Ok(diameter) => context.session.create_tire(diameter),
                Err(response) => return response,
            },
            None => context.session.create_tire_from_selection(),
        };
        match result {
            Ok(id) => CommandResponse::ok(format!("已创建 {id}")),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct DeleteCommand;

impl CommandHandler for DeleteCommand {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let id = match arg::<u64>(request, 0, "id") {
            Ok(raw) => TireId::new(raw),
            Err(response) => return response,
        };
        match context.session.delete_tire(id) {
            Ok(_) => CommandResponse::ok(format!("已删除 {id}")),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct ReplicateCommand;

impl CommandHandler for ReplicateCommand {
    fn name(&self) -> &'static str {
        "replicate"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let parsed = arg::<u64>(request, 0, "id").and_then(|id| {
            let count = arg::<usize>(request, 1, "count")?;
            let spacing = arg::<f64>(request, 2, "spacing")?;
            Ok((TireId::new(id), count, spacing))
        });
        let (id, count, spacing) = match parsed {
            Ok(values) => values,
            Err(response) => return response,
        };
        match context.session.replicate(id, count, spacing) {
            Ok(ReplicationOutcome::Complete { placed }) => {
                CommandResponse::ok(format!("已复制 {placed} 个"))
            }
            Ok(ReplicationOutcome::Partial { placed, .. }) => CommandResponse::ok(format!(
                "第 {} 个起超出荷台，复制已中断（已放置 {placed} 个）",
                placed + 1
            )),
            Ok(ReplicationOutcome::NonePlaced { .. }) => {
                CommandResponse::err("复制数量过多，会超出荷台")
            }
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct SummaryCommand;

impl CommandHandler for SummaryCommand {
    fn name(&self) -> &'static str {
        "summary"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let summary = context.session.summary();
        let occupied = summary
            .occupied_length_mm
            .map_or_else(|| "-".to_string(), |mm| format!("{mm}mm"));
        CommandResponse::ok(format!(
            "轮胎 {} 个（荷台内 {} 个），占用长度 {occupied}",
            summary.tire_count, summary.in_bay_count
        ))
    }
}

#[cfg(test)]
mod tests {
    use bayplan_core::geometry::Point2;

    use super::*;

    fn dispatch(bus: &CommandBus, session: &mut Session, line: &str) -> CommandResponse {
        let request = CommandRequest::parse(line).expect("non-empty command");
        let mut context = CommandContext { session };
        bus.dispatch(&request, &mut context)
    }

    #[test]
    fn create_replicate_and_undo_commands_work() {
        let mut session = Session::default();
        session.initialize(15000).unwrap();
        let bus = CommandBus::new();

        let response = dispatch(&bus, &mut session, "create 600");
        assert!(response.success);
        assert_eq!(session.tires().len(), 1);

        let response = dispatch(&bus, &mut session, "replicate 1 2 0");
        assert!(!response.success, "base sits at the bay end");

        let response = dispatch(&bus, &mut session, "undo");
        assert!(response.success);
        assert!(session.tires().is_empty());

        let response = dispatch(&bus, &mut session, "undo");
        assert!(!response.success);

        let response = dispatch(&bus, &mut session, "redo");
        assert!(response.success);
        assert_eq!(session.tires().len(), 1);
    }

    #[test]
    fn invalid_arguments_are_reported() {
        let mut session = Session::default();
        session.initialize(8000).unwrap();
        let bus = CommandBus::new();

        assert!(!dispatch(&bus, &mut session, "delete abc").success);
        assert!(!dispatch(&bus, &mut session, "replicate 1").success);
        assert!(!dispatch(&bus, &mut session, "create").success);
        assert!(!dispatch(&bus, &mut session, "teleport").success);

        let response = dispatch(&bus, &mut session, "summary");
        assert!(response.success);
        assert!(response.message.unwrap().contains('-'));
    }

    #[test]
    fn nan_spacing_is_refused() {
        let mut session = Session::default();
        session.initialize(8000).unwrap();
        let bus = CommandBus::new();
        session
            .place_tire_at(Point2::new(0.0, 0.0), 700.0, None)
            .unwrap();
        let history_len = session.history().len();

        let response = dispatch(&bus, &mut session, "replicate 1 5 NaN");
        assert!(!response.success);
        assert_eq!(session.tires().len(), 1);
        assert_eq!(session.history().len(), history_len);
    }

    #[test]
    fn parse_splits_on_whitespace() {
        let request = CommandRequest::parse("  replicate 3  5 50 ").unwrap();
        assert_eq!(request.name, "replicate");
        assert_eq!(request.args, vec!["3", "5", "50"]);
        assert!(CommandRequest::parse("   ").is_none());
    }
}
