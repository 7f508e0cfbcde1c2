use std::path::PathBuf;

use bayplan_engine::errors::EngineError;
use bayplan_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("命令 `{command}` 执行失败: {message}")]
    Command { command: String, message: String },
    #[error("快照文件 {path:?} 不是有效的布局: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
}
