use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },
    #[error("failed to load sprite {name} from {path:?}: {source}")]
    AssetLoad {
        name: &'static str,
        path: PathBuf,
        source: io::Error,
    },
}

pub type GameResult<T> = Result<T, GameError>;
