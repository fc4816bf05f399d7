use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot open descriptor {path:?}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("none of the search directories could be read ({0})")]
    SearchPathUnreadable(String),
    #[error("chooser command is empty")]
    EmptyChooserCommand,
    #[error("chooser command {command:?} is malformed: {source}")]
    InvalidChooserCommand {
        command: String,
        #[source]
        source: shell_words::ParseError,
    },
    #[error("failed to spawn chooser {program:?}: {source}")]
    ChooserSpawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("chooser i/o failed: {0}")]
    ChooserIo(#[from] io::Error),
    #[error("failed to launch {command:?}: {source}")]
    Execution {
        command: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no cache directory available")]
    NoLocation,
    #[error("cache i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("cache file is malformed: {0}")]
    Format(#[from] serde_json::Error),
}
