use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to launch engine `{}`", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("engine {0} pipe is unavailable")]
    Pipe(&'static str),

    /// The stream closed or failed while writing a command or waiting for a marker.
    #[error("engine protocol failure while {context}")]
    Protocol {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl EngineError {
    pub(crate) fn protocol(context: impl Into<String>, source: io::Error) -> Self {
        EngineError::Protocol { context: context.into(), source }
    }

    pub(crate) fn closed(expected: &str) -> Self {
        Self::protocol(
            format!("waiting for `{expected}`"),
            io::Error::new(io::ErrorKind::UnexpectedEof, "engine closed its output"),
        )
    }
}

#[derive(Debug, Error)]
pub enum ExploreError {
    #[error("exploration failed while expanding `{line}`")]
    Engine {
        line: String,
        #[source]
        source: EngineError,
    },
}
