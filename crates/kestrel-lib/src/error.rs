use std::io;
use std::path::PathBuf;

use kestrel_bytecode::ImageError;
use kestrel_compiler::LinkError;
use kestrel_vm::RuntimeError;

/// A driver method called while the interpreter is in the wrong stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("no compiled program: call `compile` first")]
    NotCompiled,

    #[error("program is not linked: call `link` first")]
    NotLinked,

    #[error("program is already linked")]
    AlreadyLinked,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] kestrel_compiler::Error),

    #[error("link failed: {0}")]
    Link(#[from] LinkError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Compile diagnostics carried by a failed compilation.
    pub fn diagnostics(&self) -> Option<&kestrel_compiler::Diagnostics> {
        match self {
            Self::Compile(kestrel_compiler::Error::CompileFailed(d)) => Some(d),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
