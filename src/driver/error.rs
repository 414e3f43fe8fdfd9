//! Error taxonomy.
//!
//! Every fallible call in this crate returns `Result<T, SlbtError>`. A
//! driver accumulates these in a bounded [`super::context::ErrorVector`]
//! rather than failing the whole process eagerly, mirroring the batch
//! nature of the original tool: one invocation, one final exit code.

use std::path::PathBuf;

use thiserror::Error;

/// The closed set of semantic failures this crate can report, plus the
/// three structural kinds (`System`, `Buffer`, `Nested`) that wrap them.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("flow error")]
    Flow,
    #[error("flee error")]
    Flee,
    #[error("compile error")]
    Compile,
    #[error("link error (child exit code {0:?})")]
    Link(Option<i32>),
    #[error("install error")]
    Install,
    #[error("archive error")]
    Ar,
    #[error("copy error")]
    Copy,
    #[error("mdso error")]
    Mdso,
    #[error("dlltool error")]
    Dlltool,
    #[error("host initialization error")]
    HostInit,
    #[error("ld rpath initialization error")]
    LdrpathInit,
    #[error("link flow error")]
    LinkFlow,

    #[error("empty archive file")]
    ArEmptyFile,
    #[error("invalid archive signature")]
    ArInvalidSignature,
    #[error("invalid archive header")]
    ArInvalidHeader,
    #[error("truncated member data")]
    ArTruncatedData,
    #[error("duplicate long-names member")]
    ArDuplicateLongNames,
    #[error("duplicate armap member")]
    ArDuplicateArmapMember,
    #[error("misplaced armap member")]
    ArMisplacedArmapMember,
    #[error("armap mismatch between merge inputs")]
    ArArmapMismatch,
    #[error("invalid armap number of symbols")]
    ArInvalidArmapNumberOfSyms,
    #[error("invalid armap size-of-refs field")]
    ArInvalidArmapSizeOfRefs,
    #[error("invalid armap size-of-strings field")]
    ArInvalidArmapSizeOfStrs,
    #[error("invalid armap string table")]
    ArInvalidArmapStringTable,
    #[error("invalid armap member offset")]
    ArInvalidArmapMemberOffset,
    #[error("invalid armap name offset")]
    ArInvalidArmapNameOffset,
    #[error("no action specified")]
    ArNoActionSpecified,
    #[error("no input specified")]
    ArNoInputSpecified,
    #[error("driver mismatch between merge inputs")]
    ArDriverMismatch,
    #[error("output not specified")]
    OutputNotSpecified,
    #[error("output not applicable to this mode")]
    OutputNotApplicable,
}

impl ErrorKind {
    /// Whether this kind reflects a malformed invocation (missing/conflicting
    /// arguments, a mode given input it can't act on) rather than a failure
    /// encountered while carrying out an otherwise-valid one. Usage errors
    /// exit `1`; everything else exits `2`.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            ErrorKind::Flow
                | ErrorKind::Flee
                | ErrorKind::LinkFlow
                | ErrorKind::ArNoActionSpecified
                | ErrorKind::ArNoInputSpecified
                | ErrorKind::ArDriverMismatch
                | ErrorKind::OutputNotSpecified
                | ErrorKind::OutputNotApplicable
        )
    }
}

/// Top-level error. `Nested` preserves the call site that first observed
/// the failure without re-deriving a new message at each propagation hop.
#[derive(Debug, Error)]
pub enum SlbtError {
    #[error("{site}: {source}")]
    System {
        site: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{site}: buffer error: path {path:?} exceeds PATH_MAX")]
    Buffer { site: &'static str, path: PathBuf },
    #[error("{site}: {source}")]
    Nested {
        site: &'static str,
        #[source]
        source: Box<SlbtError>,
    },
    #[error("{site}: {kind}")]
    Custom {
        site: &'static str,
        kind: ErrorKind,
    },
}

impl SlbtError {
    pub fn system(site: &'static str, source: std::io::Error) -> Self {
        SlbtError::System { site, source }
    }

    pub fn buffer(site: &'static str, path: impl Into<PathBuf>) -> Self {
        SlbtError::Buffer {
            site,
            path: path.into(),
        }
    }

    pub fn custom(site: &'static str, kind: ErrorKind) -> Self {
        SlbtError::Custom { site, kind }
    }

    pub fn nested(site: &'static str, source: SlbtError) -> Self {
        SlbtError::Nested {
            site,
            source: Box::new(source),
        }
    }

    /// The kind, when this is (transitively) a `Custom` error.
    pub fn kind(&self) -> Option<&ErrorKind> {
        match self {
            SlbtError::Custom { kind, .. } => Some(kind),
            SlbtError::Nested { source, .. } => source.kind(),
            _ => None,
        }
    }

    /// Whether this error (transitively, through `Nested`) is a usage error.
    /// `System`/`Buffer` errors, and a `Link` with a nonzero child exit code,
    /// are never usage errors.
    pub fn is_usage(&self) -> bool {
        self.kind().is_some_and(ErrorKind::is_usage)
    }
}

pub type SlbtResult<T> = std::result::Result<T, SlbtError>;
