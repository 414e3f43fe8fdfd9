//! Process-wide driver context and the bounded error vector.

use std::path::PathBuf;

use crate::driver::error::SlbtError;
use crate::host::flavor::{Flavor, FlavorSettings};
use crate::host::triplet::HostParams;

/// An invocation accumulates at most this many error records; beyond that,
/// further errors are dropped silently to guarantee bounded memory use.
pub const MAX_ERRORS: usize = 64;

/// The operating mode selected by `--mode=` or by invocation basename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Compile,
    Link,
    Install,
    Uninstall,
    Execute,
    Ar,
    Config,
    Info,
    Stoolie,
}

/// A chronological, bounded error log. New records past capacity are
/// dropped rather than reallocating, matching a fixed-capacity buffer.
#[derive(Debug, Default)]
pub struct ErrorVector {
    records: Vec<SlbtError>,
}

impl ErrorVector {
    pub fn push(&mut self, err: SlbtError) {
        if self.records.len() < MAX_ERRORS {
            self.records.push(err);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlbtError> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Process-wide read-mostly configuration.
pub struct DriverContext {
    pub mode: Mode,
    pub verbosity: u8,
    pub host: HostParams,
    pub flavor: Flavor,
    pub flavor_settings: FlavorSettings,
    pub cwd: PathBuf,
    pub errors: ErrorVector,
    pub no_color: bool,
    pub dry_run: bool,
}

impl DriverContext {
    pub fn new(mode: Mode, host: HostParams, cwd: PathBuf) -> Self {
        let flavor = Flavor::from_triplet(&host.triplet);
        let flavor_settings = FlavorSettings::for_flavor(flavor);
        DriverContext {
            mode,
            verbosity: 0,
            host,
            flavor,
            flavor_settings,
            cwd,
            errors: ErrorVector::default(),
            no_color: std::env::var_os("NO_COLOR").is_some(),
            dry_run: false,
        }
    }

    pub fn record(&mut self, err: SlbtError) {
        self.errors.push(err);
    }

    /// Flush accumulated errors to `stderr`, one per record, with
    /// file/function/line-equivalent site context.
    pub fn flush_errors(&self) {
        for err in self.errors.iter() {
            tracing::error!(error = %err, "invocation failed");
        }
    }

    /// The process exit code implied by the current error state: `0` with
    /// no recorded errors, `1` when every recorded error is a usage error
    /// (bad/missing arguments), `2` as soon as any error is not.
    pub fn exit_code(&self) -> i32 {
        if self.errors.is_empty() {
            0
        } else if self.errors.iter().all(SlbtError::is_usage) {
            1
        } else {
            2
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::error::ErrorKind;
    use crate::host::triplet::derive_host;

    fn ctx() -> DriverContext {
        let host = derive_host(Some("x86_64-pc-linux-gnu"), None, "cc", None);
        DriverContext::new(Mode::Link, host, PathBuf::from("."))
    }

    #[test]
    fn exit_code_zero_with_no_errors() {
        assert_eq!(ctx().exit_code(), 0);
    }

    #[test]
    fn exit_code_one_when_every_error_is_usage() {
        let mut c = ctx();
        c.record(SlbtError::custom("test", ErrorKind::Flow));
        c.record(SlbtError::custom("test", ErrorKind::OutputNotSpecified));
        assert_eq!(c.exit_code(), 1);
    }

    #[test]
    fn exit_code_two_when_any_error_is_not_usage() {
        let mut c = ctx();
        c.record(SlbtError::custom("test", ErrorKind::Flow));
        c.record(SlbtError::custom("test", ErrorKind::ArTruncatedData));
        assert_eq!(c.exit_code(), 2);
    }

    #[test]
    fn exit_code_two_for_nested_non_usage_error() {
        let mut c = ctx();
        c.record(SlbtError::nested(
            "test",
            SlbtError::custom("inner", ErrorKind::ArInvalidHeader),
        ));
        assert_eq!(c.exit_code(), 2);
    }
}

/// Per-phase scratch state for one compile/link/install invocation.
#[derive(Default)]
pub struct ExecContext {
    pub output: Option<PathBuf>,
    pub pic_object: Option<PathBuf>,
    pub non_pic_object: Option<PathBuf>,
    pub soname: Option<String>,
    pub no_undefined: bool,
    pub export_symbols_file: Option<PathBuf>,
    pub rpath: Option<PathBuf>,
    pub scratch: Vec<PathBuf>,
    pub exit_code: i32,
}
