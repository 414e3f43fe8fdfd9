//! Link planner: decides which outputs a link invocation
//! produces and assembles the filenames, dependency sidecar, and wrapper
//! script for them. Phase 1 (argument adjustment) lives in
//! [`crate::driver::argv`]; this module picks up from the classified
//! argument vectors and runs phases 2-6.

use crate::driver::error::{ErrorKind, SlbtError};
use crate::host::flavor::{Flavor, FlavorSettings};
use crate::link::filenames::{self, FilenameInputs, FilenamePlan, VersionInfo};

/// The subset of driver flags phase 2's policy table keys on.
#[derive(Debug, Clone, Default)]
pub struct LinkRequest {
    pub libname: Option<String>,
    pub module: bool,
    pub static_requested: bool,
    pub shared_requested: bool,
    pub rpath: Option<String>,
    pub release: Option<String>,
    pub version: Option<String>,
    pub avoid_version: bool,
    pub static_libtool_libs: bool,
}

/// Which outputs a given [`LinkRequest`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPolicy {
    ArchiveOnly,
    ArchiveSharedAndWrapper,
    ArchiveAndConvenienceDso,
    Executable,
}

pub fn choose_output_policy(req: &LinkRequest) -> Result<OutputPolicy, SlbtError> {
    let is_library = req.libname.is_some() || req.module;

    if !is_library {
        return Ok(OutputPolicy::Executable);
    }

    if req.static_requested && !req.shared_requested {
        return Ok(OutputPolicy::ArchiveOnly);
    }

    if req.shared_requested {
        return Ok(if req.rpath.is_some() {
            OutputPolicy::ArchiveSharedAndWrapper
        } else {
            OutputPolicy::ArchiveAndConvenienceDso
        });
    }

    // Neither -static nor -shared named explicitly for a library target:
    // libtool's own default is to build both, which this table doesn't
    // carve out a distinct row for; treat it the same as an explicit
    // `-shared -rpath` build, since that is what downstream consumers of
    // `libNAME.la` expect to find.
    Ok(if req.rpath.is_some() {
        OutputPolicy::ArchiveSharedAndWrapper
    } else {
        OutputPolicy::ArchiveAndConvenienceDso
    })
}

pub struct PlannedLink {
    pub policy: OutputPolicy,
    pub filenames: Option<FilenamePlan>,
}

/// Run phases 2-3: decide the output policy and, for library targets,
/// synthesize every derived filename.
pub fn plan(req: &LinkRequest, flavor: Flavor, settings: &FlavorSettings) -> Result<PlannedLink, SlbtError> {
    let policy = choose_output_policy(req)?;

    let filenames = match (&req.libname, policy) {
        (Some(libname), OutputPolicy::Executable) | (None, _) => {
            let _ = libname;
            None
        }
        (Some(libname), _) => {
            let version = match req.version.as_deref() {
                None => None,
                Some(s) => Some(
                    VersionInfo::parse(s)
                        .ok_or_else(|| SlbtError::custom("link::planner::plan", ErrorKind::Flow))?,
                ),
            };
            Some(filenames::synthesize(&FilenameInputs {
                libname,
                flavor,
                settings,
                release: req.release.as_deref(),
                version,
                avoid_version: req.avoid_version,
            }))
        }
    };

    Ok(PlannedLink { policy, filenames })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_req() -> LinkRequest {
        LinkRequest {
            libname: Some("foo".into()),
            ..Default::default()
        }
    }

    #[test]
    fn static_only_yields_archive_only() {
        let req = LinkRequest {
            static_requested: true,
            ..base_req()
        };
        assert_eq!(choose_output_policy(&req).unwrap(), OutputPolicy::ArchiveOnly);
    }

    #[test]
    fn shared_with_rpath_yields_full_chain() {
        let req = LinkRequest {
            shared_requested: true,
            rpath: Some("/usr/lib".into()),
            ..base_req()
        };
        assert_eq!(
            choose_output_policy(&req).unwrap(),
            OutputPolicy::ArchiveSharedAndWrapper
        );
    }

    #[test]
    fn shared_without_rpath_yields_convenience_dso() {
        let req = LinkRequest {
            shared_requested: true,
            ..base_req()
        };
        assert_eq!(
            choose_output_policy(&req).unwrap(),
            OutputPolicy::ArchiveAndConvenienceDso
        );
    }

    #[test]
    fn no_libname_yields_executable() {
        let req = LinkRequest::default();
        assert_eq!(choose_output_policy(&req).unwrap(), OutputPolicy::Executable);
    }
}
