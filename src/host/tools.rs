//! Tool discovery.
//!
//! `ar`, `as`, `nm`, `ranlib`, `windres`, `dlltool`, `mdso` are resolved to
//! concrete program names, preferring a triplet-prefixed variant and
//! probing it by actually spawning it before falling back.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::archive::kind::ArchiveKind;
use crate::archive::writer::build_archive;
use crate::host::flavor::Flavor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Ar,
    As,
    Nm,
    Ranlib,
    Windres,
    Dlltool,
    Mdso,
}

impl Tool {
    fn basename(self) -> &'static str {
        match self {
            Tool::Ar => "ar",
            Tool::As => "as",
            Tool::Nm => "nm",
            Tool::Ranlib => "ranlib",
            Tool::Windres => "windres",
            Tool::Dlltool => "dlltool",
            Tool::Mdso => "mdso",
        }
    }

    /// PE-only tools are suppressed entirely on non-PE flavors.
    fn pe_only(self) -> bool {
        matches!(self, Tool::Windres | Tool::Dlltool | Tool::Mdso)
    }
}

/// Spawn `<candidate> -t <archive>` (or, for non-ar tools, `--version`),
/// discarding output, to check the candidate exists and actually succeeds.
/// For `ar`, `<archive>` is a real, minimal, valid empty archive written to
/// a tempfile, not `/dev/null` — a working `ar` exits non-zero against
/// `/dev/null` (it isn't a valid archive), so that candidate would never
/// distinguish a working `ar` from any other executable sharing its name.
fn probe(candidate: &str, tool: Tool) -> bool {
    match tool {
        Tool::Ar => {
            let Ok(mut tmp) = tempfile::NamedTempFile::new() else {
                return false;
            };
            let Ok(image) = build_archive(ArchiveKind::Gnu, &[], &[]) else {
                return false;
            };
            if tmp.write_all(&image).is_err() {
                return false;
            }
            Command::new(candidate)
                .arg("-t")
                .arg(tmp.path())
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|status| status.success())
                .unwrap_or(false)
        }
        _ => Command::new(candidate)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false),
    }
}

/// Resolve the concrete program name for `tool`, given the derived host
/// triplet and an explicit override (e.g. `--ar=...`) if one was given on
/// the command line. Returns `None` when the tool is suppressed for the
/// current flavor.
pub fn resolve_tool(
    tool: Tool,
    explicit: Option<&str>,
    triplet: &str,
    build_machine: &str,
    flavor: Flavor,
) -> Option<String> {
    if tool.pe_only() && !flavor.is_coff() {
        return None;
    }

    if let Some(explicit) = explicit {
        return Some(explicit.to_string());
    }

    let base = tool.basename();
    let prefixed = format!("{triplet}-{base}");
    if probe(&prefixed, tool) {
        return Some(prefixed);
    }

    let triplet_basename = triplet.rsplit_once('-').map(|(p, _)| p).unwrap_or(triplet);
    let double_prefixed = format!("{triplet}-{triplet_basename}-{base}");
    if probe(&double_prefixed, tool) {
        return Some(double_prefixed);
    }

    let basename_prefixed = format!("{triplet_basename}-{base}");
    if probe(&basename_prefixed, tool) {
        return Some(basename_prefixed);
    }

    if triplet == build_machine {
        return Some(base.to_string());
    }

    // Nothing probed successfully; still return the best guess so callers
    // get a deterministic spawn attempt (and a clear ENOENT) rather than a
    // silent `None`.
    Some(prefixed)
}
