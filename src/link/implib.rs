//! PE import-library creation.
//!
//! Grounded in `slbt_linkcmd_implib.c`: choose `mdso` or `dlltool` (a
//! driver-flag override wins, else `mdso` for the midipix flavor, else
//! `dlltool`), build its argv, and spawn it. `dlltool` additionally gets
//! an assembler sub-invocation (`-S ... -f --32/--64 -m i386[:x86-64]`)
//! derived from the host triplet's leading `iN86-` pattern.

use std::path::Path;
use std::process::Command;

use crate::driver::error::{ErrorKind, SlbtError};
use crate::host::flavor::Flavor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplibChooser {
    Idata,
    DsoMeta,
    /// No explicit override: fall back to the flavor default.
    Auto,
}

fn wants_mdso(chooser: ImplibChooser, flavor: Flavor) -> bool {
    match chooser {
        ImplibChooser::DsoMeta => true,
        ImplibChooser::Idata => false,
        ImplibChooser::Auto => flavor == Flavor::Midipix,
    }
}

/// `iN86-` (N in 3..=6) leading component of a host triplet selects the
/// 32-bit assembler flags; anything else gets the 64-bit x86 flags.
fn is_i386_like_triplet(host: &str) -> bool {
    let bytes = host.as_bytes();
    bytes.len() >= 5
        && bytes[0] == b'i'
        && (b'3'..=b'6').contains(&bytes[1])
        && bytes[2] == b'8'
        && bytes[3] == b'6'
        && bytes[4] == b'-'
}

pub struct ImplibRequest<'a> {
    pub chooser: ImplibChooser,
    pub flavor: Flavor,
    pub mdso_tool: &'a Path,
    pub dlltool_tool: &'a Path,
    pub assembler: Option<&'a Path>,
    pub host_triplet: &'a str,
    pub impfilename: &'a Path,
    pub deffilename: &'a Path,
    pub soname: &'a str,
}

/// Build the spawn-ready `Command` without running it; callers drive
/// execution so tests can assert on argv without touching a process.
pub fn build_command(req: &ImplibRequest<'_>) -> Command {
    if wants_mdso(req.chooser, req.flavor) {
        let mut cmd = Command::new(req.mdso_tool);
        cmd.arg("-i")
            .arg(req.impfilename)
            .arg("-n")
            .arg(req.soname)
            .arg(req.deffilename);
        cmd
    } else {
        let mut cmd = Command::new(req.dlltool_tool);
        cmd.arg("-l")
            .arg(req.impfilename)
            .arg("-d")
            .arg(req.deffilename)
            .arg("-D")
            .arg(req.soname);
        if let Some(as_tool) = req.assembler {
            cmd.arg("-S").arg(as_tool);
            if is_i386_like_triplet(req.host_triplet) {
                cmd.arg("-f").arg("--32").arg("-m").arg("i386");
            } else {
                cmd.arg("-f").arg("--64").arg("-m").arg("i386:x86-64");
            }
        }
        cmd
    }
}

pub fn run(req: &ImplibRequest<'_>) -> Result<(), SlbtError> {
    let mdso = wants_mdso(req.chooser, req.flavor);
    let mut cmd = build_command(req);
    let status = cmd
        .status()
        .map_err(|e| SlbtError::system("link::implib::run", e))?;
    if !status.success() {
        return Err(SlbtError::custom(
            "link::implib::run",
            if mdso { ErrorKind::Mdso } else { ErrorKind::Dlltool },
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_mdso_for_midipix_by_default() {
        assert!(wants_mdso(ImplibChooser::Auto, Flavor::Midipix));
        assert!(!wants_mdso(ImplibChooser::Auto, Flavor::Mingw));
    }

    #[test]
    fn explicit_chooser_overrides_flavor() {
        assert!(wants_mdso(ImplibChooser::DsoMeta, Flavor::Mingw));
        assert!(!wants_mdso(ImplibChooser::Idata, Flavor::Midipix));
    }

    #[test]
    fn recognizes_i386_triplet_prefixes() {
        assert!(is_i386_like_triplet("i686-w64-mingw32"));
        assert!(is_i386_like_triplet("i386-pc-windows"));
        assert!(!is_i386_like_triplet("x86_64-w64-mingw32"));
    }
}
