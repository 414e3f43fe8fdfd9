//! Executable wrapper script.
//!
//! Grounded in `slbt_linkcmd_executable.c`: a `#!/bin/sh` wrapper that
//! rebuilds `DL_PATH_FIXUP` from the wrapper's own depth relative to the
//! build directory, exports the flavor's loader-path variable, and either
//! re-execs `$1` (when invoked as the wrapper itself) or execs the real
//! binary under `.libs/`.

use std::path::Path;

/// `${0%/*}` plus one `/..` per path component between `cwd` and the
/// wrapper's own directory (`slbt_emit_fdwrap_dl_path_fixup`).
pub fn dl_path_fixup(cwd: &Path, wrapper_path: &Path) -> String {
    let wrapper_dir = wrapper_path.parent().unwrap_or_else(|| Path::new(""));
    let relative = wrapper_dir.strip_prefix(cwd).unwrap_or(wrapper_dir);
    let depth = relative.components().filter(|c| *c != std::path::Component::CurDir).count();

    let mut fixup = String::from("${0%/*}");
    for _ in 0..depth {
        fixup.push_str("/..");
    }
    fixup.push('/');
    fixup
}

pub struct WrapperInputs<'a> {
    pub ldrpath_env: &'a str,
    pub dl_path_fixup: &'a str,
    /// `.libs`-relative directories collected from `-L` flags during
    /// argument adjustment; appended to `DL_PATH` in order.
    pub libs_dirs: &'a [String],
    pub wrapper_basename: &'a str,
    /// `cwd`-prefix to exec the real binary under when not re-execing
    /// `$1`; empty when the final exe path is already absolute.
    pub exec_prefix: &'a str,
    pub exec_path: &'a str,
}

/// Render the full wrapper script body.
pub fn render(inputs: &WrapperInputs<'_>) -> String {
    let WrapperInputs {
        ldrpath_env,
        dl_path_fixup,
        libs_dirs,
        wrapper_basename,
        exec_prefix,
        exec_path,
    } = *inputs;

    let mut out = String::new();
    out.push_str("#!/bin/sh\n");
    out.push_str("# libtool compatible executable wrapper\n\n");

    out.push_str(&format!(
        "if [ -z \"${ldrpath_env}\" ]; then\n\
         \tDL_PATH=\n\
         \tCOLON=\n\
         \tLCOLON=\n\
         else\n\
         \tDL_PATH=\n\
         \tCOLON=\n\
         \tLCOLON=':'\n\
         fi\n\n\
         DL_PATH_FIXUP=\"{dl_path_fixup}\";\n\n"
    ));

    for dir in libs_dirs {
        out.push_str(&format!("DL_PATH=\"${{DL_PATH}}${{COLON}}${{DL_PATH_FIXUP}}{dir}\"\nCOLON=':'\n"));
    }
    out.push('\n');

    out.push_str(&format!(
        "DL_PATH=\"${{DL_PATH}}${{LCOLON}}${{{ldrpath_env}}}\"\n\n\
         export {ldrpath_env}=\"$DL_PATH\"\n\n\
         if [ $(basename \"$0\") = \"{wrapper_basename}\" ]; then\n\
         \tprogram=\"$1\"; shift\n\
         \texec \"$program\" \"$@\"\n\
         fi\n\n\
         exec {exec_prefix}{exec_path} \"$@\"\n"
    ));

    out
}
