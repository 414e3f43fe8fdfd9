//! Driver argument splitter.
//!
//! Separates the raw process argv into three independent vectors:
//! - `dargv`: the fully normalized argv, each token standalone
//!   (`-I /path` becomes `-Ipath`'s worth of two tokens collapsed to one
//!   logical `-I<path>` entry; `--library=foo` becomes `-l foo`).
//! - `targv`: slibtool's own options and mode-level switches.
//! - `cargv`: the downstream compiler/linker invocation.

use std::path::Path;

use crate::driver::error::{ErrorKind, SlbtError};

const CCACHE_WRAPPERS: &[&str] = &["ccache", "distcc", "compiler", "purify"];

#[derive(Debug, Default, Clone)]
pub struct SplitArgv {
    pub dargv: Vec<String>,
    pub targv: Vec<String>,
    pub cargv: Vec<String>,
    pub ccwrap: Option<String>,
}

fn known_targv_flag(tok: &str) -> bool {
    matches!(
        tok,
        "--mode"
            | "-o"
            | "-rpath"
            | "-release"
            | "-version-info"
            | "-version-number"
            | "-avoid-version"
            | "-module"
            | "-shared"
            | "-static"
            | "-static-libtool-libs"
            | "-export-dynamic"
            | "-export-symbols"
            | "-export-symbols-regex"
            | "-dlopen"
            | "-dlpreopen"
            | "-no-undefined"
            | "-shrext"
            | "--host"
            | "--target"
            | "-disable-static"
            | "-disable-shared"
    ) || tok.starts_with("--mode=")
        || tok.starts_with("-version-info=")
        || tok.starts_with("-shrext=")
}

/// Basename of `argv[0]`, stripping any directory component.
pub fn program_basename(argv0: &str) -> &str {
    Path::new(argv0)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(argv0)
}

/// Normalize a raw argv into `dargv`: collapse `-I path`, `-l path`,
/// `-L path`, `--library[=]`, `--library-path[=]`, `-Xlinker ARG`, and
/// splice `--sysroot`/`--sysroot=` handling is left to the caller since it
/// also needs to shrink the "unit index" boundary between slibtool's own
/// args and the compiler's.
pub fn normalize_argv(raw: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let tok = raw[i].as_str();
        match tok {
            "-I" if i + 1 < raw.len() => {
                out.push(format!("-I{}", raw[i + 1]));
                i += 2;
            }
            "-l" if i + 1 < raw.len() => {
                out.push(format!("-l{}", raw[i + 1]));
                i += 2;
            }
            "-L" if i + 1 < raw.len() => {
                out.push(format!("-L{}", raw[i + 1]));
                i += 2;
            }
            "--library" if i + 1 < raw.len() => {
                out.push(format!("-l{}", raw[i + 1]));
                i += 2;
            }
            "--library-path" if i + 1 < raw.len() => {
                out.push(format!("-L{}", raw[i + 1]));
                i += 2;
            }
            "-Xlinker" if i + 1 < raw.len() => {
                out.push(format!("-Wl,{}", raw[i + 1]));
                i += 2;
            }
            _ if tok.starts_with("--library=") => {
                out.push(format!("-l{}", &tok[10..]));
                i += 1;
            }
            _ if tok.starts_with("--library-path=") => {
                out.push(format!("-L{}", &tok[15..]));
                i += 1;
            }
            _ => {
                out.push(tok.to_string());
                i += 1;
            }
        }
    }
    out
}

/// Detect mutually-incompatible flag pairs (`-static`/`-shared`, etc.) and
/// report a single error rather than a cascading one per conflicting pair.
pub fn check_incompatible_pairs(targv: &[String]) -> Result<(), SlbtError> {
    let has = |f: &str| targv.iter().any(|t| t == f);
    let conflicts: &[(&str, &str)] = &[
        ("-static", "-shared"),
        ("-static", "-disable-static"),
        ("-shared", "-disable-shared"),
        ("-all-static", "-shared"),
    ];
    for (a, b) in conflicts {
        if has(a) && has(b) {
            return Err(SlbtError::custom(
                "driver::argv::check_incompatible_pairs",
                ErrorKind::Flow,
            ));
        }
    }
    Ok(())
}

/// Expand `-objectlist FILE` entries in `cargv`, splicing FILE's
/// whitespace-separated object paths in place of the two original tokens.
pub fn expand_objectlists(cargv: &[String], cwd: &Path) -> Result<Vec<String>, SlbtError> {
    let mut out = Vec::with_capacity(cargv.len());
    let mut i = 0;
    while i < cargv.len() {
        if cargv[i] == "-objectlist" && i + 1 < cargv.len() {
            let path = cwd.join(&cargv[i + 1]);
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| SlbtError::system("driver::argv::expand_objectlists", e))?;
            out.extend(contents.split_whitespace().map(str::to_string));
            i += 2;
        } else {
            out.push(cargv[i].clone());
            i += 1;
        }
    }
    Ok(out)
}

/// Split a normalized argv into `targv`/`cargv` at the first token that is
/// not a recognized slibtool/mode-level option, honoring the `-o ARG` and
/// `-Xcompiler ARG` as atomic units, and recognizing a known compiler
/// wrapper (`ccache`, `distcc`, `compiler`, `purify`) immediately before
/// the compiler as `--ccwrap`.
pub fn split_targv_cargv(dargv: &[String]) -> SplitArgv {
    let mut targv = Vec::new();
    let mut cargv = Vec::new();
    let mut ccwrap = None;
    let mut in_cargv = false;
    let mut i = 0;

    while i < dargv.len() {
        let tok = dargv[i].as_str();

        if !in_cargv {
            if tok == "-o" || tok == "-Xcompiler" {
                targv.push(tok.to_string());
                if i + 1 < dargv.len() {
                    targv.push(dargv[i + 1].clone());
                    i += 2;
                    continue;
                }
                i += 1;
                continue;
            }

            if known_targv_flag(tok) {
                targv.push(tok.to_string());
                // A handful of targv options take a separate-token argument.
                if matches!(
                    tok,
                    "--mode"
                        | "-rpath"
                        | "-release"
                        | "-version-info"
                        | "-version-number"
                        | "-export-symbols"
                        | "-export-symbols-regex"
                        | "-dlopen"
                        | "-dlpreopen"
                        | "-shrext"
                        | "--host"
                        | "--target"
                ) && i + 1 < dargv.len()
                    && !dargv[i + 1].starts_with('-')
                {
                    targv.push(dargv[i + 1].clone());
                    i += 2;
                    continue;
                }
                i += 1;
                continue;
            }

            // First non-option token (or an unrecognized `-` flag) begins
            // the compiler invocation.
            in_cargv = true;
            let base = program_basename(tok);
            if CCACHE_WRAPPERS.contains(&base) {
                ccwrap = Some(tok.to_string());
                targv.push("--ccwrap".to_string());
                i += 1;
                continue;
            }
        }

        cargv.push(tok.to_string());
        i += 1;
    }

    SplitArgv {
        dargv: dargv.to_vec(),
        targv,
        cargv,
        ccwrap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separate_token_flags() {
        let raw = vec![
            "-I".into(),
            "/usr/include".into(),
            "-l".into(),
            "m".into(),
            "--library=pthread".into(),
        ];
        let dargv = normalize_argv(&raw);
        assert_eq!(
            dargv,
            vec!["-I/usr/include", "-lm", "-lpthread"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn xlinker_becomes_wl_comma() {
        let raw = vec!["-Xlinker".into(), "--no-undefined".into()];
        assert_eq!(normalize_argv(&raw), vec!["-Wl,--no-undefined"]);
    }

    #[test]
    fn splits_mode_and_compiler_invocation() {
        let dargv = normalize_argv(&[
            "--mode".into(),
            "link".into(),
            "-o".into(),
            "libfoo.la".into(),
            "cc".into(),
            "foo.lo".into(),
        ]);
        let split = split_targv_cargv(&dargv);
        assert_eq!(split.targv, vec!["--mode", "link", "-o", "libfoo.la"]);
        assert_eq!(split.cargv, vec!["cc", "foo.lo"]);
    }

    #[test]
    fn detects_static_shared_conflict() {
        let targv = vec!["-static".to_string(), "-shared".to_string()];
        assert!(check_incompatible_pairs(&targv).is_err());
    }

    #[test]
    fn recognizes_ccache_wrapper() {
        let dargv = normalize_argv(&[
            "--mode".into(),
            "link".into(),
            "ccache".into(),
            "cc".into(),
            "foo.lo".into(),
        ]);
        let split = split_targv_cargv(&dargv);
        assert!(split.targv.contains(&"--ccwrap".to_string()));
        assert_eq!(split.ccwrap.as_deref(), Some("ccache"));
    }
}
