//! `--mode=execute`: run a program under the same
//! loader-path augmentation the executable wrapper bakes into a script, but
//! without ever writing that script to disk — a "re-exec" contract for
//! invocation under a wrapper name.

use std::path::Path;
use std::process::{Command, ExitStatus};

use crate::driver::error::SlbtError;

pub struct ExecuteRequest<'a> {
    pub ldrpath_env: &'a str,
    pub libs_dirs: &'a [String],
    pub existing_ldrpath: Option<&'a str>,
    pub program: &'a Path,
    pub args: &'a [String],
}

/// Build the augmented loader-path value a wrapper script would export.
pub fn augmented_ldrpath(libs_dirs: &[String], existing: Option<&str>) -> String {
    let mut parts: Vec<&str> = libs_dirs.iter().map(String::as_str).collect();
    if let Some(existing) = existing {
        if !existing.is_empty() {
            parts.push(existing);
        }
    }
    parts.join(":")
}

pub fn run(req: &ExecuteRequest<'_>) -> Result<ExitStatus, SlbtError> {
    let dl_path = augmented_ldrpath(req.libs_dirs, req.existing_ldrpath);
    let mut cmd = Command::new(req.program);
    cmd.args(req.args);
    cmd.env(req.ldrpath_env, dl_path);
    cmd.status()
        .map_err(|e| SlbtError::system("modes::execute::run", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn augmented_path_joins_dirs_then_existing() {
        let dirs = vec![".libs".to_string(), "../other/.libs".to_string()];
        assert_eq!(
            augmented_ldrpath(&dirs, Some("/usr/lib")),
            ".libs:../other/.libs:/usr/lib"
        );
    }

    #[test]
    fn augmented_path_without_existing_has_no_trailing_colon() {
        let dirs = vec![".libs".to_string()];
        assert_eq!(augmented_ldrpath(&dirs, None), ".libs");
    }

    #[test]
    fn runs_program_with_env_set() {
        let req = ExecuteRequest {
            ldrpath_env: "LD_LIBRARY_PATH",
            libs_dirs: &[".libs".to_string()],
            existing_ldrpath: None,
            program: Path::new("/bin/true"),
            args: &[],
        };
        let status = run(&req).expect("/bin/true should spawn");
        assert!(status.success());
    }
}
