//! `--mode=install`: copy a `.la` wrapper's archive and
//! its `library_names` set into a destination directory, recreating the
//! symlink chain there and rewriting the installed copy's `installed` and
//! `dlname` fields.
//!
//! Grounded in `slbt_exec_install.c`: install reads the already-recorded
//! `library_names`/`old_library` fields out of the source `.la` rather
//! than recomputing version numbers, and always recreates the symlink
//! chain at the destination rather than copying symlinks verbatim, since
//! the source chain's targets are relative to the build directory, not
//! the install directory.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;

use crate::driver::error::SlbtError;

pub struct InstallRequest<'a> {
    pub source_dir: &'a Path,
    pub dest_dir: &'a Path,
    pub la_filename: &'a str,
    pub archive_name: Option<&'a str>,
    /// `library_names` split on whitespace: real file first, then every
    /// symlink that should point at it, in the order libtool lists them
    /// (soname symlink before the plain symlink).
    pub library_names: &'a [String],
    pub la_contents: &'a str,
}

fn rewrite_la(la_contents: &str, dlname: &str) -> String {
    let mut out = String::new();
    for line in la_contents.lines() {
        if line.starts_with("installed=") {
            out.push_str("installed=yes\n");
        } else if line.starts_with("dlname=") {
            out.push_str(&format!("dlname='{dlname}'\n"));
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

pub fn run(req: &InstallRequest<'_>) -> Result<(), SlbtError> {
    fs::create_dir_all(req.dest_dir).map_err(|e| SlbtError::system("modes::install::run", e))?;

    let copy = |name: &str| -> Result<(), SlbtError> {
        let src = req.source_dir.join(name);
        let dst = req.dest_dir.join(name);
        if src.exists() {
            fs::copy(&src, &dst).map_err(|e| SlbtError::system("modes::install::run", e))?;
        }
        Ok(())
    };

    if let Some(archive_name) = req.archive_name {
        copy(archive_name)?;
    }

    let dlname = if let Some((real, links)) = req.library_names.split_first() {
        copy(real)?;
        for link in links {
            let link_path = req.dest_dir.join(link);
            let _ = fs::remove_file(&link_path);
            symlink(real, &link_path).map_err(|e| SlbtError::system("modes::install::run", e))?;
        }
        req.dest_dir.join(real).to_string_lossy().into_owned()
    } else {
        String::new()
    };

    let rewritten = rewrite_la(req.la_contents, &dlname);
    fs::write(req.dest_dir.join(req.la_filename), rewritten)
        .map_err(|e| SlbtError::system("modes::install::run", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_installed_and_dlname_fields() {
        let la = "dlname='.libs/libfoo.so.1'\ninstalled=no\nlibdir='/usr/local/lib'\n";
        let out = rewrite_la(la, "/usr/local/lib/libfoo.so.1");
        assert!(out.contains("installed=yes\n"));
        assert!(out.contains("dlname='/usr/local/lib/libfoo.so.1'\n"));
        assert!(out.contains("libdir='/usr/local/lib'\n"));
    }

    #[test]
    fn install_copies_archive_and_relinks_symlinks() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();

        fs::write(src_dir.path().join("libfoo.a"), b"ar-bytes").unwrap();
        fs::write(src_dir.path().join("libfoo.so.1.0.0"), b"dso-bytes").unwrap();

        let library_names = vec![
            "libfoo.so.1.0.0".to_string(),
            "libfoo.so.1".to_string(),
            "libfoo.so".to_string(),
        ];
        let req = InstallRequest {
            source_dir: src_dir.path(),
            dest_dir: dest_dir.path(),
            la_filename: "libfoo.la",
            archive_name: Some("libfoo.a"),
            library_names: &library_names,
            la_contents: "installed=no\ndlname='.libs/libfoo.so.1.0.0'\n",
        };
        run(&req).unwrap();

        assert!(dest_dir.path().join("libfoo.a").exists());
        assert!(dest_dir.path().join("libfoo.so.1.0.0").exists());
        assert!(dest_dir.path().join("libfoo.so").is_symlink());
        assert!(dest_dir.path().join("libfoo.so.1").is_symlink());
        let la_out = fs::read_to_string(dest_dir.path().join("libfoo.la")).unwrap();
        assert!(la_out.contains("installed=yes"));
        assert!(la_out.contains("libfoo.so.1.0.0'"));
    }
}
