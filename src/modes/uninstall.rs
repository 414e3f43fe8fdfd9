//! `--mode=uninstall`: remove a `.la` wrapper together
//! with its archive and `library_names` set.
//!
//! Grounded in `slbt_exec_uninstall.c`: uninstall removes exactly the
//! files the `.la` wrapper already records, rather than recomputing a
//! filename plan the way link-time synthesis does.

use std::fs;
use std::path::Path;

use crate::driver::error::SlbtError;

pub struct UninstallRequest<'a> {
    pub dir: &'a Path,
    pub la_filename: &'a str,
    pub archive_name: Option<&'a str>,
    pub library_names: &'a [String],
}

pub fn run(req: &UninstallRequest<'_>) -> Result<(), SlbtError> {
    let remove = |name: &str| -> Result<(), SlbtError> {
        let path = req.dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SlbtError::system("modes::uninstall::run", e)),
        }
    };

    remove(req.la_filename)?;
    if let Some(archive_name) = req.archive_name {
        remove(archive_name)?;
    }
    for name in req.library_names {
        remove(name)?;
    }
    Ok(())
}
