//! `.la` wrapper install then uninstall, round-tripping through the
//! filesystem the way the `--mode=install`/`--mode=uninstall` CLI surface
//! does internally.

use std::fs;

use slibtool::modes::{install, uninstall};

const LA_CONTENTS: &str = "\
dlname='.libs/libfoo.so.1.0.0'\n\
library_names='libfoo.so.1.0.0 libfoo.so.1 libfoo.so'\n\
old_library='libfoo.a'\n\
installed=no\n\
libdir='/usr/local/lib'\n\
";

#[test]
fn install_then_uninstall_leaves_no_trace() {
    let build_dir = tempfile::tempdir().unwrap();
    let dest_dir = tempfile::tempdir().unwrap();

    fs::write(build_dir.path().join("libfoo.a"), b"ar-bytes").unwrap();
    fs::write(build_dir.path().join("libfoo.so.1.0.0"), b"dso-bytes").unwrap();

    let library_names = vec![
        "libfoo.so.1.0.0".to_string(),
        "libfoo.so.1".to_string(),
        "libfoo.so".to_string(),
    ];

    install::run(&install::InstallRequest {
        source_dir: build_dir.path(),
        dest_dir: dest_dir.path(),
        la_filename: "libfoo.la",
        archive_name: Some("libfoo.a"),
        library_names: &library_names,
        la_contents: LA_CONTENTS,
    })
    .unwrap();

    assert!(dest_dir.path().join("libfoo.la").exists());
    assert!(dest_dir.path().join("libfoo.a").exists());
    assert!(dest_dir.path().join("libfoo.so.1.0.0").exists());
    assert!(dest_dir.path().join("libfoo.so.1").is_symlink());
    assert!(dest_dir.path().join("libfoo.so").is_symlink());

    let installed_la = fs::read_to_string(dest_dir.path().join("libfoo.la")).unwrap();
    assert!(installed_la.contains("installed=yes"));

    uninstall::run(&uninstall::UninstallRequest {
        dir: dest_dir.path(),
        la_filename: "libfoo.la",
        archive_name: Some("libfoo.a"),
        library_names: &library_names,
    })
    .unwrap();

    let remaining: Vec<_> = fs::read_dir(dest_dir.path()).unwrap().collect();
    assert!(remaining.is_empty(), "directory should be empty after uninstall");
}
