//! `--mode=ar` driven end to end against real files on disk: merge two
//! archives and commit the result, then re-parse the committed file.

use std::io::Write;

use slibtool::archive::meta::parse_archive;
use slibtool::archive::writer::{build_archive, BuildMember, BuildSymbol};
use slibtool::modes::ar_mode::{run, write_outputs, ArModeRequest};
use slibtool::{ArchiveKind, Flavor};

fn write_sample(path: &std::path::Path, member_name: &str, symbol_name: &str) {
    let members = vec![BuildMember {
        name: member_name.into(),
        data: b"bytes".to_vec(),
        mtime: 0,
        uid: 0,
        gid: 0,
        mode: 0o644,
    }];
    let symbols = vec![BuildSymbol { name: symbol_name.into(), member_index: 0 }];
    let image = build_archive(ArchiveKind::Gnu, &members, &symbols).unwrap();
    let mut f = std::fs::File::create(path).unwrap();
    f.write_all(&image).unwrap();
}

#[test]
fn merge_writes_a_committed_archive_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.a");
    let b = dir.path().join("b.a");
    write_sample(&a, "a.o", "sym_a");
    write_sample(&b, "b.o", "sym_b");

    let out = dir.path().join("merged.a");
    let req = ArModeRequest {
        inputs: vec![a, b],
        merge: true,
        output: Some(out.clone()),
        ..Default::default()
    };

    let report = run(&req, Flavor::Default, ArchiveKind::Gnu).unwrap();
    write_outputs(&req, &report).unwrap();

    let on_disk = std::fs::read(&out).unwrap();
    let meta = parse_archive(&on_disk).unwrap();
    let names: Vec<&str> = meta.public_members().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["a.o", "b.o"]);
}
