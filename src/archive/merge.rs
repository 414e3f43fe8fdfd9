//! Archive merger: concatenate public members from several
//! parsed archives into one, recomputing a fresh armap with the right
//! variant for the combined set.
//!
//! Grounded in `slbt_archive_merge.c`: reject mismatched armap variants up
//! front (`SLBT_ERR_AR_ARMAP_MISMATCH`), recompute every symbol's member
//! offset against its new position, and re-sort the symbol table for BSD
//! targets (`bsdmap`/`bsdsort`, strcmp-based stable placement).

use crate::archive::armap::ArmapVariant;
use crate::archive::kind::ArchiveKind;
use crate::archive::meta::ArchiveMeta;
use crate::archive::writer::{build_archive, BuildMember, BuildSymbol};
use crate::driver::error::{ErrorKind, SlbtError};

/// Merge `inputs` into a single archive image, emitting `target_kind`.
///
/// All inputs must carry the same armap variant and bit width (or no
/// armap at all); a mismatch is `SLBT_ERR_AR_ARMAP_MISMATCH`'s Rust
/// counterpart, `ErrorKind::ArArmapMismatch`.
pub fn merge_archives(inputs: &[ArchiveMeta<'_>], target_kind: ArchiveKind) -> Result<Vec<u8>, SlbtError> {
    if inputs.is_empty() {
        return Err(SlbtError::custom(
            "archive::merge::merge_archives",
            ErrorKind::ArNoInputSpecified,
        ));
    }

    let mut reference_variant: Option<(ArmapVariant, u32)> = None;
    for meta in inputs {
        if let Some(armap) = &meta.armap {
            match reference_variant {
                None => reference_variant = Some((armap.variant, armap.width)),
                Some((v, w)) if v == armap.variant && w == armap.width => {}
                Some(_) => {
                    return Err(SlbtError::custom(
                        "archive::merge::merge_archives",
                        ErrorKind::ArArmapMismatch,
                    ))
                }
            }
        }
    }

    let mut members = Vec::new();
    let mut symbols = Vec::new();

    for meta in inputs {
        // Map this input's member data offset to the new member's index,
        // so the input's armap entries (which record offsets within the
        // *source* archive) can be translated to the merged archive.
        let base_index = members.len();
        let mut offset_to_index = std::collections::HashMap::new();

        for member in meta.public_members() {
            offset_to_index.insert(member.header_offset as u64, members.len());
            members.push(BuildMember {
                name: member.name.clone(),
                data: meta.member_data(member).to_vec(),
                mtime: member.mtime,
                uid: member.uid as u32,
                gid: member.gid as u32,
                mode: member.mode as u32,
            });
        }
        let _ = base_index;

        if let Some(armap) = &meta.armap {
            for sym in &armap.symbols {
                if let Some(&member_index) = offset_to_index.get(&sym.member_offset) {
                    symbols.push(BuildSymbol {
                        name: sym.name.clone(),
                        member_index,
                    });
                }
            }
        }
    }

    if target_kind.is_bsd_like() {
        symbols.sort_by(|a, b| a.name.cmp(&b.name));
    }

    build_archive(target_kind, &members, &symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::meta::parse_archive;
    use crate::archive::writer::build_archive as build;

    fn one_member_archive(name: &str, data: &[u8], sym: &str) -> Vec<u8> {
        let members = vec![BuildMember {
            name: name.to_string(),
            data: data.to_vec(),
            mtime: 0,
            uid: 0,
            gid: 0,
            mode: 0o644,
        }];
        let symbols = vec![BuildSymbol {
            name: sym.to_string(),
            member_index: 0,
        }];
        build(ArchiveKind::Gnu, &members, &symbols).unwrap()
    }

    #[test]
    fn merges_two_archives_union_of_symbols() {
        let a = one_member_archive("a.o", b"aaaa", "sym_a");
        let b = one_member_archive("b.o", b"bbbb", "sym_b");
        let meta_a = parse_archive(&a).unwrap();
        let meta_b = parse_archive(&b).unwrap();

        let merged = merge_archives(&[meta_a, meta_b], ArchiveKind::Gnu).unwrap();
        let meta = parse_archive(&merged).unwrap();

        let names: Vec<_> = meta.public_members().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["a.o", "b.o"]);

        let armap = meta.armap.unwrap();
        let symnames: Vec<_> = armap.symbols.iter().map(|s| s.name.clone()).collect();
        assert_eq!(symnames, vec!["sym_a", "sym_b"]);
    }

    #[test]
    fn rejects_mismatched_armap_variants() {
        let a = one_member_archive("a.o", b"aaaa", "sym_a");
        let meta_a = parse_archive(&a).unwrap();

        let bsd_members = vec![BuildMember {
            name: "c.o".into(),
            data: b"cccc".to_vec(),
            mtime: 0,
            uid: 0,
            gid: 0,
            mode: 0o644,
        }];
        let bsd_symbols = vec![BuildSymbol {
            name: "sym_c".into(),
            member_index: 0,
        }];
        let bsd_image = build(ArchiveKind::Bsd, &bsd_members, &bsd_symbols).unwrap();
        let meta_bsd = parse_archive(&bsd_image).unwrap();

        assert!(merge_archives(&[meta_a, meta_bsd], ArchiveKind::Gnu).is_err());
    }
}
