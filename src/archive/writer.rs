//! Archive writer: assemble an in-memory archive image from
//! a member list plus a resolved symbol table, then commit it to disk with
//! an atomic temp-file-plus-rename.
//!
//! The header-printing helpers below (`print_gnu_small_member_header`,
//! `print_bsd_member_header`, `compute_string_table`) mirror the layout an
//! `ar` archive member header actually has on disk; what's different here
//! is that symbols are supplied pre-resolved by the caller (the merger, or
//! a `--mode=ar -Wmerge` front end) rather than extracted from object files
//! via an object-parsing crate, since every symbol this tool ever places
//! in an armap already exists in a previously parsed armap or comes from
//! spawning the system `nm`.

use std::io::Write;
use std::path::Path;

use crate::alignment::offset_to_alignment as alignment_offset_to;
use crate::archive::kind::ArchiveKind;
use crate::driver::error::SlbtError;

/// One member destined for a freshly built archive.
pub struct BuildMember {
    pub name: String,
    pub data: Vec<u8>,
    pub mtime: u64,
    pub uid: u32,
    pub gid: u32,
    pub mode: u32,
}

/// One resolved armap entry: `name` belongs to the member at `member_index`
/// in the slice passed to [`build_archive`].
pub struct BuildSymbol {
    pub name: String,
    pub member_index: usize,
}

fn is_bsd_like(kind: ArchiveKind) -> bool {
    kind.is_bsd_like()
}

fn print_rest_of_member_header<W: Write>(
    w: &mut W,
    mtime: u64,
    uid: u32,
    gid: u32,
    perms: u32,
    size: u64,
) -> std::io::Result<()> {
    write!(
        w,
        "{:<12}{:<6}{:<6}{:<8o}{:<10}`\n",
        mtime,
        uid % 1_000_000,
        gid % 1_000_000,
        perms,
        size
    )
}

fn print_gnu_small_member_header<W: Write>(w: &mut W, name: &str, m: &BuildMember, size: u64) -> std::io::Result<()> {
    write!(w, "{:<16}", format!("{name}/"))?;
    print_rest_of_member_header(w, m.mtime, m.uid, m.gid, m.mode, size)
}

fn print_gnu_name_ref_header<W: Write>(w: &mut W, offset: u64, m: &BuildMember, size: u64) -> std::io::Result<()> {
    write!(w, "{:<16}", format!("/{offset}"))?;
    print_rest_of_member_header(w, m.mtime, m.uid, m.gid, m.mode, size)
}

fn print_bsd_member_header<W: Write>(w: &mut W, name: &str, m: &BuildMember) -> std::io::Result<()> {
    let pad = alignment_offset_to((60 + name.len()) as u64, 8);
    let name_with_padding = name.len() as u64 + pad;
    write!(w, "#1/{:<13}", name_with_padding)?;
    print_rest_of_member_header(
        w,
        m.mtime,
        m.uid,
        m.gid,
        m.mode,
        name_with_padding + m.data.len() as u64,
    )?;
    write!(w, "{name}")?;
    write!(w, "{:\0<pad$}", "", pad = pad as usize)
}

/// `//` long-names member body: `name/\n` per entry, concatenated. Returns
/// the body plus each member's byte offset into it, in input order.
fn compute_gnu_string_table(names: &[&str]) -> (Vec<u8>, Vec<u64>) {
    let mut body = Vec::new();
    let mut offsets = Vec::with_capacity(names.len());
    for name in names {
        offsets.push(body.len() as u64);
        body.extend_from_slice(name.as_bytes());
        body.extend_from_slice(b"/\n");
    }
    (body, offsets)
}

fn needs_gnu_string_table_entry(name: &str) -> bool {
    name.len() >= 16 || name.contains('/')
}

/// Build a complete archive image in memory.
///
/// `symbols` must already be sorted the way the target variant expects
/// (GNU keeps insertion order; BSD requires lexicographic order by name —
/// callers building a BSD archive must sort before calling this).
pub fn build_archive(
    kind: ArchiveKind,
    members: &[BuildMember],
    symbols: &[BuildSymbol],
) -> Result<Vec<u8>, SlbtError> {
    let mut out = Vec::new();
    out.extend_from_slice(crate::archive::kind::ARCHIVE_SIGNATURE);

    let bsd = is_bsd_like(kind);
    let width: u32 = if kind.is_64bit() { 64 } else { 32 };

    // Long-names table is only used by the non-BSD variants; BSD embeds
    // names inline via `#1/N`.
    let long_name_targets: Vec<&str> = if bsd {
        Vec::new()
    } else {
        members
            .iter()
            .map(|m| m.name.as_str())
            .filter(|n| needs_gnu_string_table_entry(n))
            .collect()
    };
    let (namestrs_body, namestrs_offsets) = compute_gnu_string_table(&long_name_targets);

    // First pass: compute each member's header offset once the preceding
    // armap + namestrs members are known, so symbol offsets can be
    // resolved before anything is written.
    let armap_header_len = 60usize;
    let namestrs_header_len = if namestrs_body.is_empty() { 0 } else { 60 };
    let namestrs_padded_len = namestrs_body.len() + (namestrs_body.len() % 2);

    let field_width = (width / 8) as usize;
    let num_syms = symbols.len() as u64;
    let armap_body_len = if bsd {
        field_width + (2 * field_width * symbols.len())
            + field_width
            + symbols.iter().map(|s| s.name.len() + 1).sum::<usize>()
    } else {
        field_width + field_width * symbols.len() + symbols.iter().map(|s| s.name.len() + 1).sum::<usize>()
    };
    let armap_padded_len = armap_body_len + (armap_body_len % 2);

    let members_start = crate::archive::kind::ARCHIVE_SIGNATURE.len()
        + armap_header_len
        + armap_padded_len
        + namestrs_header_len
        + namestrs_padded_len;

    let mut member_offsets = Vec::with_capacity(members.len());
    let mut cursor = members_start;
    let mut gnu_name_idx = 0usize;
    for m in members {
        member_offsets.push(cursor as u64);
        let header_len = if bsd {
            60 + {
                let pad = alignment_offset_to((60 + m.name.len()) as u64, 8);
                m.name.len() + pad as usize
            }
        } else {
            60
        };
        let data_len = m.data.len();
        let padded = data_len + (data_len % 2);
        if !bsd && needs_gnu_string_table_entry(&m.name) {
            gnu_name_idx += 1;
        }
        cursor += header_len + padded;
    }
    let _ = gnu_name_idx;

    // Armap member.
    {
        let mut body = Vec::new();
        if bsd {
            let sizeof_refs = (2 * field_width * symbols.len()) as u64;
            write_field(&mut body, sizeof_refs, field_width, true);
            let mut strtab = Vec::new();
            for sym in symbols {
                let name_off = strtab.len() as u64;
                strtab.extend_from_slice(sym.name.as_bytes());
                strtab.push(0);
                write_field(&mut body, name_off, field_width, true);
                write_field(&mut body, member_offsets[sym.member_index], field_width, true);
            }
            write_field(&mut body, strtab.len() as u64, field_width, true);
            body.extend_from_slice(&strtab);
        } else {
            write_field(&mut body, num_syms, field_width, false);
            for sym in symbols {
                write_field(&mut body, member_offsets[sym.member_index], field_width, false);
            }
            for sym in symbols {
                body.extend_from_slice(sym.name.as_bytes());
                body.push(0);
            }
        }
        let pad = body.len() % 2;
        let name = if bsd {
            if width == 64 { "__.SYMDEF_64" } else { "__.SYMDEF" }
        } else if width == 64 {
            "/SYM64/"
        } else {
            "/"
        };
        write!(out, "{:<16}", name).map_err(write_err)?;
        print_rest_of_member_header(&mut out, 0, 0, 0, 0, body.len() as u64).map_err(write_err)?;
        out.extend_from_slice(&body);
        if pad != 0 {
            out.push(b'\n');
        }
    }

    // Long-names member (GNU/COFF only).
    if !namestrs_body.is_empty() {
        write!(out, "{:<48}", "//").map_err(write_err)?;
        write!(out, "{:<10}", namestrs_body.len() + namestrs_body.len() % 2).map_err(write_err)?;
        write!(out, "`\n").map_err(write_err)?;
        out.extend_from_slice(&namestrs_body);
        if namestrs_body.len() % 2 != 0 {
            out.push(b'\n');
        }
    }

    // Public members.
    let mut name_ref_iter = long_name_targets.iter().zip(namestrs_offsets.iter());
    for m in members {
        let pos_before = out.len();
        if bsd {
            print_bsd_member_header(&mut out, &m.name, m).map_err(write_err)?;
        } else if needs_gnu_string_table_entry(&m.name) {
            let (_, offset) = name_ref_iter
                .next()
                .expect("every long name has a reserved namestrs slot");
            print_gnu_name_ref_header(&mut out, *offset, m, m.data.len() as u64).map_err(write_err)?;
        } else {
            print_gnu_small_member_header(&mut out, &m.name, m, m.data.len() as u64).map_err(write_err)?;
        }
        out.extend_from_slice(&m.data);
        if m.data.len() % 2 != 0 {
            out.push(b'\n');
        }
        debug_assert_eq!(out.len() - pos_before, out.len() - pos_before);
    }

    Ok(out)
}

fn write_field(out: &mut Vec<u8>, value: u64, width: usize, little: bool) {
    if width == 4 {
        let v = value as u32;
        if little {
            out.extend_from_slice(&v.to_le_bytes());
        } else {
            out.extend_from_slice(&v.to_be_bytes());
        }
    } else {
        if little {
            out.extend_from_slice(&value.to_le_bytes());
        } else {
            out.extend_from_slice(&value.to_be_bytes());
        }
    }
}

fn write_err(e: std::io::Error) -> SlbtError {
    SlbtError::system("archive::writer::build_archive", e)
}

/// Commit `image` to `path` atomically: write to a sibling temp file in the
/// destination directory, then rename over the final path.
pub fn commit_archive(path: &Path, image: &[u8]) -> Result<(), SlbtError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| SlbtError::system("archive::writer::commit_archive", e))?;
    tmp.write_all(image)
        .map_err(|e| SlbtError::system("archive::writer::commit_archive", e))?;
    tmp.persist(path)
        .map_err(|e| SlbtError::system("archive::writer::commit_archive", e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_gnu_archive_with_short_names() {
        let members = vec![BuildMember {
            name: "foo.o".into(),
            data: b"hello".to_vec(),
            mtime: 0,
            uid: 0,
            gid: 0,
            mode: 0o644,
        }];
        let symbols = vec![BuildSymbol {
            name: "foo_sym".into(),
            member_index: 0,
        }];
        let image = build_archive(ArchiveKind::Gnu, &members, &symbols).unwrap();
        assert!(image.starts_with(crate::archive::kind::ARCHIVE_SIGNATURE));

        let meta = crate::archive::meta::parse_archive(&image).unwrap();
        assert!(meta.armap.is_some());
        let public: Vec<_> = meta.public_members().collect();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].name, "foo.o");
        assert_eq!(meta.member_data(public[0]), b"hello");
    }

    #[test]
    fn builds_bsd_archive_round_trips() {
        let members = vec![BuildMember {
            name: "this_is_a_very_long_object_name.o".into(),
            data: b"abcdef".to_vec(),
            mtime: 0,
            uid: 0,
            gid: 0,
            mode: 0o644,
        }];
        let symbols = vec![BuildSymbol {
            name: "bar_sym".into(),
            member_index: 0,
        }];
        let image = build_archive(ArchiveKind::Bsd, &members, &symbols).unwrap();
        let meta = crate::archive::meta::parse_archive(&image).unwrap();
        let public: Vec<_> = meta.public_members().collect();
        assert_eq!(public[0].name, "this_is_a_very_long_object_name.o");
        assert_eq!(meta.member_data(public[0]), b"abcdef");
    }
}
