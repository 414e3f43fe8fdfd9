//! Archive meta parser: two passes over a mapped archive
//! producing a header vector, name-string table, and typed member list.

use crate::archive::fields::{read_decimal, read_octal};
use crate::archive::kind::{ArchiveKind, MemberAttribute, ObjectFormat, ARCHIVE_SIGNATURE, HEADER_SIZE};
use crate::archive::sniff::sniff;
use crate::driver::error::{ErrorKind, SlbtError};

const ID_RANGE: std::ops::Range<usize> = 0..16;
const MTIME_RANGE: std::ops::Range<usize> = 16..28;
const UID_RANGE: std::ops::Range<usize> = 28..34;
const GID_RANGE: std::ops::Range<usize> = 34..40;
const MODE_RANGE: std::ops::Range<usize> = 40..48;
const SIZE_RANGE: std::ops::Range<usize> = 48..58;
const TERMINATOR: &[u8; 2] = b"`\n";

/// One normalized member, decoded from its raw 60-byte header plus any
/// inline BSD long-name prefix.
#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub name: String,
    pub mtime: u64,
    pub uid: u64,
    pub gid: u64,
    pub mode: u64,
    /// Offset of the member's raw header within the archive.
    pub header_offset: usize,
    /// Offset of the member's data (after any BSD inline long-name
    /// prefix has been subtracted out).
    pub data_offset: usize,
    pub data_len: usize,
    pub attribute: MemberAttribute,
}

/// Owns the raw archive bytes and everything derived from them.
pub struct ArchiveMeta<'a> {
    pub raw: &'a [u8],
    pub kind: ArchiveKind,
    pub members: Vec<MemberInfo>,
    /// Long-name strings buffer: one null-terminated name per member that
    /// needed one, in member order. Short names are stored directly on
    /// `MemberInfo::name` and do not appear here.
    pub long_names: Vec<u8>,
    pub armap: Option<crate::archive::armap::Armap>,
    pub linkinfo_index: Option<usize>,
}

struct RawHeader<'a> {
    offset: usize,
    bytes: &'a [u8; HEADER_SIZE],
}

fn header_id(bytes: &[u8; HEADER_SIZE]) -> &[u8] {
    let field = &bytes[ID_RANGE];
    let mut end = field.len();
    while end > 0 && field[end - 1] == b' ' {
        end -= 1;
    }
    &field[..end]
}

fn is_sysv_long_ref(id: &[u8]) -> Option<u64> {
    if id.first() == Some(&b'/') && id.len() > 1 && id[1..].iter().all(|b| b.is_ascii_digit()) {
        std::str::from_utf8(&id[1..]).ok()?.parse().ok()
    } else {
        None
    }
}

fn classify_attribute(id: &[u8], index: usize, prev_attr: Option<MemberAttribute>) -> MemberAttribute {
    if id == b"//" {
        return MemberAttribute::NameStrs;
    }
    if id == b"/SYM64/" || id == b"/" {
        return MemberAttribute::Armap;
    }
    if matches!(
        id,
        b"__.SYMDEF" | b"__.SYMDEF SORTED" | b"__.SYMDEF_64" | b"__.SYMDEF_64 SORTED"
    ) {
        return MemberAttribute::Armap;
    }

    if index == 1 {
        if let Some(MemberAttribute::Armap) = prev_attr {
            // Reclassification happens one level up, where we know both
            // headers' variant (SysV vs BSD); see `reclassify_linkinfo`.
        }
    }

    MemberAttribute::Default
}

/// Walk a mapped archive and produce a validated [`ArchiveMeta`].
pub fn parse_archive(raw: &[u8]) -> Result<ArchiveMeta<'_>, SlbtError> {
    if raw.is_empty() {
        return Err(SlbtError::custom(
            "archive::meta::parse_archive",
            ErrorKind::ArEmptyFile,
        ));
    }
    if raw.len() < ARCHIVE_SIGNATURE.len() || &raw[..ARCHIVE_SIGNATURE.len()] != ARCHIVE_SIGNATURE {
        return Err(SlbtError::custom(
            "archive::meta::parse_archive",
            ErrorKind::ArInvalidSignature,
        ));
    }

    // Pass 1: walk headers, collecting transient (offset, id-is-sysv-header)
    // pairs and tallying the long-name string table size.
    let mut pos = ARCHIVE_SIGNATURE.len();
    let mut raw_headers: Vec<RawHeader<'_>> = Vec::with_capacity(512);
    let mut saw_namestrs = false;
    let mut namestrs_table_size: u64 = 0;

    while pos < raw.len() {
        if pos + HEADER_SIZE > raw.len() {
            if raw[pos..].iter().all(|&b| b == 0) {
                break;
            }
            return Err(SlbtError::custom(
                "archive::meta::parse_archive",
                ErrorKind::ArTruncatedData,
            ));
        }
        let header_bytes: &[u8; HEADER_SIZE] = raw[pos..pos + HEADER_SIZE]
            .try_into()
            .expect("slice has exact header size");
        if &header_bytes[58..60] != TERMINATOR {
            return Err(SlbtError::custom(
                "archive::meta::parse_archive",
                ErrorKind::ArInvalidHeader,
            ));
        }

        let id = header_id(header_bytes);
        let size = read_decimal(&header_bytes[SIZE_RANGE])? as usize;

        let data_start = pos + HEADER_SIZE;
        if data_start + size > raw.len() {
            return Err(SlbtError::custom(
                "archive::meta::parse_archive",
                ErrorKind::ArTruncatedData,
            ));
        }

        if id == b"//" {
            if saw_namestrs {
                return Err(SlbtError::custom(
                    "archive::meta::parse_archive",
                    ErrorKind::ArDuplicateLongNames,
                ));
            }
            saw_namestrs = true;
        } else if is_sysv_long_ref(id).is_some() {
            namestrs_table_size += 1; // null terminator budget; the name
                                      // itself is copied by reference below.
        }
        let _ = &mut namestrs_table_size;

        raw_headers.push(RawHeader {
            offset: pos,
            bytes: header_bytes,
        });

        let padded_size = size + (size % 2);
        pos = data_start + padded_size;
    }

    // Locate the long-names member (if any) up front so pass 2 can resolve
    // SysV long-name references against it.
    let namestrs_block: Option<(usize, usize)> = raw_headers.iter().find_map(|h| {
        if header_id(h.bytes) == b"//" {
            let size = read_decimal(&h.bytes[SIZE_RANGE]).ok()? as usize;
            Some((h.offset + HEADER_SIZE, size))
        } else {
            None
        }
    });

    // Pass 2: decode each header into a normalized `MemberInfo`.
    let mut members = Vec::with_capacity(raw_headers.len());
    let mut long_names = Vec::new();
    let mut prev_attr: Option<MemberAttribute> = None;
    let mut prev_is_sysv = false;

    for (index, raw_header) in raw_headers.iter().enumerate() {
        let bytes = raw_header.bytes;
        let id = header_id(bytes);
        let mtime = read_decimal(&bytes[MTIME_RANGE])?;
        let uid = read_decimal(&bytes[UID_RANGE])?;
        let gid = read_decimal(&bytes[GID_RANGE])?;
        let mode = read_octal(&bytes[MODE_RANGE])?;
        let mut size = read_decimal(&bytes[SIZE_RANGE])? as usize;

        let mut data_offset = raw_header.offset + HEADER_SIZE;
        let is_sysv_header = id.first() == Some(&b'/') || id == b"//";

        let name = if id == b"//" {
            "//".to_string()
        } else if let Some(off) = is_sysv_long_ref(id) {
            let (block_start, block_len) = namestrs_block.ok_or_else(|| {
                SlbtError::custom("archive::meta::parse_archive", ErrorKind::ArInvalidHeader)
            })?;
            let off = off as usize;
            if off >= block_len {
                return Err(SlbtError::custom(
                    "archive::meta::parse_archive",
                    ErrorKind::ArInvalidHeader,
                ));
            }
            let block = &raw[block_start..block_start + block_len];
            let rest = &block[off..];
            let end = rest
                .iter()
                .position(|&b| b == b'/' || b == b'\n')
                .unwrap_or(rest.len());
            String::from_utf8_lossy(&rest[..end]).into_owned()
        } else if let Some(stripped) = id.strip_prefix(b"#1/") {
            let name_len: usize = std::str::from_utf8(stripped)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| {
                    SlbtError::custom("archive::meta::parse_archive", ErrorKind::ArInvalidHeader)
                })?;
            if name_len > size {
                return Err(SlbtError::custom(
                    "archive::meta::parse_archive",
                    ErrorKind::ArInvalidHeader,
                ));
            }
            let name_bytes = &raw[data_offset..data_offset + name_len];
            let trimmed_end = name_bytes
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(name_bytes.len());
            data_offset += name_len;
            size -= name_len;
            String::from_utf8_lossy(&name_bytes[..trimmed_end]).into_owned()
        } else {
            String::from_utf8_lossy(id).into_owned()
        };

        if !name.is_empty() && name != "//" {
            long_names.extend_from_slice(name.as_bytes());
            long_names.push(0);
        }

        let data = &raw[data_offset..data_offset + size];

        let mut attribute = classify_attribute(id, index, prev_attr);
        if matches!(attribute, MemberAttribute::Default) {
            if id == b"//" {
                attribute = MemberAttribute::NameStrs;
            } else if data.len() >= 8 && &data[..8] == ARCHIVE_SIGNATURE.as_slice() {
                attribute = MemberAttribute::Archive;
            } else {
                attribute = match sniff(data) {
                    ObjectFormat::Ascii => MemberAttribute::Ascii,
                    ObjectFormat::Default => MemberAttribute::Default,
                    other => MemberAttribute::Object(other),
                };
            }
        }

        if matches!(attribute, MemberAttribute::Armap) && index != 0 {
            return if matches!(prev_attr, Some(MemberAttribute::Armap)) {
                Err(SlbtError::custom(
                    "archive::meta::parse_archive",
                    ErrorKind::ArDuplicateArmapMember,
                ))
            } else {
                Err(SlbtError::custom(
                    "archive::meta::parse_archive",
                    ErrorKind::ArMisplacedArmapMember,
                ))
            };
        }

        // PE/COFF second linker member: member 1 is reclassified from
        // Armap to LinkInfo iff member 0 is Armap and both carry SysV
        // headers.
        if index == 1
            && matches!(attribute, MemberAttribute::Armap)
            && matches!(prev_attr, Some(MemberAttribute::Armap))
        {
            if prev_is_sysv && is_sysv_header {
                attribute = MemberAttribute::LinkInfo;
            } else {
                return Err(SlbtError::custom(
                    "archive::meta::parse_archive",
                    ErrorKind::ArArmapMismatch,
                ));
            }
        }

        members.push(MemberInfo {
            name,
            mtime,
            uid,
            gid,
            mode,
            header_offset: raw_header.offset,
            data_offset,
            data_len: size,
            attribute,
        });

        prev_attr = Some(attribute);
        prev_is_sysv = is_sysv_header;
    }

    let armap = if members
        .first()
        .map(|m| matches!(m.attribute, MemberAttribute::Armap))
        .unwrap_or(false)
    {
        Some(crate::archive::armap::parse_armap(raw, &members)?)
    } else {
        None
    };

    let linkinfo_index = members
        .iter()
        .position(|m| matches!(m.attribute, MemberAttribute::LinkInfo));

    let kind = infer_kind(&members, armap.as_ref());

    Ok(ArchiveMeta {
        raw,
        kind,
        members,
        long_names,
        armap,
        linkinfo_index,
    })
}

fn infer_kind(
    members: &[MemberInfo],
    armap: Option<&crate::archive::armap::Armap>,
) -> ArchiveKind {
    use crate::archive::armap::ArmapVariant;
    let has_linkinfo = members
        .iter()
        .any(|m| matches!(m.attribute, MemberAttribute::LinkInfo));
    if has_linkinfo {
        return ArchiveKind::Coff;
    }
    match armap {
        Some(a) => match (a.variant, a.width) {
            (ArmapVariant::SysV, 32) => ArchiveKind::Gnu,
            (ArmapVariant::SysV, _) => ArchiveKind::Gnu64,
            (ArmapVariant::Bsd, 32) => ArchiveKind::Bsd,
            (ArmapVariant::Bsd, _) => ArchiveKind::Bsd64,
        },
        None => ArchiveKind::Gnu,
    }
}

/// Access a member's object data.
impl<'a> ArchiveMeta<'a> {
    pub fn member_data(&self, member: &MemberInfo) -> &'a [u8] {
        &self.raw[member.data_offset..member.data_offset + member.data_len]
    }

    /// Members that are neither armap, linkinfo, nor namestrs: the
    /// "public" members a merge or listing operates on.
    pub fn public_members(&self) -> impl Iterator<Item = &MemberInfo> {
        self.members.iter().filter(|m| {
            !matches!(
                m.attribute,
                MemberAttribute::Armap | MemberAttribute::LinkInfo | MemberAttribute::NameStrs
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_simple_archive(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(ARCHIVE_SIGNATURE);
        for (name, data) in members {
            let id = format!("{name}/");
            out.extend_from_slice(format!("{id:<16}").as_bytes());
            out.extend_from_slice(format!("{:<12}", 0).as_bytes());
            out.extend_from_slice(format!("{:<6}", 0).as_bytes());
            out.extend_from_slice(format!("{:<6}", 0).as_bytes());
            out.extend_from_slice(format!("{:<8}", "0").as_bytes());
            out.extend_from_slice(format!("{:<10}", data.len()).as_bytes());
            out.extend_from_slice(TERMINATOR);
            out.extend_from_slice(data);
            if data.len() % 2 != 0 {
                out.push(b'\n');
            }
        }
        out
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse_archive(&[]).is_err());
    }

    #[test]
    fn rejects_bad_signature() {
        assert!(parse_archive(b"not an archive.\n").is_err());
    }

    #[test]
    fn parses_short_sysv_names() {
        let raw = build_simple_archive(&[("foo.o", b"hello!"), ("bar.o", b"world!!")]);
        let meta = parse_archive(&raw).unwrap();
        assert_eq!(meta.members.len(), 2);
        assert_eq!(meta.members[0].name, "foo.o");
        assert_eq!(meta.members[1].name, "bar.o");
        assert_eq!(meta.member_data(&meta.members[0]), b"hello!");
    }

    #[test]
    fn rejects_truncated_member() {
        let mut raw = build_simple_archive(&[("foo.o", b"hello!")]);
        raw.truncate(raw.len() - 2);
        assert!(parse_archive(&raw).is_err());
    }

    #[test]
    fn tolerates_zero_padding_shorter_than_a_header() {
        let mut raw = build_simple_archive(&[("foo.o", b"hello!")]);
        raw.extend_from_slice(&[0u8; 40]);
        let meta = parse_archive(&raw).unwrap();
        assert_eq!(meta.members.len(), 1);
        assert_eq!(meta.members[0].name, "foo.o");
    }

    #[test]
    fn rejects_non_zero_padding_shorter_than_a_header() {
        let mut raw = build_simple_archive(&[("foo.o", b"hello!")]);
        raw.extend_from_slice(&[0u8; 39]);
        raw.push(1);
        assert!(parse_archive(&raw).is_err());
    }
}
