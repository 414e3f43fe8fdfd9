//! Armap parsers: BSD-32/64 and SysV-32/64 symbol tables.
//!
//! Grounded in `slbt_armap_bsd_32.c` and `slbt_armap_sysv_{32,64}.c`: SysV
//! armaps are always big-endian with a fixed layout; BSD armaps carry no
//! endianness marker of their own, so the parser must infer it by testing
//! which interpretation of the size-of-refs field fits within the member
//! (little-endian wins a tie, since it is checked first).

use crate::archive::meta::MemberInfo;
use crate::driver::error::{ErrorKind, SlbtError};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArmapVariant {
    Bsd,
    SysV,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArmapEndian {
    Little,
    Big,
}

#[derive(Debug, Clone)]
pub struct ArmapSymbol {
    pub name: String,
    pub member_offset: u64,
}

#[derive(Debug, Clone)]
pub struct Armap {
    pub variant: ArmapVariant,
    pub width: u32,
    /// Only meaningful for BSD armaps; SysV is always big-endian.
    pub endian: ArmapEndian,
    /// Set when a BSD-32 armap's size-of-refs field fit within the member
    /// under both little- and big-endian readings, and little-endian was
    /// chosen only because it is tried first. Always `false` for SysV
    /// armaps and for BSD-64 (its size-of-refs field is wide enough that
    /// the two readings essentially never both fit).
    pub tie_break: bool,
    pub symbols: Vec<ArmapSymbol>,
}

fn be32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

fn le32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn be64(b: &[u8]) -> u64 {
    u64::from_be_bytes(b.try_into().unwrap())
}

fn le64(b: &[u8]) -> u64 {
    u64::from_le_bytes(b.try_into().unwrap())
}

/// Read a nul-terminated string starting at `offset` within `table`.
fn read_cstr(table: &[u8], offset: usize) -> Result<&str, SlbtError> {
    if offset >= table.len() {
        return Err(SlbtError::custom(
            "archive::armap::read_cstr",
            ErrorKind::ArInvalidArmapNameOffset,
        ));
    }
    let rest = &table[offset..];
    let end = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| SlbtError::custom("archive::armap::read_cstr", ErrorKind::ArInvalidArmapStringTable))?;
    std::str::from_utf8(&rest[..end])
        .map_err(|_| SlbtError::custom("archive::armap::read_cstr", ErrorKind::ArInvalidArmapStringTable))
}

/// Validate the trailing string table: nsyms nul-terminated, non-empty
/// strings filling exactly `[start, start+len)`, final byte nul.
fn validate_string_table(data: &[u8], nsyms: u64) -> Result<(), SlbtError> {
    if data.is_empty() {
        return if nsyms == 0 {
            Ok(())
        } else {
            Err(SlbtError::custom(
                "archive::armap::validate_string_table",
                ErrorKind::ArInvalidArmapStringTable,
            ))
        };
    }
    if nsyms > 0 && data[0] == 0 {
        return Err(SlbtError::custom(
            "archive::armap::validate_string_table",
            ErrorKind::ArInvalidArmapStringTable,
        ));
    }
    let mut nstrs: u64 = 0;
    for i in 1..data.len() {
        if data[i] == 0 && data[i - 1] == 0 && nstrs < nsyms {
            return Err(SlbtError::custom(
                "archive::armap::validate_string_table",
                ErrorKind::ArInvalidArmapStringTable,
            ));
        }
        if data[i] == 0 && data[i - 1] != 0 {
            nstrs += 1;
        }
    }
    if nstrs != nsyms {
        return Err(SlbtError::custom(
            "archive::armap::validate_string_table",
            ErrorKind::ArInvalidArmapStringTable,
        ));
    }
    if *data.last().unwrap() != 0 {
        return Err(SlbtError::custom(
            "archive::armap::validate_string_table",
            ErrorKind::ArInvalidArmapStringTable,
        ));
    }
    Ok(())
}

fn parse_sysv(data: &[u8], width: u32) -> Result<Armap, SlbtError> {
    let field_width = (width / 8) as usize;
    if data.len() < field_width {
        return Err(SlbtError::custom(
            "archive::armap::parse_sysv",
            ErrorKind::ArInvalidArmapNumberOfSyms,
        ));
    }
    let nsyms = if width == 32 {
        be32(&data[..4]) as u64
    } else {
        be64(&data[..8])
    };

    let refs_start = field_width;
    let refs_len = nsyms as usize * field_width;
    let strs_start = refs_start
        .checked_add(refs_len)
        .ok_or_else(|| SlbtError::custom("archive::armap::parse_sysv", ErrorKind::ArInvalidArmapNumberOfSyms))?;
    if strs_start > data.len() {
        return Err(SlbtError::custom(
            "archive::armap::parse_sysv",
            ErrorKind::ArInvalidArmapNumberOfSyms,
        ));
    }

    let strs = &data[strs_start..];
    if strs.is_empty() && nsyms != 0 {
        return Err(SlbtError::custom(
            "archive::armap::parse_sysv",
            ErrorKind::ArInvalidArmapStringTable,
        ));
    }
    validate_string_table(strs, nsyms)?;

    let mut names = Vec::with_capacity(nsyms as usize);
    let mut start = 0usize;
    for i in 0..strs.len() {
        if strs[i] == 0 {
            names.push(std::str::from_utf8(&strs[start..i])
                .map_err(|_| SlbtError::custom("archive::armap::parse_sysv", ErrorKind::ArInvalidArmapStringTable))?
                .to_string());
            start = i + 1;
        }
    }

    let mut symbols = Vec::with_capacity(nsyms as usize);
    for i in 0..nsyms as usize {
        let ref_bytes = &data[refs_start + i * field_width..refs_start + (i + 1) * field_width];
        let member_offset = if width == 32 {
            be32(ref_bytes) as u64
        } else {
            be64(ref_bytes)
        };
        symbols.push(ArmapSymbol {
            name: names.get(i).cloned().unwrap_or_default(),
            member_offset,
        });
    }

    Ok(Armap {
        variant: ArmapVariant::SysV,
        width,
        endian: ArmapEndian::Big,
        tie_break: false,
        symbols,
    })
}

fn parse_bsd(data: &[u8], width: u32) -> Result<Armap, SlbtError> {
    let field_width = (width / 8) as usize;
    if data.len() < field_width {
        return Err(SlbtError::custom(
            "archive::armap::parse_bsd",
            ErrorKind::ArInvalidArmapSizeOfRefs,
        ));
    }

    let remaining_after_field = data.len() - field_width;
    let (sizeof_refs, endian, tie_break) = if width == 32 {
        let le = le32(&data[..4]) as usize;
        let be = be32(&data[..4]) as usize;
        let le_fits = le < remaining_after_field;
        let be_fits = be < remaining_after_field;
        if le_fits {
            (le, ArmapEndian::Little, be_fits)
        } else if be_fits {
            (be, ArmapEndian::Big, false)
        } else {
            return Err(SlbtError::custom(
                "archive::armap::parse_bsd",
                ErrorKind::ArInvalidArmapSizeOfRefs,
            ));
        }
    } else {
        let le = le64(&data[..8]) as usize;
        let be = be64(&data[..8]) as usize;
        if le < remaining_after_field {
            (le, ArmapEndian::Little, false)
        } else if be < remaining_after_field {
            (be, ArmapEndian::Big, false)
        } else {
            return Err(SlbtError::custom(
                "archive::armap::parse_bsd",
                ErrorKind::ArInvalidArmapSizeOfRefs,
            ));
        }
    };

    let ref_entry_size = field_width * 2;
    if sizeof_refs % ref_entry_size != 0 {
        return Err(SlbtError::custom(
            "archive::armap::parse_bsd",
            ErrorKind::ArInvalidArmapSizeOfRefs,
        ));
    }
    let nsyms = (sizeof_refs / ref_entry_size) as u64;

    let refs_start = field_width;
    let refs_end = refs_start + sizeof_refs;
    let strlen_start = refs_end;
    let strlen_end = strlen_start + field_width;
    if strlen_end > data.len() {
        return Err(SlbtError::custom(
            "archive::armap::parse_bsd",
            ErrorKind::ArInvalidArmapSizeOfStrs,
        ));
    }

    let read_field = |b: &[u8]| -> u64 {
        match (width, endian) {
            (32, ArmapEndian::Little) => le32(b) as u64,
            (32, ArmapEndian::Big) => be32(b) as u64,
            (_, ArmapEndian::Little) => le64(b),
            (_, ArmapEndian::Big) => be64(b),
        }
    };

    let sizeof_strs = read_field(&data[strlen_start..strlen_end]) as usize;
    if sizeof_strs > data.len() - strlen_end {
        return Err(SlbtError::custom(
            "archive::armap::parse_bsd",
            ErrorKind::ArInvalidArmapSizeOfStrs,
        ));
    }

    let strs_start = strlen_end;
    let strs = &data[strs_start..strs_start + sizeof_strs];
    validate_string_table(strs, nsyms)?;

    let mut symbols = Vec::with_capacity(nsyms as usize);
    for i in 0..nsyms as usize {
        let entry = &data[refs_start + i * ref_entry_size..refs_start + (i + 1) * ref_entry_size];
        let name_offset = read_field(&entry[..field_width]) as usize;
        let member_offset = read_field(&entry[field_width..]);
        let name = read_cstr(strs, name_offset)?.to_string();
        symbols.push(ArmapSymbol {
            name,
            member_offset,
        });
    }

    Ok(Armap {
        variant: ArmapVariant::Bsd,
        width,
        endian,
        tie_break,
        symbols,
    })
}

/// Parse the armap out of `members[0]`'s data, dispatching on its member
/// name.
pub fn parse_armap(raw: &[u8], members: &[MemberInfo]) -> Result<Armap, SlbtError> {
    let member = members.first().ok_or_else(|| {
        SlbtError::custom("archive::armap::parse_armap", ErrorKind::ArMisplacedArmapMember)
    })?;
    let data = &raw[member.data_offset..member.data_offset + member.data_len];

    match member.name.as_str() {
        "/" => parse_sysv(data, 32),
        "/SYM64/" => parse_sysv(data, 64),
        "__.SYMDEF" | "__.SYMDEF SORTED" => parse_bsd(data, 32),
        "__.SYMDEF_64" | "__.SYMDEF_64 SORTED" => parse_bsd(data, 64),
        _ => Err(SlbtError::custom(
            "archive::armap::parse_armap",
            ErrorKind::ArMisplacedArmapMember,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sysv32_bytes(names: &[&str], offsets: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(names.len() as u32).to_be_bytes());
        for &off in offsets {
            out.extend_from_slice(&off.to_be_bytes());
        }
        for name in names {
            out.extend_from_slice(name.as_bytes());
            out.push(0);
        }
        out
    }

    #[test]
    fn parses_sysv_32_armap() {
        let data = sysv32_bytes(&["foo", "bar"], &[0, 64]);
        let armap = parse_sysv(&data, 32).unwrap();
        assert_eq!(armap.symbols.len(), 2);
        assert_eq!(armap.symbols[0].name, "foo");
        assert_eq!(armap.symbols[0].member_offset, 0);
        assert_eq!(armap.symbols[1].name, "bar");
        assert_eq!(armap.symbols[1].member_offset, 64);
    }

    #[test]
    fn rejects_empty_trailing_strtab_with_nonzero_syms() {
        let mut data = sysv32_bytes(&["foo"], &[0]);
        let truncate_at = 4 + 4;
        data.truncate(truncate_at);
        assert!(parse_sysv(&data, 32).is_err());
    }

    fn bsd32_bytes(entries: &[(u32, u32)], names: &[&str], little: bool) -> Vec<u8> {
        let mut strs = Vec::new();
        let mut name_offsets = Vec::new();
        for name in names {
            name_offsets.push(strs.len() as u32);
            strs.extend_from_slice(name.as_bytes());
            strs.push(0);
        }
        let sizeof_refs = (entries.len() * 8) as u32;
        let mut out = Vec::new();
        let put32 = |out: &mut Vec<u8>, v: u32| {
            if little {
                out.extend_from_slice(&v.to_le_bytes());
            } else {
                out.extend_from_slice(&v.to_be_bytes());
            }
        };
        put32(&mut out, sizeof_refs);
        for (i, &(_, member_offset)) in entries.iter().enumerate() {
            put32(&mut out, name_offsets[i]);
            put32(&mut out, member_offset);
        }
        put32(&mut out, strs.len() as u32);
        out.extend_from_slice(&strs);
        out
    }

    #[test]
    fn parses_bsd_32_little_endian() {
        let data = bsd32_bytes(&[(0, 10), (0, 20)], &["foo", "bar"], true);
        let armap = parse_bsd(&data, 32).unwrap();
        assert_eq!(armap.endian, ArmapEndian::Little);
        assert_eq!(armap.symbols[0].name, "foo");
        assert_eq!(armap.symbols[0].member_offset, 10);
        assert_eq!(armap.symbols[1].name, "bar");
        assert_eq!(armap.symbols[1].member_offset, 20);
    }

    #[test]
    fn parses_bsd_32_big_endian() {
        let data = bsd32_bytes(&[(0, 10)], &["foo"], false);
        let armap = parse_bsd(&data, 32).unwrap();
        assert_eq!(armap.endian, ArmapEndian::Big);
        assert_eq!(armap.symbols[0].name, "foo");
        assert!(!armap.tie_break);
    }

    #[test]
    fn flags_ambiguous_sizeof_refs_as_tie_break() {
        // A zero-valued size-of-refs field reads as zero under both
        // endiannesses, so both interpretations fit and little-endian wins
        // only because it is tried first.
        let data = vec![0u8; 8];
        let armap = parse_bsd(&data, 32).unwrap();
        assert_eq!(armap.endian, ArmapEndian::Little);
        assert!(armap.tie_break);
        assert!(armap.symbols.is_empty());
    }
}
