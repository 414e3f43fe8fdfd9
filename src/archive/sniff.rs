//! Object sniffer: classify a member's first bytes.
//!
//! Classification is conservative — only the first matching magic
//! applies, checked in the order the table is given.

use crate::archive::kind::ObjectFormat;

pub fn sniff(data: &[u8]) -> ObjectFormat {
    if data.starts_with(&[0x7F, b'E', b'L', b'F']) {
        return ObjectFormat::Elf;
    }
    if data.starts_with(&[0x4C, 0x01]) {
        return ObjectFormat::CoffI386;
    }
    if data.starts_with(&[0x64, 0x86]) {
        return ObjectFormat::CoffX86_64;
    }
    if data.starts_with(&[0xFE, 0xED, 0xFA, 0xCE]) {
        return ObjectFormat::MachO {
            big_endian: true,
            is64: false,
        };
    }
    if data.starts_with(&[0xFE, 0xED, 0xFA, 0xCF]) {
        return ObjectFormat::MachO {
            big_endian: true,
            is64: true,
        };
    }
    if data.starts_with(&[0xCE, 0xFA, 0xED, 0xFE]) {
        return ObjectFormat::MachO {
            big_endian: false,
            is64: false,
        };
    }
    if data.starts_with(&[0xCF, 0xFA, 0xED, 0xFE]) {
        return ObjectFormat::MachO {
            big_endian: false,
            is64: true,
        };
    }
    if !data.is_empty() && data.iter().all(|&b| b < 0x80) {
        return ObjectFormat::Ascii;
    }
    ObjectFormat::Default
}
