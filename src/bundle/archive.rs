//! Stored-entry archive writer
//!
//! Produces a single self-contained binary blob readable by standard
//! unpacking tools: one stored (uncompressed) local entry per file, a
//! central directory, and one end record. All multi-byte integers are
//! little-endian. Entry names are written as raw UTF-8 bytes with no path
//! normalization; callers are responsible for supplying valid relative
//! paths.

use bytes::BufMut;
use std::collections::BTreeMap;

const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_DIR_SIG: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIR_SIG: u32 = 0x0605_4b50;

/// Version 2.0, the minimum that understands stored entries
const VERSION: u16 = 20;
/// Compression method 0: stored
const METHOD_STORED: u16 = 0;

/// Build a stored-entry archive from `path -> text content`.
///
/// Entries appear in map iteration order, so a given input always produces
/// identical bytes. An empty map yields an archive holding only the end
/// record. Each entry's CRC-32 is computed over its uncompressed bytes and
/// written to both the local header and the central-directory record.
pub fn build_archive(files: &BTreeMap<String, String>) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();
    let mut entries = 0u16;

    for (path, content) in files {
        let name = path.as_bytes();
        let data = content.as_bytes();
        let checksum = crc32(data);
        let header_offset = out.len() as u32;

        out.put_u32_le(LOCAL_HEADER_SIG);
        out.put_u16_le(VERSION);
        out.put_u16_le(0); // general-purpose flags
        out.put_u16_le(METHOD_STORED);
        out.put_u16_le(0); // modification time
        out.put_u16_le(0); // modification date
        out.put_u32_le(checksum);
        out.put_u32_le(data.len() as u32); // compressed == uncompressed, stored
        out.put_u32_le(data.len() as u32);
        out.put_u16_le(name.len() as u16);
        out.put_u16_le(0); // extra field length
        out.put_slice(name);
        out.put_slice(data);

        central.put_u32_le(CENTRAL_DIR_SIG);
        central.put_u16_le(VERSION); // version made by
        central.put_u16_le(VERSION); // version needed to extract
        central.put_u16_le(0); // general-purpose flags
        central.put_u16_le(METHOD_STORED);
        central.put_u16_le(0); // modification time
        central.put_u16_le(0); // modification date
        central.put_u32_le(checksum);
        central.put_u32_le(data.len() as u32);
        central.put_u32_le(data.len() as u32);
        central.put_u16_le(name.len() as u16);
        central.put_u16_le(0); // extra field length
        central.put_u16_le(0); // comment length
        central.put_u16_le(0); // disk number start
        central.put_u16_le(0); // internal attributes
        central.put_u32_le(0); // external attributes
        central.put_u32_le(header_offset);
        central.put_slice(name);

        entries += 1;
    }

    let central_offset = out.len() as u32;
    let central_size = central.len() as u32;
    out.extend_from_slice(&central);

    out.put_u32_le(END_OF_CENTRAL_DIR_SIG);
    out.put_u16_le(0); // this disk
    out.put_u16_le(0); // disk holding the central directory
    out.put_u16_le(entries); // entries on this disk
    out.put_u16_le(entries); // entries total
    out.put_u32_le(central_size);
    out.put_u32_le(central_offset);
    out.put_u16_le(0); // comment length

    out
}

/// CRC-32 over `data` (IEEE 802.3 reflected polynomial), table-driven
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xffff_ffffu32;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xff) as usize;
        crc = (crc >> 8) ^ CRC_TABLE[index];
    }
    !crc
}

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xedb8_8320
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}
