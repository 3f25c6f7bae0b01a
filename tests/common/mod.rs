//! Shared helpers for integration tests.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};

/// Build a ZIP archive of STORED entries.
///
/// A deliberate, smaller copy of the crate's `#[cfg(test)]` ZIP writer,
/// which is not compiled into the library that integration tests link
/// against.
pub fn stored_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for (name, data) in entries {
        let offset = out.len() as u32;
        let size = data.len() as u32;

        out.extend_from_slice(b"PK\x03\x04");
        out.write_u16::<LittleEndian>(20).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(size).unwrap();
        out.write_u32::<LittleEndian>(size).unwrap();
        out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(data);

        central.extend_from_slice(b"PK\x01\x02");
        central.write_u16::<LittleEndian>(20).unwrap();
        central.write_u16::<LittleEndian>(20).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u32::<LittleEndian>(0).unwrap();
        central.write_u32::<LittleEndian>(0).unwrap();
        central.write_u32::<LittleEndian>(size).unwrap();
        central.write_u32::<LittleEndian>(size).unwrap();
        central.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u32::<LittleEndian>(0).unwrap();
        central.write_u32::<LittleEndian>(offset).unwrap();
        central.extend_from_slice(name.as_bytes());
    }

    let cd_offset = out.len() as u32;
    let cd_size = central.len() as u32;
    out.extend_from_slice(&central);

    out.extend_from_slice(b"PK\x05\x06");
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    out.write_u32::<LittleEndian>(cd_size).unwrap();
    out.write_u32::<LittleEndian>(cd_offset).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out
}
