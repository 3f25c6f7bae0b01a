//! Minimal ZIP writer for tests.

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use super::structures::{CDFH_SIGNATURE, EOCD_SIGNATURE, LFH_SIGNATURE};

struct Record {
    name: String,
    method: u16,
    compressed_size: u32,
    uncompressed_size: u32,
    lfh_offset: u32,
}

#[derive(Default)]
pub struct ZipBuilder {
    body: Vec<u8>,
    records: Vec<Record>,
    comment: Vec<u8>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        self.raw(name, 0, data, data.len())
    }

    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        let compressed = encoder.finish().unwrap();
        self.raw(name, 8, &compressed, data.len())
    }

    pub fn directory(self, name: &str) -> Self {
        self.raw(name, 0, &[], 0)
    }

    /// Entry with an arbitrary method id and pre-encoded payload.
    pub fn raw(mut self, name: &str, method: u16, payload: &[u8], uncompressed: usize) -> Self {
        let lfh_offset = self.body.len() as u32;
        let body = &mut self.body;
        body.extend_from_slice(LFH_SIGNATURE);
        body.write_u16::<LittleEndian>(20).unwrap();
        body.write_u16::<LittleEndian>(0).unwrap();
        body.write_u16::<LittleEndian>(method).unwrap();
        body.write_u32::<LittleEndian>(0).unwrap(); // time + date
        body.write_u32::<LittleEndian>(0).unwrap(); // crc32, never checked
        body.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        body.write_u32::<LittleEndian>(uncompressed as u32).unwrap();
        body.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        body.write_u16::<LittleEndian>(0).unwrap();
        body.extend_from_slice(name.as_bytes());
        body.extend_from_slice(payload);

        self.records.push(Record {
            name: name.to_string(),
            method,
            compressed_size: payload.len() as u32,
            uncompressed_size: uncompressed as u32,
            lfh_offset,
        });
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = self.body;
        let cd_offset = out.len() as u32;

        for r in &self.records {
            out.extend_from_slice(CDFH_SIGNATURE);
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(r.method).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(r.compressed_size).unwrap();
            out.write_u32::<LittleEndian>(r.uncompressed_size).unwrap();
            out.write_u16::<LittleEndian>(r.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(r.lfh_offset).unwrap();
            out.extend_from_slice(r.name.as_bytes());
        }

        let cd_size = out.len() as u32 - cd_offset;
        let count = self.records.len() as u16;
        out.extend_from_slice(EOCD_SIGNATURE);
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u32::<LittleEndian>(cd_size).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.extend_from_slice(&self.comment);
        out
    }
}
