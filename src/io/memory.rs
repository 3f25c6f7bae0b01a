use super::ReadAt;
use async_trait::async_trait;
use std::io;

/// In-memory byte source, used for archives that are already buffered.
pub struct MemoryReader {
    data: Vec<u8>,
}

impl MemoryReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.data.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
