//! Random-access byte sources for archive parsing.
//!
//! The ZIP layer never streams an archive front to back. It jumps to the
//! end-of-central-directory record, then to the central directory, then to
//! individual entries, so every source only has to answer "give me these
//! bytes at this offset".

mod local;
mod memory;

pub use local::LocalFileReader;
pub use memory::MemoryReader;

use async_trait::async_trait;
use std::io;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer.
    ///
    /// May return fewer bytes than requested.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Fill `buf` completely from `offset`, failing with `UnexpectedEof`
    /// when the source ends first.
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "short read at offset {}: wanted {} bytes, got {}",
                        offset,
                        buf.len(),
                        filled
                    ),
                ));
            }
            filled += n;
        }
        Ok(())
    }
}
