use super::ReadAt;
use async_trait::async_trait;
use std::io;
use std::path::Path;

/// Local file reader with random access support.
///
/// Uses positional reads, so one handle can serve concurrent requests
/// without a shared cursor.
pub struct LocalFileReader {
    file: std::fs::File,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.read_at(buf, offset)
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            self.file.seek_read(buf, offset)
        }

        #[cfg(not(any(unix, windows)))]
        {
            let _ = buf;
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "positional reads are not available on this platform",
            ))
        }
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_at_offsets() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();

        let reader = LocalFileReader::new(file.path()).unwrap();
        assert_eq!(reader.size(), 10);

        let mut buf = [0u8; 4];
        reader.read_exact_at(3, &mut buf).await.unwrap();
        assert_eq!(&buf, b"3456");
    }

    #[tokio::test]
    async fn read_exact_past_end_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();

        let reader = LocalFileReader::new(file.path()).unwrap();
        let mut buf = [0u8; 8];
        let err = reader.read_exact_at(1, &mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
