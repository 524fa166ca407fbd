//! Reading shader sources. The text is handed to the compiler verbatim.

use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::errors::*;

/// A seekable source of bytes.
pub trait InputStream {
    /// The total number of bytes in the stream.
    fn size(&mut self) -> io::Result<u64>;
    /// Moves the read position to `offset` bytes from the beginning.
    fn seek_to(&mut self, offset: u64) -> io::Result<u64>;
    /// Reads at most `buf.len()` bytes, returning how many were read.
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: Read + Seek> InputStream for T {
    fn size(&mut self) -> io::Result<u64> {
        let position = self.seek(SeekFrom::Current(0))?;
        let size = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(position))?;
        Ok(size)
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<u64> {
        self.seek(SeekFrom::Start(offset))
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }
}

/// Reads the whole content of `stream`, from its very beginning.
pub fn read_stream(stream: &mut dyn InputStream) -> Result<String> {
    let size = stream.size()? as usize;
    let mut buf = vec![0u8; size];

    if size > 0 {
        stream.seek_to(0)?;

        let mut read = 0;
        while read < size {
            match stream.read_bytes(&mut buf[read..])? {
                0 => break,
                n => read += n,
            }
        }

        if read != size {
            return Err(Error::Source(
                "stream".into(),
                format!("expected {} bytes, got {}", size, read),
            ));
        }
    }

    String::from_utf8(buf).map_err(|err| Error::Source("stream".into(), format!("{}", err)))
}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .map_err(|err| Error::Source(format!("\"{}\"", path.display()), format!("{}", err)))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn stream() {
        let mut cursor = Cursor::new(b"void main() {}".to_vec());
        cursor.seek_to(5).unwrap();
        assert_eq!(cursor.size().unwrap(), 14);
        assert_eq!(read_stream(&mut cursor).unwrap(), "void main() {}");

        let mut empty = Cursor::new(Vec::new());
        assert_eq!(read_stream(&mut empty).unwrap(), "");

        let mut invalid = Cursor::new(vec![0xff, 0xfe]);
        assert!(read_stream(&mut invalid).is_err());
    }

    #[test]
    fn missing_file() {
        match read_file("/nonexistent/shader.frag") {
            Err(Error::Source(name, _)) => assert!(name.contains("shader.frag")),
            _ => panic!(),
        }
    }
}
