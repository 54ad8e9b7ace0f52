use byteorder::{ReadBytesExt, LE};
use std::io::{self, Read, Seek, SeekFrom};

/// Extends readers with the length-prefixed reads used throughout gamedata.
///
/// Strings in the file are stored as a 4-byte little-endian length followed by
/// that many raw bytes, with no terminator.
pub trait ReadPasExt: Read {
    fn read_pas_blob(&mut self) -> io::Result<Box<[u8]>> {
        let len = self.read_u32::<LE>()? as usize;
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf.into_boxed_slice())
    }

    fn read_pas_string(&mut self) -> io::Result<String> {
        let blob = self.read_pas_blob()?;
        Ok(String::from_utf8_lossy(&blob).into_owned())
    }
}
impl<R: Read + ?Sized> ReadPasExt for R {}

/// Cursor-only helpers for stepping over data we don't keep.
pub trait SkipExt: Read + Seek {
    /// Skips a length-prefixed chunk without reading its contents.
    fn skip_blob(&mut self) -> io::Result<()> {
        let len = self.read_u32::<LE>()?;
        self.seek(SeekFrom::Current(i64::from(len)))?;
        Ok(())
    }
}
impl<R: Read + Seek + ?Sized> SkipExt for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn pas_string_reads_length_prefixed_bytes() {
        let data = b"\x05\x00\x00\x00helloTRAILER";
        let mut cur = Cursor::new(&data[..]);
        assert_eq!(cur.read_pas_string().unwrap(), "hello");
        assert_eq!(cur.position(), 9);
    }

    #[test]
    fn pas_blob_keeps_raw_bytes() {
        let data = b"\x03\x00\x00\x00\x00\xFF\x7F";
        let mut cur = Cursor::new(&data[..]);
        assert_eq!(&*cur.read_pas_blob().unwrap(), &[0x00, 0xFF, 0x7F]);
    }

    #[test]
    fn pas_string_errors_on_truncated_input() {
        let data = b"\x10\x00\x00\x00shor";
        let mut cur = Cursor::new(&data[..]);
        assert!(cur.read_pas_string().is_err());
    }

    #[test]
    fn skip_blob_advances_past_chunk() {
        let data = b"\x02\x00\x00\x00xy\xAA";
        let mut cur = Cursor::new(&data[..]);
        cur.skip_blob().unwrap();
        assert_eq!(cur.position(), 6);
    }
}
