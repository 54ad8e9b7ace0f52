use crate::Error;
use byteorder::{ReadBytesExt, LE};
use flate2::bufread::ZlibDecoder;
use std::io::{self, Read};

/// Initial capacity of the reusable inflate buffer.
const BUF_START: usize = 64 * 1024;

/// Hard cap on any single declared compressed or inflated length. Malformed
/// length fields past this abort the load instead of allocating.
pub const MAX_BLOCK_LEN: usize = 1 << 30;

/// Inflates the length-prefixed zlib blocks that every gamedata section is
/// stored as, reusing one growable output buffer across calls.
///
/// The slice returned by [`inflate`](Self::inflate) aliases that buffer and is
/// only valid until the next call; callers that keep decoded bytes must copy
/// them out first.
pub struct BlockReader {
    buf: Vec<u8>,
}

impl BlockReader {
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(BUF_START) }
    }

    pub fn inflate<'a, B>(&'a mut self, src: &mut io::Cursor<B>) -> Result<&'a [u8], Error>
    where
        B: AsRef<[u8]>,
    {
        let len = src.read_u32::<LE>()? as usize;
        if len > MAX_BLOCK_LEN {
            return Err(Error::OversizedBlock(len));
        }
        let pos = src.position() as usize;
        let data = src.get_ref().as_ref().get(pos..pos + len).ok_or(Error::MalformedData("compressed block extends past end of file"))?;

        self.buf.clear();
        let mut decoder = ZlibDecoder::new(data).take((MAX_BLOCK_LEN + 1) as u64);
        match decoder.read_to_end(&mut self.buf) {
            Ok(n) if n > MAX_BLOCK_LEN => return Err(Error::OversizedBlock(n)),
            Ok(_) => (),
            Err(err) => return Err(Error::Inflate(err.to_string())),
        }

        src.set_position((pos + len) as u64);
        Ok(&self.buf)
    }
}
