use crate::Error;
use byteorder::{ReadBytesExt, LE};
use std::io;

pub const SCAN_OFFSET: u64 = 3_800_004;
pub const SCAN_WINDOW: u32 = 1024;

const CRC_POLYNOMIAL: u32 = 0x04C1_1DB7;

fn reflect(mut value: u32, bits: u8) -> u32 {
    let mut out = 0;
    for i in 1..=bits {
        if value & 1 != 0 {
            out |= 1 << (bits - i);
        }
        value >>= 1;
    }
    out
}

/// The reflected CRC-32 table YYG derives its key stream seed from.
fn crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut value = reflect(i as u32, 8) << 24;
        for _ in 0..8 {
            value = (value << 1) ^ if value & 0x8000_0000 != 0 { CRC_POLYNOMIAL } else { 0 };
        }
        *entry = reflect(value, 32);
    }
    table
}

/// YYG's CRC-32: standard table and initial value, but no final complement.
fn crc32(data: &[u8], table: &[u32; 256]) -> u32 {
    let mut result = 0xFFFF_FFFF;
    for &b in data {
        result = (result >> 8) ^ table[((result as u8) ^ b) as usize];
    }
    result
}

fn next_mask(seed1: &mut u32, seed2: &mut u32) -> u32 {
    *seed1 = (*seed1 & 0xFFFF).wrapping_mul(0x9069).wrapping_add(*seed1 >> 16);
    *seed2 = (*seed2 & 0xFFFF).wrapping_mul(0x4650).wrapping_add(*seed2 >> 16);
    (*seed1 << 16).wrapping_add(*seed2 & 0xFFFF)
}

/// Removes the whole-stream XOR encryption layered over GM8.1 gamedata.
///
/// The cursor must sit on the two-dword seed pair; it is left directly after
/// them. The first dword seeds a hash-key string (formatted as a signed
/// decimal) whose UTF-16 CRC becomes the second generator seed. A short run
/// after the seeds is stored in the clear, and a trailing partial dword is
/// garbage the format never decrypts.
pub fn decrypt(exe: &mut io::Cursor<&mut [u8]>) -> Result<(), Error> {
    let hash_seed = exe.read_u32::<LE>()?;
    let key = format!("_MJD{}#RWK", hash_seed as i32);
    let mut wide = Vec::with_capacity(key.len() * 2);
    for b in key.bytes() {
        wide.push(b);
        wide.push(0);
    }

    let mut seed2 = crc32(&wide, &crc_table());
    let mut seed1 = exe.read_u32::<LE>()?;

    let mut pos = exe.position() as usize + (seed2 & 0xFF) as usize + 0xA;
    let data: &mut [u8] = exe.get_mut();
    while data.len() >= pos + 4 {
        let word = u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);
        let word = word ^ next_mask(&mut seed1, &mut seed2);
        data[pos..pos + 4].copy_from_slice(&word.to_le_bytes());
        pos += 4;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_matches_reference_vector() {
        // Standard reflected CRC-32 of "123456789" is 0xCBF43926; the YYG
        // variant omits the final complement.
        assert_eq!(crc32(b"123456789", &crc_table()), !0xCBF4_3926);
    }

    #[test]
    fn xor_stream_is_an_involution() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&0x1234_5678u32.to_le_bytes());
        stream.extend_from_slice(&0x9ABC_DEF0u32.to_le_bytes());
        // Large enough to cover the clear-text skip plus a decrypted payload
        // and a 3-byte tail that must be left alone.
        let payload: Vec<u8> = (0..1027u32).map(|i| (i * 31 + 7) as u8).collect();
        stream.extend_from_slice(&payload);
        let original = stream.clone();

        let mut cur = io::Cursor::new(&mut stream[..]);
        decrypt(&mut cur).unwrap();
        assert_eq!(cur.position(), 8);
        assert_ne!(stream, original);

        let mut cur = io::Cursor::new(&mut stream[..]);
        decrypt(&mut cur).unwrap();
        assert_eq!(stream, original);
    }

    #[test]
    fn bytes_before_the_skip_boundary_are_untouched() {
        let mut stream = vec![0u8; 600];
        stream[0..4].copy_from_slice(&7u32.to_le_bytes());
        for (i, b) in stream.iter_mut().enumerate().skip(8) {
            *b = i as u8;
        }
        let original = stream.clone();

        let key = format!("_MJD{}#RWK", 7);
        let mut wide = Vec::new();
        for b in key.bytes() {
            wide.push(b);
            wide.push(0);
        }
        let skip = (crc32(&wide, &crc_table()) & 0xFF) as usize + 0xA;

        let mut cur = io::Cursor::new(&mut stream[..]);
        decrypt(&mut cur).unwrap();
        assert_eq!(&stream[..8 + skip], &original[..8 + skip]);
        assert_ne!(&stream[8 + skip..], &original[8 + skip..]);
    }
}
