use crate::Error;
use byteorder::{ReadBytesExt, LE};
use std::io::{self, Read, Seek, SeekFrom};

pub const MAGIC_OFFSET: u64 = 2_000_000;
pub const MAGIC: u32 = 1_234_321;

/// Reverses the substitution cipher over the asset paragraphs. This layer is
/// present in every supported version, underneath the 8.1 stream cipher.
///
/// The swap table sits between two random-length garbage tables. Decryption
/// must run its two passes in this exact order: the encoder applied the
/// additive scramble first and the byte swaps second.
///
/// On success the cursor points at the first decrypted byte.
pub fn decrypt(exe: &mut io::Cursor<&mut [u8]>) -> Result<(), Error> {
    let garbage1_len = i64::from(exe.read_u32::<LE>()?) * 4;
    let garbage2_len = i64::from(exe.read_u32::<LE>()?) * 4;

    exe.seek(SeekFrom::Current(garbage1_len))?;
    let mut swap_table = [0u8; 256];
    exe.read_exact(&mut swap_table)?;
    exe.seek(SeekFrom::Current(garbage2_len))?;

    let mut reverse_table = [0u8; 256];
    for (i, &b) in swap_table.iter().enumerate() {
        reverse_table[b as usize] = i as u8;
    }

    let len = exe.read_u32::<LE>()? as usize;
    let start = exe.position() as usize;
    let data: &mut [u8] = exe.get_mut();
    let region = data
        .get_mut(start..start + len)
        .ok_or(Error::MalformedData("encrypted paragraph region extends past end of file"))?;

    // First pass: undo the additive scramble, walking backward so each byte
    // is decoded against its still-encoded predecessor.
    for i in (1..region.len()).rev() {
        region[i] = reverse_table[region[i] as usize].wrapping_sub(region[i - 1].wrapping_add(i as u8));
    }

    // Second pass: undo the positional byte swaps, clamped to region start.
    for i in (1..region.len()).rev() {
        let j = i.saturating_sub(swap_table[i & 0xFF] as usize);
        region.swap(i, j);
    }

    exe.set_position(start as u64);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference encoder matching what the cipher reverses: positional swaps
    /// first (inverse pass order), then the additive scramble.
    fn encrypt_region(region: &mut [u8], swap_table: &[u8; 256]) {
        for i in 1..region.len() {
            let j = i.saturating_sub(swap_table[i & 0xFF] as usize);
            region.swap(i, j);
        }
        for i in 1..region.len() {
            let value = region[i].wrapping_add(region[i - 1]).wrapping_add(i as u8);
            region[i] = swap_table[value as usize];
        }
    }

    fn build_stream(plaintext: &[u8], swap_table: &[u8; 256], garbage1: u32, garbage2: u32) -> Vec<u8> {
        let mut region = plaintext.to_vec();
        encrypt_region(&mut region, swap_table);

        let mut out = Vec::new();
        out.extend_from_slice(&garbage1.to_le_bytes());
        out.extend_from_slice(&garbage2.to_le_bytes());
        out.extend(std::iter::repeat(0xAB).take(garbage1 as usize * 4));
        out.extend_from_slice(swap_table);
        out.extend(std::iter::repeat(0xCD).take(garbage2 as usize * 4));
        out.extend_from_slice(&(region.len() as u32).to_le_bytes());
        out.extend_from_slice(&region);
        out
    }

    fn test_swap_table() -> [u8; 256] {
        // Any permutation works; derive one from a fixed odd multiplier.
        let mut table = [0u8; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = (i as u8).wrapping_mul(167).wrapping_add(31);
        }
        table
    }

    #[test]
    fn decode_inverts_the_reference_encoder() {
        let plaintext: Vec<u8> = (0..600u32).map(|i| (i * 7 + 13) as u8).collect();
        let table = test_swap_table();
        let mut stream = build_stream(&plaintext, &table, 3, 5);

        let mut cur = io::Cursor::new(&mut stream[..]);
        decrypt(&mut cur).unwrap();
        let start = cur.position() as usize;
        assert_eq!(&cur.get_ref()[start..start + plaintext.len()], &plaintext[..]);
    }

    #[test]
    fn empty_region_is_fine() {
        let table = test_swap_table();
        let mut stream = build_stream(&[], &table, 0, 0);
        let mut cur = io::Cursor::new(&mut stream[..]);
        decrypt(&mut cur).unwrap();
    }

    #[test]
    fn truncated_region_is_malformed() {
        let table = test_swap_table();
        let mut stream = build_stream(&[1, 2, 3, 4], &table, 0, 0);
        stream.truncate(stream.len() - 2);
        let mut cur = io::Cursor::new(&mut stream[..]);
        assert!(matches!(decrypt(&mut cur), Err(Error::MalformedData(_))));
    }
}
