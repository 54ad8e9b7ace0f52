pub mod gm80;
pub mod gm81;

use crate::{Error, GameVersion};
use byteorder::{ReadBytesExt, LE};
use log::debug;
use std::io::{self, Seek, SeekFrom};

/// Identifies the game version from the header fingerprints, removing any
/// version-specific encryption. The cursor is left on the settings section's
/// version header.
pub fn find(exe: &mut io::Cursor<&mut [u8]>) -> Result<GameVersion, Error> {
    // GM8.0 keeps a magic dword at a fixed offset.
    exe.set_position(gm80::MAGIC_OFFSET);
    if exe.read_u32::<LE>()? == gm80::MAGIC {
        debug!("Found GM8.0 magic value at offset {}", gm80::MAGIC_OFFSET);
        exe.seek(SeekFrom::Current(8))?;
        return Ok(GameVersion::GameMaker8_0)
    }

    // GM8.1 obscures its header pair somewhere in a window after a fixed
    // offset, and additionally encrypts everything that follows it.
    exe.set_position(gm81::SCAN_OFFSET);
    for _ in 0..gm81::SCAN_WINDOW {
        if exe.read_u32::<LE>()? & 0xFF00_FF00 == 0xF700_0000 {
            if exe.read_u32::<LE>()? & 0x00FF_00FF == 0x0014_0067 {
                debug!("Found GM8.1 magic pair at offset {}", exe.position() - 8);
                gm81::decrypt(exe)?;
                exe.seek(SeekFrom::Current(16))?;
                return Ok(GameVersion::GameMaker8_1)
            } else {
                exe.seek(SeekFrom::Current(-4))?;
            }
        }
    }

    Err(Error::UnknownFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gm80_fingerprint_is_detected() {
        let mut file = vec![0u8; 2_000_064];
        file[2_000_000..2_000_004].copy_from_slice(&gm80::MAGIC.to_le_bytes());
        let mut cur = io::Cursor::new(&mut file[..]);
        assert_eq!(find(&mut cur).unwrap(), GameVersion::GameMaker8_0);
        // Cursor lands after the magic plus the 8 skipped bytes.
        assert_eq!(cur.position(), 2_000_012);
    }

    #[test]
    fn unknown_fingerprint_is_rejected() {
        let mut file = vec![0u8; 4_000_000];
        let mut cur = io::Cursor::new(&mut file[..]);
        assert!(matches!(find(&mut cur), Err(Error::UnknownFormat)));
    }

    #[test]
    fn gm81_scan_steps_past_half_matches() {
        let mut file = vec![0u8; 4_000_000];
        // A dword that passes the first mask but whose successor fails the
        // second must not derail the scan.
        file[3_800_012..3_800_016].copy_from_slice(&0xF700_0000u32.to_le_bytes());
        let magic_at = 3_800_040;
        file[magic_at..magic_at + 4].copy_from_slice(&0xF700_0000u32.to_le_bytes());
        file[magic_at + 4..magic_at + 8].copy_from_slice(&0x0014_0067u32.to_le_bytes());
        let mut cur = io::Cursor::new(&mut file[..]);
        assert_eq!(find(&mut cur).unwrap(), GameVersion::GameMaker8_1);
    }
}
