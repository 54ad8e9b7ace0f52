use crate::{
    asset::checked_count,
    image::{ImageId, ImageSink},
    stream::ReadPasExt,
    Error, GameVersion,
};
use byteorder::{ReadBytesExt, LE};
use std::io::{self, Seek, SeekFrom};

/// Glyph metrics for codepoints 0-255: x, y, width, height, cursor offset,
/// kerning, in that order, per codepoint.
pub const GLYPH_MAP_ENTRIES: usize = 0x600;

pub struct Font {
    pub name: String,
    pub sys_name: String,
    pub size: u32,
    pub bold: bool,
    pub italic: bool,
    pub range_begin: u32,
    pub range_end: u32,
    pub charset: u32,
    pub aa_level: u32,
    pub glyph_map: Box<[u32; GLYPH_MAP_ENTRIES]>,
    /// The rendered glyph atlas, expanded from the file's 8-bit alpha map.
    pub image: ImageId,
}

impl Font {
    pub(crate) fn read(
        data: &mut io::Cursor<&[u8]>,
        version: GameVersion,
        images: &mut dyn ImageSink,
    ) -> Result<Self, Error> {
        let name = data.read_pas_string()?;
        data.seek(SeekFrom::Current(4))?; // data version
        let sys_name = data.read_pas_string()?;
        let size = data.read_u32::<LE>()?;
        let bold = data.read_u32::<LE>()? != 0;
        let italic = data.read_u32::<LE>()? != 0;
        let mut range_begin = data.read_u32::<LE>()?;
        let range_end = data.read_u32::<LE>()?;

        // 8.1 packs charset and anti-aliasing level into range_begin's high
        // bytes.
        let (charset, aa_level) = match version {
            GameVersion::GameMaker8_0 => (0, 0),
            GameVersion::GameMaker8_1 => {
                let packed = range_begin;
                range_begin &= 0x0000_FFFF;
                (packed & 0xFF00_0000, packed & 0x00FF_0000)
            },
        };

        let mut glyph_map = Box::new([0u32; GLYPH_MAP_ENTRIES]);
        for entry in glyph_map.iter_mut() {
            *entry = data.read_u32::<LE>()?;
        }

        let width = data.read_u32::<LE>()?;
        let height = data.read_u32::<LE>()?;
        let len = data.read_u32::<LE>()?;
        if u64::from(len) != u64::from(width) * u64::from(height) {
            return Err(Error::MalformedData("font alpha map length mismatch"))
        }
        let len = checked_count(data, len, 1, "font alpha map length out of bounds")?;

        // The file stores one alpha byte per pixel; the texture is white with
        // that alpha.
        let pos = data.position() as usize;
        let alpha = data
            .get_ref()
            .get(pos..pos + len)
            .ok_or(Error::MalformedData("font alpha map extends past end of chunk"))?;
        let mut pixels = vec![0xFF; len * 4];
        for (px, &a) in pixels.chunks_exact_mut(4).zip(alpha.iter()) {
            px[3] = a;
        }
        data.set_position((pos + len) as u64);

        let image = images.make_image(width, height, 0, 0, pixels);

        Ok(Font { name, sys_name, size, bold, italic, range_begin, range_end, charset, aa_level, glyph_map, image })
    }
}
