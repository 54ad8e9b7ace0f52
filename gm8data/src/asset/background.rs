use crate::{
    asset::read_swapped_pixels,
    image::{ImageId, ImageSink},
    stream::ReadPasExt,
    Error,
};
use byteorder::{ReadBytesExt, LE};
use std::io::{self, Seek, SeekFrom};

#[derive(Debug)]
pub struct Background {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Absent when either dimension is zero; the name and size are still
    /// recorded.
    pub image: Option<ImageId>,
}

impl Background {
    pub(crate) fn read(data: &mut io::Cursor<&[u8]>, images: &mut dyn ImageSink) -> Result<Self, Error> {
        let name = data.read_pas_string()?;
        data.seek(SeekFrom::Current(8))?; // two data versions
        let width = data.read_u32::<LE>()?;
        let height = data.read_u32::<LE>()?;

        let image = if width > 0 && height > 0 {
            let len = data.read_u32::<LE>()? as usize;
            if len as u64 != u64::from(width) * u64::from(height) * 4 {
                return Err(Error::MalformedData("background pixel data length mismatch"))
            }
            let pixels = read_swapped_pixels(data, len)?;
            Some(images.make_image(width, height, 0, 0, pixels))
        } else {
            None
        };

        Ok(Background { name, width, height, image })
    }
}
