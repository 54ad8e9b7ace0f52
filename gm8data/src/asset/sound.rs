use crate::{stream::ReadPasExt, Error};
use byteorder::{ReadBytesExt, LE};
use std::io::{self, Seek, SeekFrom};

#[derive(Debug)]
pub struct Sound {
    pub name: String,
    /// 0 = normal, 1 = background, 2 = 3d, 3 = multimedia player.
    pub kind: u32,
    pub file_type: String,
    pub file_name: String,
    pub data: Option<Box<[u8]>>,
    pub volume: f64,
    pub pan: f64,
    pub preload: bool,
}

impl Sound {
    pub(crate) fn read(data: &mut io::Cursor<&[u8]>) -> Result<Self, Error> {
        let name = data.read_pas_string()?;
        data.seek(SeekFrom::Current(4))?; // data version
        let kind = data.read_u32::<LE>()?;
        let file_type = data.read_pas_string()?;
        let file_name = data.read_pas_string()?;
        let file_data = if data.read_u32::<LE>()? != 0 { Some(data.read_pas_blob()?) } else { None };
        data.seek(SeekFrom::Current(4))?; // effects bitfield, unused
        let volume = data.read_f64::<LE>()?;
        let pan = data.read_f64::<LE>()?;
        let preload = data.read_u32::<LE>()? != 0;
        Ok(Sound { name, kind, file_type, file_name, data: file_data, volume, pan, preload })
    }
}
