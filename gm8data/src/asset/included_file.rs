use crate::{stream::ReadPasExt, Error};
use byteorder::{ReadBytesExt, LE};
use std::io::{self, Seek, SeekFrom};

#[derive(Debug)]
pub struct IncludeFile {
    pub file_name: String,
    pub file_path: String,
    pub original_size: u32,
    /// Present only when the file's contents are embedded in the gamedata.
    pub data: Option<Box<[u8]>>,
    pub export_flags: u32,
    pub export_folder: String,
    pub overwrite: bool,
    pub free_memory: bool,
    pub remove_at_game_end: bool,
}

impl IncludeFile {
    pub(crate) fn read(data: &mut io::Cursor<&[u8]>) -> Result<Self, Error> {
        data.seek(SeekFrom::Current(4))?; // data version
        let file_name = data.read_pas_string()?;
        let file_path = data.read_pas_string()?;
        let mut in_exe = data.read_u32::<LE>()? != 0;
        let original_size = data.read_u32::<LE>()?;
        in_exe = in_exe && data.read_u32::<LE>()? != 0;
        let file_data = if in_exe { Some(data.read_pas_blob()?) } else { None };
        let export_flags = data.read_u32::<LE>()?;
        let export_folder = data.read_pas_string()?;
        let overwrite = data.read_u32::<LE>()? != 0;
        let free_memory = data.read_u32::<LE>()? != 0;
        let remove_at_game_end = data.read_u32::<LE>()? != 0;

        Ok(IncludeFile {
            file_name,
            file_path,
            original_size,
            data: file_data,
            export_flags,
            export_folder,
            overwrite,
            free_memory,
            remove_at_game_end,
        })
    }
}
