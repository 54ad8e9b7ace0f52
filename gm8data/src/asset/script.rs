use crate::{
    code::{CodeHandle, CodeRegistry},
    stream::ReadPasExt,
    Error,
};
use std::io::{self, Seek, SeekFrom};

#[derive(Debug)]
pub struct Script {
    pub name: String,
    pub source: CodeHandle,
}

impl Script {
    pub(crate) fn read(data: &mut io::Cursor<&[u8]>, code: &mut dyn CodeRegistry) -> Result<Self, Error> {
        let name = data.read_pas_string()?;
        data.seek(SeekFrom::Current(4))?; // data version
        let body = data.read_pas_blob()?;
        let source = code.register(&body);
        Ok(Script { name, source })
    }
}
