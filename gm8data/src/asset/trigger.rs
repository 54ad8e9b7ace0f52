use crate::{
    code::{CodeHandle, CodeRegistry},
    stream::ReadPasExt,
    Error,
};
use byteorder::{ReadBytesExt, LE};
use std::io::{self, Seek, SeekFrom};

#[derive(Debug)]
pub struct Trigger {
    pub name: String,
    /// The condition expression, registered as a question.
    pub condition: CodeHandle,
    /// 0 = begin step, 1 = step, 2 = end step.
    pub check_moment: u32,
    pub constant_name: String,
}

impl Trigger {
    pub(crate) fn read(data: &mut io::Cursor<&[u8]>, code: &mut dyn CodeRegistry) -> Result<Self, Error> {
        data.seek(SeekFrom::Current(4))?; // data version
        let name = data.read_pas_string()?;
        let condition_source = data.read_pas_blob()?;
        let check_moment = data.read_u32::<LE>()?;
        let constant_name = data.read_pas_string()?;
        let condition = code.register_question(&condition_source);
        Ok(Trigger { name, condition, check_moment, constant_name })
    }
}
