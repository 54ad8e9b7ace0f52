use crate::{
    asset::{checked_count, CodeAction},
    code::CodeRegistry,
    stream::ReadPasExt,
    Error,
};
use byteorder::{ReadBytesExt, LE};
use std::{
    collections::BTreeMap,
    io::{self, Seek, SeekFrom},
};

#[derive(Debug)]
pub struct Timeline {
    pub name: String,
    /// Action lists keyed by moment index, in moment order.
    pub moments: BTreeMap<u32, Vec<CodeAction>>,
}

impl Timeline {
    pub(crate) fn read(data: &mut io::Cursor<&[u8]>, code: &mut dyn CodeRegistry) -> Result<Self, Error> {
        let name = data.read_pas_string()?;
        data.seek(SeekFrom::Current(4))?; // data version
        let moment_count = data.read_u32::<LE>()?;
        let moment_count = checked_count(data, moment_count, 12, "timeline moment count out of bounds")?;

        let mut moments = BTreeMap::new();
        for _ in 0..moment_count {
            let index = data.read_u32::<LE>()?;
            data.seek(SeekFrom::Current(4))?; // action list version
            let action_count = data.read_u32::<LE>()?;
            let action_count = checked_count(data, action_count, 80, "timeline action count out of bounds")?;
            let mut actions = Vec::with_capacity(action_count);
            for _ in 0..action_count {
                actions.push(CodeAction::read(data, code)?);
            }
            moments.insert(index, actions);
        }

        Ok(Timeline { name, moments })
    }
}
