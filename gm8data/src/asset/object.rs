use crate::{
    asset::{checked_count, CodeAction},
    code::CodeRegistry,
    stream::ReadPasExt,
    Error,
};
use byteorder::{ReadBytesExt, LE};
use std::{
    collections::{BTreeMap, BTreeSet},
    io::{self, Seek, SeekFrom},
};

/// Number of event type slots in the gamedata. Collision, alarm and similar
/// events are keyed by a sub-index whose meaning depends on the type (a
/// collision event's index is the colliding object's ID).
pub const EVENT_TYPES: usize = 12;

/// Sub-index list terminator in the event table encoding.
const EVENT_LIST_END: u32 = 0xFFFF_FFFF;

pub struct Object {
    pub name: String,
    pub sprite_index: i32,
    pub solid: bool,
    pub visible: bool,
    pub depth: i32,
    pub persistent: bool,
    pub parent_index: i32,
    pub mask_index: i32,
    /// Action lists per (event type, sub-index).
    pub events: [BTreeMap<u32, Vec<CodeAction>>; EVENT_TYPES],
    /// This object plus its ancestor chain. Filled in by
    /// [`AssetStore::compile_object_identities`](crate::AssetStore::compile_object_identities).
    pub identities: BTreeSet<u32>,
    /// Objects whose ancestor chain includes this one.
    pub children: BTreeSet<u32>,
}

impl Object {
    pub(crate) fn read(data: &mut io::Cursor<&[u8]>, code: &mut dyn CodeRegistry) -> Result<Self, Error> {
        let name = data.read_pas_string()?;
        data.seek(SeekFrom::Current(4))?; // data version
        let sprite_index = data.read_i32::<LE>()?;
        let solid = data.read_u32::<LE>()? != 0;
        let visible = data.read_u32::<LE>()? != 0;
        let depth = data.read_i32::<LE>()?;
        let persistent = data.read_u32::<LE>()? != 0;
        let parent_index = data.read_i32::<LE>()?;
        let mask_index = data.read_i32::<LE>()?;
        data.seek(SeekFrom::Current(4))?; // event type count, always 11

        let mut events: [BTreeMap<u32, Vec<CodeAction>>; EVENT_TYPES] = Default::default();
        for event in events.iter_mut() {
            loop {
                let index = data.read_u32::<LE>()?;
                if index == EVENT_LIST_END {
                    break
                }
                data.seek(SeekFrom::Current(4))?; // action list version
                let action_count = data.read_u32::<LE>()?;
                let action_count = checked_count(data, action_count, 80, "event action count out of bounds")?;
                let mut actions = Vec::with_capacity(action_count);
                for _ in 0..action_count {
                    actions.push(CodeAction::read(data, code)?);
                }
                event.insert(index, actions);
            }
        }

        Ok(Object {
            name,
            sprite_index,
            solid,
            visible,
            depth,
            persistent,
            parent_index,
            mask_index,
            events,
            identities: BTreeSet::new(),
            children: BTreeSet::new(),
        })
    }

    #[cfg(test)]
    pub(crate) fn placeholder(name: &str) -> Self {
        Object {
            name: name.into(),
            sprite_index: -1,
            solid: false,
            visible: true,
            depth: 0,
            persistent: false,
            parent_index: -1,
            mask_index: -1,
            events: Default::default(),
            identities: BTreeSet::new(),
            children: BTreeSet::new(),
        }
    }
}
