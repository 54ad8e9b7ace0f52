pub mod asset;
pub mod code;
pub mod gamedata;
pub mod image;
pub mod reader;
pub mod settings;
pub mod stream;
pub mod zlib;

use crate::{
    asset::{
        Background, Constant, Extension, Font, IncludeFile, Object, Path, Room, Script, Sound, Sprite, Timeline,
        Trigger,
    },
    settings::{GameHelpDialog, Settings},
};
use std::{
    collections::BTreeSet,
    fmt::{self, Display},
    io,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameVersion {
    GameMaker8_0,
    GameMaker8_1,
}

/// One asset category's records in file order.
///
/// Tombstoned slots are `None`: they occupy their ID so that positional
/// references from other records (an object's sprite index, a room instance's
/// object index) keep resolving.
pub type AssetList<T> = Vec<Option<Box<T>>>;

#[derive(Debug)]
pub enum Error {
    InvalidExeHeader,
    UnknownFormat,
    VersionError { expected: u32, got: u32 },
    MalformedData(&'static str),
    OversizedBlock(usize),
    Inflate(String),
    Compile(String),
    IO(io::Error),
}
impl std::error::Error for Error {}
impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Error::InvalidExeHeader => "invalid exe header".into(),
            Error::UnknownFormat => "unknown format, could not identify file".into(),
            Error::VersionError { expected, got } => {
                format!("version error: expected {}, got {}", expected, got)
            },
            Error::MalformedData(what) => format!("malformed data: {}", what),
            Error::OversizedBlock(len) => format!("declared block length out of bounds: {}", len),
            Error::Inflate(err) => format!("error inflating data block: {}", err),
            Error::Compile(err) => format!("error compiling code: {}", err),
            Error::IO(err) => format!("io error: {}", err),
        })
    }
}

macro_rules! from_err {
    ($t: ident, $e: ty, $variant: ident) => {
        impl From<$e> for $t {
            fn from(err: $e) -> Self {
                $t::$variant(err)
            }
        }
    };
}

from_err!(Error, io::Error, IO);

/// Every decoded asset, indexed by category and ID, plus the file-level
/// metadata that travels with them. Populated once by [`reader::from_exe`]
/// and owned by whichever runtime context consumes it.
pub struct AssetStore {
    pub extensions: Vec<Extension>,
    pub triggers: AssetList<Trigger>,
    pub constants: Vec<Constant>,
    pub sounds: AssetList<Sound>,
    pub sprites: AssetList<Sprite>,
    pub backgrounds: AssetList<Background>,
    pub paths: AssetList<Path>,
    pub scripts: AssetList<Script>,
    pub fonts: AssetList<Font>,
    pub timelines: AssetList<Timeline>,
    pub objects: AssetList<Object>,
    pub rooms: AssetList<Room>,
    pub included_files: AssetList<IncludeFile>,

    pub version: GameVersion,
    pub settings: Settings,
    pub help_dialog: GameHelpDialog,
    pub game_id: u32,
    pub guid: [u32; 4],
    pub last_instance_id: u32,
    pub last_tile_id: u32,
    pub room_order: Vec<u32>,
}

impl AssetStore {
    pub fn room(&self, id: u32) -> Option<&Room> {
        self.rooms.get(id as usize).and_then(|r| r.as_deref())
    }

    pub fn object(&self, id: u32) -> Option<&Object> {
        self.objects.get(id as usize).and_then(|o| o.as_deref())
    }

    pub fn sprite(&self, id: u32) -> Option<&Sprite> {
        self.sprites.get(id as usize).and_then(|s| s.as_deref())
    }

    /// Resolves each object's identity set (itself plus its ancestor chain)
    /// and the inverse child sets, used by event and collision dispatch.
    pub fn compile_object_identities(&mut self) {
        let count = self.objects.len();
        let parents: Vec<Option<i32>> =
            self.objects.iter().map(|slot| slot.as_ref().map(|o| o.parent_index)).collect();

        let mut all_identities: Vec<Option<BTreeSet<u32>>> = Vec::with_capacity(count);
        for i in 0..count {
            let mut current = match parents[i] {
                Some(parent) => parent,
                None => {
                    all_identities.push(None);
                    continue
                },
            };
            let mut identities = BTreeSet::new();
            identities.insert(i as u32);
            // Bounded walk so a malformed parent cycle can't spin forever.
            for _ in 0..count {
                if current < 0 || current as usize >= count {
                    break
                }
                if !identities.insert(current as u32) {
                    break
                }
                current = match parents[current as usize] {
                    Some(parent) => parent,
                    None => break,
                };
            }
            all_identities.push(Some(identities));
        }

        let mut children: Vec<BTreeSet<u32>> = vec![BTreeSet::new(); count];
        for (i, identities) in all_identities.iter().enumerate() {
            if let Some(identities) = identities {
                for &ancestor in identities.iter().filter(|&&id| id != i as u32) {
                    children[ancestor as usize].insert(i as u32);
                }
            }
        }

        for (i, slot) in self.objects.iter_mut().enumerate() {
            if let Some(object) = slot.as_deref_mut() {
                object.identities = all_identities[i].take().unwrap_or_default();
                object.children = std::mem::take(&mut children[i]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Object;

    fn bare_object(parent_index: i32) -> Option<Box<Object>> {
        let mut object = Object::placeholder("test");
        object.parent_index = parent_index;
        Some(Box::new(object))
    }

    fn store_with_objects(objects: AssetList<Object>) -> AssetStore {
        AssetStore {
            extensions: Vec::new(),
            triggers: Vec::new(),
            constants: Vec::new(),
            sounds: Vec::new(),
            sprites: Vec::new(),
            backgrounds: Vec::new(),
            paths: Vec::new(),
            scripts: Vec::new(),
            fonts: Vec::new(),
            timelines: Vec::new(),
            objects,
            rooms: Vec::new(),
            included_files: Vec::new(),
            version: GameVersion::GameMaker8_0,
            settings: Settings::default(),
            help_dialog: GameHelpDialog::default(),
            game_id: 0,
            guid: [0; 4],
            last_instance_id: 0,
            last_tile_id: 0,
            room_order: Vec::new(),
        }
    }

    #[test]
    fn identities_follow_the_parent_chain() {
        let mut store =
            store_with_objects(vec![bare_object(-1), bare_object(0), bare_object(1), None, bare_object(-1)]);
        store.compile_object_identities();

        let ids = |i: u32| store.object(i).unwrap().identities.iter().copied().collect::<Vec<_>>();
        assert_eq!(ids(0), vec![0]);
        assert_eq!(ids(1), vec![0, 1]);
        assert_eq!(ids(2), vec![0, 1, 2]);
        assert_eq!(ids(4), vec![4]);

        let kids = |i: u32| store.object(i).unwrap().children.iter().copied().collect::<Vec<_>>();
        assert_eq!(kids(0), vec![1, 2]);
        assert_eq!(kids(1), vec![2]);
        assert!(kids(2).is_empty());
    }

    #[test]
    fn parent_cycles_terminate() {
        let mut store = store_with_objects(vec![bare_object(1), bare_object(0)]);
        store.compile_object_identities();
        assert_eq!(store.object(0).unwrap().identities.len(), 2);
        assert_eq!(store.object(1).unwrap().identities.len(), 2);
    }
}
