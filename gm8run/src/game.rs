use crate::render::{RenderBackend, Renderer, RendererError};
use gm8data::{
    code::{CodeHandle, CodeRegistry},
    reader, AssetStore,
};
use log::debug;
use std::fmt::{self, Display};

#[derive(Debug)]
pub enum GameError {
    Load(gm8data::Error),
    Renderer(RendererError),
    NoRooms,
    BadRoomRef(u32),
}
impl std::error::Error for GameError {}
impl Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            GameError::Load(err) => format!("game data error: {}", err),
            GameError::Renderer(err) => format!("renderer error: {}", err),
            GameError::NoRooms => "the room order is empty, no room to start in".into(),
            GameError::BadRoomRef(id) => format!("the room order names room {} which does not exist", id),
        })
    }
}

impl From<gm8data::Error> for GameError {
    fn from(err: gm8data::Error) -> Self {
        GameError::Load(err)
    }
}
impl From<RendererError> for GameError {
    fn from(err: RendererError) -> Self {
        GameError::Renderer(err)
    }
}

/// Stand-in for the code runner: retains every registered source blob and
/// compiles trivially, so a loaded game can be inspected and driven without
/// a GML virtual machine attached.
#[derive(Default)]
pub struct CodeBank {
    entries: Vec<CodeEntry>,
}

struct CodeEntry {
    source: Box<[u8]>,
    question: bool,
}

impl CodeBank {
    pub fn new() -> CodeBank {
        CodeBank::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source(&self, handle: CodeHandle) -> Option<&[u8]> {
        self.entries.get(handle as usize).map(|entry| &*entry.source)
    }

    pub fn is_question(&self, handle: CodeHandle) -> Option<bool> {
        self.entries.get(handle as usize).map(|entry| entry.question)
    }
}

impl CodeRegistry for CodeBank {
    fn register(&mut self, source: &[u8]) -> CodeHandle {
        let handle = self.entries.len() as CodeHandle;
        self.entries.push(CodeEntry { source: source.into(), question: false });
        handle
    }

    fn register_question(&mut self, source: &[u8]) -> CodeHandle {
        let handle = self.entries.len() as CodeHandle;
        self.entries.push(CodeEntry { source: source.into(), question: true });
        handle
    }

    fn compile(&mut self, _handle: CodeHandle) -> Result<(), String> {
        Ok(())
    }
}

/// A loaded game: the asset store plus the runtime pieces that feed off it.
pub struct Game<B: RenderBackend> {
    pub assets: AssetStore,
    pub renderer: Renderer,
    pub code: CodeBank,
    pub backend: B,
    pub current_room: Option<u32>,
}

impl<B: RenderBackend> Game<B> {
    /// Decodes the game file, registering its code blobs and pixel buffers
    /// along the way. The file buffer is decrypted in place and dropped when
    /// this returns.
    pub fn launch(mut file: Vec<u8>, strict: bool, backend: B) -> Result<Game<B>, GameError> {
        let mut code = CodeBank::new();
        let mut renderer = Renderer::new();
        let assets = reader::from_exe(&mut file, strict, &mut code, &mut renderer)?;
        Ok(Game { assets, renderer, code, backend, current_room: None })
    }

    /// Creates the game window sized to the first room in room order,
    /// compiles the texture atlases and selects that room.
    pub fn start(&mut self) -> Result<(), GameError> {
        let first = *self.assets.room_order.first().ok_or(GameError::NoRooms)?;
        let room = self.assets.room(first).ok_or(GameError::BadRoomRef(first))?;
        let (width, height, bg_colour) = (room.width, room.height, room.bg_colour);

        debug!("Creating game window ({}x{})", width, height);
        self.renderer.make_game_window(&mut self.backend, &self.assets.settings, width, height)?;
        self.renderer.set_background_colour(bg_colour);
        self.current_room = Some(first);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCommand, TextureId};
    use gm8data::{
        asset::Room,
        settings::{GameHelpDialog, Settings},
        GameVersion,
    };

    #[test]
    fn code_bank_hands_out_dense_handles() {
        let mut bank = CodeBank::new();
        let a = bank.register(b"instance_destroy()");
        let b = bank.register_question(b"x > 4");
        assert_eq!((a, b), (0, 1));
        assert_eq!(bank.source(a).unwrap(), b"instance_destroy()");
        assert_eq!(bank.is_question(b), Some(true));
        assert_eq!(bank.is_question(a), Some(false));
        assert!(bank.compile(a).is_ok());
        assert_eq!(bank.len(), 2);
        assert!(bank.source(2).is_none());
    }

    struct WindowBackend {
        opened: Option<(u32, u32)>,
    }

    impl RenderBackend for WindowBackend {
        fn max_texture_size(&self) -> u32 {
            1024
        }

        fn open_window(&mut self, width: u32, height: u32, _settings: &Settings) {
            self.opened = Some((width, height));
        }

        fn upload_texture(&mut self, _width: u32, _height: u32, _rgba: &[u8]) -> TextureId {
            0
        }

        fn clear(&mut self, _colour: u32) {}

        fn bind_texture(&mut self, _texture: TextureId) {}

        fn draw_batch(&mut self, _commands: &[DrawCommand]) {}
    }

    fn bare_room(width: u32, height: u32) -> Room {
        Room {
            name: "rm_first".into(),
            caption: String::new(),
            width,
            height,
            speed: 30,
            persistent: false,
            bg_colour: 0xC0C0C0,
            clear_screen: true,
            creation_code: 0,
            enable_views: false,
            backgrounds: Vec::new(),
            views: Vec::new(),
            instances: Vec::new(),
            tiles: Vec::new(),
        }
    }

    fn bare_store() -> AssetStore {
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
            objects: Vec::new(),
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
    fn start_opens_a_window_sized_to_the_first_room() {
        let mut assets = bare_store();
        assets.rooms = vec![None, Some(Box::new(bare_room(320, 240)))];
        assets.room_order = vec![1];

        let mut game = Game {
            assets,
            renderer: Renderer::new(),
            code: CodeBank::new(),
            backend: WindowBackend { opened: None },
            current_room: None,
        };
        game.start().unwrap();
        assert_eq!(game.backend.opened, Some((320, 240)));
        assert_eq!(game.current_room, Some(1));
    }

    #[test]
    fn start_without_rooms_is_an_error() {
        let mut game = Game {
            assets: bare_store(),
            renderer: Renderer::new(),
            code: CodeBank::new(),
            backend: WindowBackend { opened: None },
            current_room: None,
        };
        assert!(matches!(game.start(), Err(GameError::NoRooms)));

        game.assets.room_order = vec![3];
        assert!(matches!(game.start(), Err(GameError::BadRoomRef(3))));
    }
}
