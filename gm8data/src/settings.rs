use crate::{stream::ReadPasExt, zlib::BlockReader, Error, GameVersion};
use byteorder::{ReadBytesExt, LE};
use log::debug;
use std::io;

/// The decoded settings block.
#[derive(Debug, Default, Clone)]
pub struct Settings {
    pub fullscreen: bool,
    pub interpolate_pixels: bool,
    pub draw_border: bool,
    pub display_cursor: bool,
    pub scaling: i32,
    pub allow_resize: bool,
    pub window_on_top: bool,
    pub colour_outside_room: u32,
    pub set_resolution: bool,
    pub colour_depth: u32,
    pub resolution: u32,
    pub frequency: u32,
    pub show_buttons: bool,
    pub vsync: bool,
    pub disable_screensaver: bool,
    pub f4_fullscreen_toggle: bool,
    pub f1_help_menu: bool,
    pub esc_close_game: bool,
    pub f5_save_f6_load: bool,
    pub f9_screenshot: bool,
    pub treat_close_as_esc: bool,
    pub priority: u32,
    pub freeze_on_lose_focus: bool,
    pub loading_bar: u32,
    pub custom_load_image: bool,
    pub transparent: bool,
    pub translucency: u32,
    pub scale_progress_bar: bool,
    pub show_error_messages: bool,
    pub log_errors: bool,
    pub always_abort: bool,
    pub zero_uninitialized_vars: bool,
    pub error_on_uninitialized_args: bool,
}

/// The game information dialog (the F1 screen).
#[derive(Debug, Default, Clone)]
pub struct GameHelpDialog {
    pub bg_colour: u32,
    pub new_window: bool,
    pub caption: String,
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    pub border: bool,
    pub resizable: bool,
    pub window_on_top: bool,
    pub freeze_game: bool,
    pub info: String,
}

impl Settings {
    /// Parses an inflated settings chunk. The loading-bar images and custom
    /// load image are themselves compressed blocks; they're inflated (into a
    /// scratch buffer) to step over them, then discarded.
    pub fn read(chunk: &[u8], version: GameVersion) -> Result<Settings, Error> {
        let mut cfg = io::Cursor::new(chunk);
        let mut scratch = BlockReader::new();

        let fullscreen = cfg.read_u32::<LE>()? != 0;
        let interpolate_pixels = cfg.read_u32::<LE>()? != 0;
        let draw_border = cfg.read_u32::<LE>()? == 0;
        let display_cursor = cfg.read_u32::<LE>()? != 0;
        let scaling = cfg.read_i32::<LE>()?;
        let allow_resize = cfg.read_u32::<LE>()? != 0;
        let window_on_top = cfg.read_u32::<LE>()? != 0;
        let colour_outside_room = cfg.read_u32::<LE>()?;
        let set_resolution = cfg.read_u32::<LE>()? != 0;
        let colour_depth = cfg.read_u32::<LE>()?;
        let resolution = cfg.read_u32::<LE>()?;
        let frequency = cfg.read_u32::<LE>()?;
        let show_buttons = cfg.read_u32::<LE>()? == 0;
        let vsync = cfg.read_u32::<LE>()? != 0;
        let disable_screensaver = cfg.read_u32::<LE>()? != 0;
        let f4_fullscreen_toggle = cfg.read_u32::<LE>()? != 0;
        let f1_help_menu = cfg.read_u32::<LE>()? != 0;
        let esc_close_game = cfg.read_u32::<LE>()? != 0;
        let f5_save_f6_load = cfg.read_u32::<LE>()? != 0;
        let f9_screenshot = cfg.read_u32::<LE>()? != 0;
        let treat_close_as_esc = cfg.read_u32::<LE>()? != 0;
        let priority = cfg.read_u32::<LE>()?;
        let freeze_on_lose_focus = cfg.read_u32::<LE>()? != 0;

        let loading_bar = cfg.read_u32::<LE>()?;
        if loading_bar != 0 {
            if cfg.read_u32::<LE>()? != 0 {
                scratch.inflate(&mut cfg)?; // loading bar back image
            }
            if cfg.read_u32::<LE>()? != 0 {
                scratch.inflate(&mut cfg)?; // loading bar front image
            }
        }
        let custom_load_image = cfg.read_u32::<LE>()? != 0;
        if custom_load_image {
            scratch.inflate(&mut cfg)?; // BMP-format load image
        }

        let transparent = cfg.read_u32::<LE>()? != 0;
        let translucency = cfg.read_u32::<LE>()?;
        let scale_progress_bar = cfg.read_u32::<LE>()? != 0;
        let show_error_messages = cfg.read_u32::<LE>()? != 0;
        let log_errors = cfg.read_u32::<LE>()? != 0;
        let always_abort = cfg.read_u32::<LE>()? != 0;
        let (zero_uninitialized_vars, error_on_uninitialized_args) = match (version, cfg.read_u32::<LE>()?) {
            (GameVersion::GameMaker8_0, x) => (x != 0, true),
            (GameVersion::GameMaker8_1, x) => (x & 1 != 0, x & 2 != 0),
        };

        debug!(" + Loaded settings structure");
        debug!("   - Start in full-screen mode: {}", fullscreen);
        debug!("   - Colour outside the room region: #{:0>8X}", colour_outside_room);
        debug!("   - Display error messages: {}", show_error_messages);

        Ok(Settings {
            fullscreen,
            interpolate_pixels,
            draw_border,
            display_cursor,
            scaling,
            allow_resize,
            window_on_top,
            colour_outside_room,
            set_resolution,
            colour_depth,
            resolution,
            frequency,
            show_buttons,
            vsync,
            disable_screensaver,
            f4_fullscreen_toggle,
            f1_help_menu,
            esc_close_game,
            f5_save_f6_load,
            f9_screenshot,
            treat_close_as_esc,
            priority,
            freeze_on_lose_focus,
            loading_bar,
            custom_load_image,
            transparent,
            translucency,
            scale_progress_bar,
            show_error_messages,
            log_errors,
            always_abort,
            zero_uninitialized_vars,
            error_on_uninitialized_args,
        })
    }
}

impl GameHelpDialog {
    pub fn read(chunk: &[u8]) -> Result<GameHelpDialog, Error> {
        let mut data = io::Cursor::new(chunk);
        Ok(GameHelpDialog {
            bg_colour: data.read_u32::<LE>()?,
            new_window: data.read_u32::<LE>()? != 0,
            caption: data.read_pas_string()?,
            left: data.read_i32::<LE>()?,
            top: data.read_i32::<LE>()?,
            width: data.read_u32::<LE>()?,
            height: data.read_u32::<LE>()?,
            border: data.read_u32::<LE>()? != 0,
            resizable: data.read_u32::<LE>()? != 0,
            window_on_top: data.read_u32::<LE>()? != 0,
            freeze_game: data.read_u32::<LE>()? != 0,
            info: data.read_pas_string()?,
        })
    }
}
