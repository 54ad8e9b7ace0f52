use crate::{
    asset::checked_count,
    code::{CodeHandle, CodeRegistry},
    stream::ReadPasExt,
    Error,
};
use byteorder::{ReadBytesExt, LE};
use std::io::{self, Seek, SeekFrom};

pub struct Room {
    pub name: String,
    pub caption: String,
    pub width: u32,
    pub height: u32,
    pub speed: u32,
    pub persistent: bool,
    pub bg_colour: u32,
    pub clear_screen: bool,
    pub creation_code: CodeHandle,
    pub enable_views: bool,
    pub backgrounds: Vec<RoomBackground>,
    pub views: Vec<RoomView>,
    pub instances: Vec<RoomInstance>,
    pub tiles: Vec<RoomTile>,
}

#[derive(Debug)]
pub struct RoomBackground {
    pub visible: bool,
    pub foreground: bool,
    pub background_index: i32,
    pub x: i32,
    pub y: i32,
    pub tile_horizontal: bool,
    pub tile_vertical: bool,
    pub hspeed: i32,
    pub vspeed: i32,
    pub stretch: bool,
}

#[derive(Debug)]
pub struct RoomView {
    pub visible: bool,
    pub view_x: i32,
    pub view_y: i32,
    pub view_width: u32,
    pub view_height: u32,
    pub port_x: u32,
    pub port_y: u32,
    pub port_width: u32,
    pub port_height: u32,
    pub hborder: u32,
    pub vborder: u32,
    pub hspeed: u32,
    pub vspeed: u32,
    pub follow_target: i32,
}

/// A placed object, with its per-instance creation code.
#[derive(Debug)]
pub struct RoomInstance {
    pub x: i32,
    pub y: i32,
    pub object_index: u32,
    pub id: u32,
    pub creation_code: CodeHandle,
}

#[derive(Debug)]
pub struct RoomTile {
    pub x: i32,
    pub y: i32,
    pub background_index: u32,
    pub tile_x: u32,
    pub tile_y: u32,
    pub width: u32,
    pub height: u32,
    pub depth: i32,
    pub id: u32,
}

impl Room {
    pub(crate) fn read(data: &mut io::Cursor<&[u8]>, code: &mut dyn CodeRegistry) -> Result<Self, Error> {
        let name = data.read_pas_string()?;
        data.seek(SeekFrom::Current(4))?; // data version
        let caption = data.read_pas_string()?;
        let width = data.read_u32::<LE>()?;
        let height = data.read_u32::<LE>()?;
        let speed = data.read_u32::<LE>()?;
        let persistent = data.read_u32::<LE>()? != 0;
        let bg_colour = data.read_u32::<LE>()?;
        let clear_screen = data.read_u32::<LE>()? != 0;
        let creation_source = data.read_pas_blob()?;
        let creation_code = code.register(&creation_source);

        let background_count = data.read_u32::<LE>()?;
        let background_count = checked_count(data, background_count, 40, "room background count out of bounds")?;
        let mut backgrounds = Vec::with_capacity(background_count);
        for _ in 0..background_count {
            backgrounds.push(RoomBackground {
                visible: data.read_u32::<LE>()? != 0,
                foreground: data.read_u32::<LE>()? != 0,
                background_index: data.read_i32::<LE>()?,
                x: data.read_i32::<LE>()?,
                y: data.read_i32::<LE>()?,
                tile_horizontal: data.read_u32::<LE>()? != 0,
                tile_vertical: data.read_u32::<LE>()? != 0,
                hspeed: data.read_i32::<LE>()?,
                vspeed: data.read_i32::<LE>()?,
                stretch: data.read_u32::<LE>()? != 0,
            });
        }

        let enable_views = data.read_u32::<LE>()? != 0;
        let view_count = data.read_u32::<LE>()?;
        let view_count = checked_count(data, view_count, 56, "room view count out of bounds")?;
        let mut views = Vec::with_capacity(view_count);
        for _ in 0..view_count {
            views.push(RoomView {
                visible: data.read_u32::<LE>()? != 0,
                view_x: data.read_i32::<LE>()?,
                view_y: data.read_i32::<LE>()?,
                view_width: data.read_u32::<LE>()?,
                view_height: data.read_u32::<LE>()?,
                port_x: data.read_u32::<LE>()?,
                port_y: data.read_u32::<LE>()?,
                port_width: data.read_u32::<LE>()?,
                port_height: data.read_u32::<LE>()?,
                hborder: data.read_u32::<LE>()?,
                vborder: data.read_u32::<LE>()?,
                hspeed: data.read_u32::<LE>()?,
                vspeed: data.read_u32::<LE>()?,
                follow_target: data.read_i32::<LE>()?,
            });
        }

        let instance_count = data.read_u32::<LE>()?;
        let instance_count = checked_count(data, instance_count, 20, "room instance count out of bounds")?;
        let mut instances = Vec::with_capacity(instance_count);
        for _ in 0..instance_count {
            let x = data.read_i32::<LE>()?;
            let y = data.read_i32::<LE>()?;
            let object_index = data.read_u32::<LE>()?;
            let id = data.read_u32::<LE>()?;
            let creation_source = data.read_pas_blob()?;
            instances.push(RoomInstance { x, y, object_index, id, creation_code: code.register(&creation_source) });
        }

        let tile_count = data.read_u32::<LE>()?;
        let tile_count = checked_count(data, tile_count, 36, "room tile count out of bounds")?;
        let mut tiles = Vec::with_capacity(tile_count);
        for _ in 0..tile_count {
            tiles.push(RoomTile {
                x: data.read_i32::<LE>()?,
                y: data.read_i32::<LE>()?,
                background_index: data.read_u32::<LE>()?,
                tile_x: data.read_u32::<LE>()?,
                tile_y: data.read_u32::<LE>()?,
                width: data.read_u32::<LE>()?,
                height: data.read_u32::<LE>()?,
                depth: data.read_i32::<LE>()?,
                id: data.read_u32::<LE>()?,
            });
        }

        Ok(Room {
            name,
            caption,
            width,
            height,
            speed,
            persistent,
            bg_colour,
            clear_screen,
            creation_code,
            enable_views,
            backgrounds,
            views,
            instances,
            tiles,
        })
    }
}
