use crate::{
    asset::{checked_count, read_swapped_pixels},
    image::{ImageId, ImageSink},
    stream::ReadPasExt,
    Error,
};
use byteorder::{ReadBytesExt, LE};
use std::io::{self, Seek, SeekFrom};

#[derive(Debug)]
pub struct Sprite {
    pub name: String,
    /// Inherited from the first frame; a frameless sprite is 1x1.
    pub width: u32,
    pub height: u32,
    pub origin_x: i32,
    pub origin_y: i32,
    pub frames: Vec<ImageId>,
    pub separate_collision: bool,
    /// One map per frame when `separate_collision`, otherwise one shared map.
    pub collision_maps: Vec<CollisionMap>,
}

/// Per-pixel hit mask with its precomputed bounding box.
#[derive(Debug)]
pub struct CollisionMap {
    pub width: u32,
    pub height: u32,
    pub left: u32,
    pub right: u32,
    pub bottom: u32,
    pub top: u32,
    pub data: Vec<bool>,
}

impl Sprite {
    pub(crate) fn read(data: &mut io::Cursor<&[u8]>, images: &mut dyn ImageSink) -> Result<Self, Error> {
        let name = data.read_pas_string()?;
        data.seek(SeekFrom::Current(4))?; // data version
        let origin_x = data.read_i32::<LE>()?;
        let origin_y = data.read_i32::<LE>()?;

        let frame_count = data.read_u32::<LE>()?;
        if frame_count == 0 {
            // Documented fallback: no frames, nominal 1x1 size.
            return Ok(Sprite {
                name,
                width: 1,
                height: 1,
                origin_x,
                origin_y,
                frames: Vec::new(),
                separate_collision: false,
                collision_maps: Vec::new(),
            })
        }

        let frame_count = checked_count(data, frame_count, 16, "sprite frame count out of bounds")?;
        let mut frames = Vec::with_capacity(frame_count);
        let (mut width, mut height) = (1, 1);
        for i in 0..frame_count {
            data.seek(SeekFrom::Current(4))?; // data version
            let frame_width = data.read_u32::<LE>()?;
            let frame_height = data.read_u32::<LE>()?;
            let pixel_len = data.read_u32::<LE>()?;
            if u64::from(pixel_len) != u64::from(frame_width) * u64::from(frame_height) * 4 {
                return Err(Error::MalformedData("sprite frame pixel data length mismatch"))
            }
            let pixels = read_swapped_pixels(data, pixel_len as usize)?;
            frames.push(images.make_image(frame_width, frame_height, origin_x, origin_y, pixels));
            if i == 0 {
                width = frame_width;
                height = frame_height;
            }
        }

        let separate_collision = data.read_u32::<LE>()? != 0;
        let map_count = if separate_collision { frame_count } else { 1 };
        let mut collision_maps = Vec::with_capacity(map_count);
        for _ in 0..map_count {
            data.seek(SeekFrom::Current(4))?; // data version
            collision_maps.push(CollisionMap::read(data)?);
        }

        Ok(Sprite { name, width, height, origin_x, origin_y, frames, separate_collision, collision_maps })
    }
}

impl CollisionMap {
    fn read(data: &mut io::Cursor<&[u8]>) -> Result<Self, Error> {
        let width = data.read_u32::<LE>()?;
        let height = data.read_u32::<LE>()?;
        let left = data.read_u32::<LE>()?;
        let right = data.read_u32::<LE>()?;
        let bottom = data.read_u32::<LE>()?;
        let top = data.read_u32::<LE>()?;

        let size = u64::from(width) * u64::from(height);
        if size > u64::from(u32::max_value()) {
            return Err(Error::MalformedData("collision map size out of bounds"))
        }
        let size = checked_count(data, size as u32, 4, "collision map size out of bounds")?;
        let mut mask = Vec::with_capacity(size);
        for _ in 0..size {
            mask.push(data.read_u32::<LE>()? != 0);
        }

        Ok(CollisionMap { width, height, left, right, bottom, top, data: mask })
    }
}
