use crate::atlas::Packer;
use gm8data::{
    image::{ImageId, ImageSink},
    settings::Settings,
};
use std::{
    cmp,
    fmt::{self, Display},
};

/// Hard limit on atlas slots; packing that would need more fails the launch.
pub const MAX_ATLASES: usize = 32;

/// Bin sides shrink in steps of this many pixels while their contents still
/// fit.
const SHRINK_STEP: u32 = 256;

pub type TextureId = u32;

#[derive(Debug)]
pub enum RendererError {
    /// A single image exceeds the backend's maximum texture dimension.
    ImageTooLarge { width: u32, height: u32, max: u32 },
    /// The images cannot be packed into the available atlas slots.
    AtlasOverflow,
    /// The game window was already created.
    WindowAlreadyOpen,
}
impl std::error::Error for RendererError {}
impl Display for RendererError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            RendererError::ImageTooLarge { width, height, max } => {
                format!("an image of {}x{} exceeds the maximum texture dimension {}", width, height, max)
            },
            RendererError::AtlasOverflow => {
                format!("images do not fit in {} texture atlases", MAX_ATLASES)
            },
            RendererError::WindowAlreadyOpen => "game window already exists".into(),
        })
    }
}

/// Interface to the graphics backend the renderer emits into.
pub trait RenderBackend {
    fn max_texture_size(&self) -> u32;
    fn open_window(&mut self, width: u32, height: u32, settings: &Settings);
    fn upload_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> TextureId;
    fn clear(&mut self, colour: u32);
    fn bind_texture(&mut self, texture: TextureId);
    /// One instanced draw of a contiguous run of same-atlas commands.
    fn draw_batch(&mut self, commands: &[DrawCommand]);
}

/// One image instance to be rendered this frame.
#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub transform: [f32; 16],
    pub alpha: f32,
    pub blend: [f32; 3],
    pub atlas_xy: [f32; 2],
    pub atlas_wh: [f32; 2],
    /// The packed sub-rectangle holds the image rotated 90 degrees; the
    /// texcoord axes are swapped.
    pub rotated: bool,
    pub image: ImageId,
    pub atlas_id: u32,
}

/// A pixel buffer waiting to be packed, between submission and compilation.
struct PreImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
    image: ImageId,
}

/// Where a submitted image ended up: its atlas and packed rectangle.
#[derive(Debug, Clone, Copy)]
pub struct AtlasImage {
    pub atlas_id: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub origin_x: i32,
    pub origin_y: i32,
    pub rotated: bool,
}

struct Atlas {
    texture: TextureId,
    width: u32,
    height: u32,
}

struct Placement {
    index: usize,
    x: u32,
    y: u32,
    rotated: bool,
}

pub struct Renderer {
    pre_images: Vec<PreImage>,
    images: Vec<AtlasImage>,
    atlases: Vec<Atlas>,
    commands: Vec<DrawCommand>,
    bound_atlas: Option<u32>,
    compiled: bool,
    window_open: bool,
    window_width: u32,
    window_height: u32,
    colour_outside_room: u32,
    room_bg_colour: u32,

    widest: u32,
    tallest: u32,
    pixel_count: u64,
}

impl Default for Renderer {
    fn default() -> Renderer {
        Renderer {
            pre_images: Vec::new(),
            images: Vec::new(),
            atlases: Vec::new(),
            commands: Vec::new(),
            bound_atlas: None,
            compiled: false,
            window_open: false,
            window_width: 0,
            window_height: 0,
            colour_outside_room: 0,
            room_bg_colour: 0,
            widest: 0,
            tallest: 0,
            pixel_count: 0,
        }
    }
}

impl ImageSink for Renderer {
    fn make_image(&mut self, width: u32, height: u32, origin_x: i32, origin_y: i32, rgba: Vec<u8>) -> ImageId {
        assert!(!self.compiled, "the game is already running, submitting new images is not supported");
        debug_assert!(rgba.len() as u64 == u64::from(width) * u64::from(height) * 4);

        let image = self.images.len() as ImageId;
        self.images.push(AtlasImage { atlas_id: 0, x: 0, y: 0, width, height, origin_x, origin_y, rotated: false });
        self.pre_images.push(PreImage { width, height, data: rgba, image });

        self.widest = cmp::max(self.widest, width);
        self.tallest = cmp::max(self.tallest, height);
        self.pixel_count += u64::from(width) * u64::from(height);

        image
    }
}

impl Renderer {
    pub fn new() -> Renderer {
        Renderer::default()
    }

    pub fn image(&self, image: ImageId) -> Option<&AtlasImage> {
        self.images.get(image as usize)
    }

    pub fn atlas_count(&self) -> usize {
        self.atlases.len()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn set_background_colour(&mut self, colour: u32) {
        self.room_bg_colour = colour;
    }

    /// Creates the game window and compiles the atlases. Only intended to be
    /// called once per loaded game.
    pub fn make_game_window(
        &mut self,
        backend: &mut dyn RenderBackend,
        settings: &Settings,
        width: u32,
        height: u32,
    ) -> Result<(), RendererError> {
        if self.window_open {
            return Err(RendererError::WindowAlreadyOpen)
        }
        backend.open_window(width, height, settings);
        self.window_open = true;
        self.window_width = width;
        self.window_height = height;
        self.colour_outside_room = settings.colour_outside_room;
        self.compile_atlases(backend)
    }

    /// Packs every submitted image into at most [`MAX_ATLASES`] atlases and
    /// uploads the composed pixel buffers. Runs exactly once; afterwards the
    /// per-image pixel copies are released and every image knows its atlas
    /// rectangle.
    pub fn compile_atlases(&mut self, backend: &mut dyn RenderBackend) -> Result<(), RendererError> {
        assert!(!self.compiled, "atlases have already been compiled");
        self.compiled = true;

        let max_side = backend.max_texture_size();
        if self.widest > max_side || self.tallest > max_side {
            return Err(RendererError::ImageTooLarge { width: self.widest, height: self.tallest, max: max_side })
        }
        if self.pixel_count == 0 {
            self.pre_images.clear();
            return Ok(())
        }

        // Taller images first; the skyline packer does best that way.
        let mut remaining: Vec<usize> = (0..self.pre_images.len()).collect();
        remaining.sort_by_key(|&i| cmp::Reverse(self.pre_images[i].height));

        let mut packer = Packer::new(max_side, max_side);
        for _ in 0..MAX_ATLASES {
            if remaining.is_empty() {
                break
            }
            let (placements, deferred, side) = pack_slot(&self.pre_images, &mut packer, &remaining, max_side);

            let atlas_id = self.atlases.len() as u32;
            let stride = side as usize * 4;
            let mut pixels = vec![0u8; side as usize * stride];
            for placement in &placements {
                let pre = &self.pre_images[placement.index];
                let slot = &mut self.images[pre.image as usize];
                slot.atlas_id = atlas_id;
                slot.x = placement.x;
                slot.y = placement.y;
                slot.rotated = placement.rotated;

                if pre.width == 0 || pre.height == 0 {
                    continue
                } else if !placement.rotated {
                    let row_len = pre.width as usize * 4;
                    for (i, row) in pre.data.chunks_exact(row_len).enumerate() {
                        let start = (placement.y as usize + i) * stride + placement.x as usize * 4;
                        pixels[start..start + row.len()].copy_from_slice(row);
                    }
                } else {
                    // Source pixel (x, y) lands rotated a quarter turn
                    // clockwise inside the packed rectangle.
                    for y in 0..pre.height as usize {
                        for x in 0..pre.width as usize {
                            let src = (y * pre.width as usize + x) * 4;
                            let dst_x = placement.x as usize + pre.height as usize - 1 - y;
                            let dst_y = placement.y as usize + x;
                            let dst = dst_y * stride + dst_x * 4;
                            pixels[dst..dst + 4].copy_from_slice(&pre.data[src..src + 4]);
                        }
                    }
                }
            }

            let texture = backend.upload_texture(side, side, &pixels);
            self.atlases.push(Atlas { texture, width: side, height: side });
            remaining = deferred;
        }

        if !remaining.is_empty() {
            return Err(RendererError::AtlasOverflow)
        }
        self.pre_images.clear();
        Ok(())
    }

    pub fn draw_image(
        &mut self,
        image: ImageId,
        x: f64,
        y: f64,
        xscale: f64,
        yscale: f64,
        rotation: f64,
        blend: u32,
        alpha: f64,
    ) {
        if let Some(img) = self.images.get(image as usize) {
            let (width, height) = (img.width, img.height);
            self.draw_partial_image(image, x, y, xscale, yscale, rotation, blend, alpha, 0, 0, width, height);
        }
    }

    /// Queues one image subregion for this frame. The subregion is clamped
    /// to the image; a start past either edge draws nothing.
    pub fn draw_partial_image(
        &mut self,
        image: ImageId,
        x: f64,
        y: f64,
        xscale: f64,
        yscale: f64,
        rotation: f64,
        blend: u32,
        alpha: f64,
        part_x: u32,
        part_y: u32,
        part_w: u32,
        part_h: u32,
    ) {
        let img = match self.images.get(image as usize) {
            Some(img) => *img,
            None => return,
        };
        let atlas = match self.atlases.get(img.atlas_id as usize) {
            Some(atlas) => atlas,
            None => return,
        };

        if part_x >= img.width || part_y >= img.height {
            return
        }
        let part_w = part_w.min(img.width - part_x);
        let part_h = part_h.min(img.height - part_y);

        let radians = rotation.to_radians();
        let sin_rot = radians.sin() as f32;
        let cos_rot = radians.cos() as f32;
        let dx = img.origin_x as f32 / img.width as f32;
        let dy = img.origin_y as f32 / img.height as f32;
        let window_w = self.window_width as f32;
        let window_h = self.window_height as f32;

        // One matrix for scaling and transforming the sprite: translate to
        // the origin, scale by subregion and axis flip, rotate, normalize to
        // screen space, translate to position. The order is load-bearing.
        #[rustfmt::skip]
        let to_origin: [f32; 16] = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            -dx, -dy, 0.0, 1.0,
        ];
        #[rustfmt::skip]
        let scale: [f32; 16] = [
            (part_w as f64 * xscale) as f32, 0.0, 0.0, 0.0,
            0.0, (part_h as f64 * -yscale) as f32, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        #[rustfmt::skip]
        let rotate: [f32; 16] = [
            cos_rot, sin_rot, 0.0, 0.0,
            -sin_rot, cos_rot, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        #[rustfmt::skip]
        let normalize: [f32; 16] = [
            2.0 / window_w, 0.0, 0.0, 0.0,
            0.0, 2.0 / window_h, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        #[rustfmt::skip]
        let translate: [f32; 16] = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            (x * 2.0 / f64::from(self.window_width)) as f32 - 1.0,
            -((y * 2.0 / f64::from(self.window_height)) as f32 - 1.0),
            0.0, 1.0,
        ];

        let transform =
            mat4_mult(&mat4_mult(&mat4_mult(&mat4_mult(&to_origin, &scale), &rotate), &normalize), &translate);

        let (aw, ah) = (f64::from(atlas.width), f64::from(atlas.height));
        let (atlas_xy, atlas_wh) = if !img.rotated {
            (
                [((img.x + part_x) as f64 / aw) as f32, ((img.y + part_y) as f64 / ah) as f32],
                [(f64::from(part_w) / aw) as f32, (f64::from(part_h) / ah) as f32],
            )
        } else {
            (
                [
                    ((img.x + img.height - part_y - part_h) as f64 / aw) as f32,
                    ((img.y + part_x) as f64 / ah) as f32,
                ],
                [(f64::from(part_h) / aw) as f32, (f64::from(part_w) / ah) as f32],
            )
        };

        self.commands.push(DrawCommand {
            transform,
            alpha: alpha as f32,
            blend: [
                (blend & 0xFF) as f32 / 255.0,
                (blend & 0xFF00) as f32 / 0xFF00 as f32,
                (blend & 0xFF_0000) as f32 / 0xFF_0000 as f32,
            ],
            atlas_xy,
            atlas_wh,
            rotated: img.rotated,
            image,
            atlas_id: img.atlas_id,
        });
    }

    /// Clears the screen (outside-room colour, then the room background
    /// colour) and resets the draw list for a new frame.
    pub fn start_frame(&mut self, backend: &mut dyn RenderBackend) {
        backend.clear(self.colour_outside_room);
        backend.clear(self.room_bg_colour);
        self.commands.clear();
    }

    /// Flushes the frame's draw list. Commands keep submission order but are
    /// grouped into contiguous same-atlas runs, each issued as one instanced
    /// draw with at most one texture bind.
    pub fn render_frame(&mut self, backend: &mut dyn RenderBackend) {
        let mut drawn = 0;
        while drawn < self.commands.len() {
            let atlas_id = self.commands[drawn].atlas_id;
            let run = self.commands[drawn..].iter().take_while(|cmd| cmd.atlas_id == atlas_id).count();

            if self.bound_atlas != Some(atlas_id) {
                backend.bind_texture(self.atlases[atlas_id as usize].texture);
                self.bound_atlas = Some(atlas_id);
            }
            backend.draw_batch(&self.commands[drawn..drawn + run]);
            drawn += run;
        }
    }
}

/// Packs as many of `remaining` as possible into one atlas, trying each
/// image rotated when it won't fit upright, then shrinks the bin in fixed
/// steps while everything placed still fits. Returns the placements, the
/// deferred images, and the final bin side.
fn pack_slot(
    pre_images: &[PreImage],
    packer: &mut Packer,
    remaining: &[usize],
    max_side: u32,
) -> (Vec<Placement>, Vec<usize>, u32) {
    fn try_place(packer: &mut Packer, index: usize, width: u32, height: u32) -> Option<Placement> {
        if let Some((x, y)) = packer.pack(width, height) {
            Some(Placement { index, x, y, rotated: false })
        } else if width != height {
            packer.pack(height, width).map(|(x, y)| Placement { index, x, y, rotated: true })
        } else {
            None
        }
    }

    let mut side = max_side;
    packer.reset(side, side);
    let mut placements = Vec::with_capacity(remaining.len());
    let mut deferred = Vec::new();
    for &index in remaining {
        let pre = &pre_images[index];
        match try_place(packer, index, pre.width, pre.height) {
            Some(placement) => placements.push(placement),
            None => deferred.push(index),
        }
    }

    while side > SHRINK_STEP {
        let candidate = side - SHRINK_STEP;
        packer.reset(candidate, candidate);
        let mut retry = Vec::with_capacity(placements.len());
        for placement in &placements {
            let pre = &pre_images[placement.index];
            match try_place(packer, placement.index, pre.width, pre.height) {
                Some(placement) => retry.push(placement),
                None => break,
            }
        }
        if retry.len() == placements.len() {
            side = candidate;
            placements = retry;
        } else {
            break
        }
    }

    (placements, deferred, side)
}

fn mat4_mult(lhs: &[f32; 16], rhs: &[f32; 16]) -> [f32; 16] {
    let mut out = [0.0; 16];
    for y in 0..4 {
        for x in 0..4 {
            out[y * 4 + x] = lhs[y * 4] * rhs[x]
                + lhs[y * 4 + 1] * rhs[x + 4]
                + lhs[y * 4 + 2] * rhs[x + 8]
                + lhs[y * 4 + 3] * rhs[x + 12];
        }
    }
    out
}

/// Backend that discards everything. Stands in for a real graphics backend
/// in headless runs.
pub struct NullBackend {
    max_texture_size: u32,
    next_texture: TextureId,
}

impl NullBackend {
    pub fn new(max_texture_size: u32) -> NullBackend {
        NullBackend { max_texture_size, next_texture: 0 }
    }
}

impl RenderBackend for NullBackend {
    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn open_window(&mut self, _width: u32, _height: u32, _settings: &Settings) {}

    fn upload_texture(&mut self, _width: u32, _height: u32, _rgba: &[u8]) -> TextureId {
        let texture = self.next_texture;
        self.next_texture += 1;
        texture
    }

    fn clear(&mut self, _colour: u32) {}

    fn bind_texture(&mut self, _texture: TextureId) {}

    fn draw_batch(&mut self, _commands: &[DrawCommand]) {}
}
