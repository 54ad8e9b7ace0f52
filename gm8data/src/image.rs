/// Index of an image submitted to the atlas compiler. Stable from submission
/// onward; packed coordinates become available once atlases are compiled.
pub type ImageId = u32;

/// Interface to the image atlas compiler.
///
/// Sprite frames, backgrounds and font glyph maps are submitted during load,
/// before any window or texture exists. `rgba` is tightly packed
/// `width * height * 4` bytes.
pub trait ImageSink {
    fn make_image(&mut self, width: u32, height: u32, origin_x: i32, origin_y: i32, rgba: Vec<u8>) -> ImageId;
}
