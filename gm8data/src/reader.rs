use crate::{
    asset::{
        Background, Constant, Extension, Font, IncludeFile, Object, Path, Room, Script, Sound, Sprite, Timeline,
        Trigger,
    },
    code::CodeRegistry,
    gamedata::{self, gm80},
    image::ImageSink,
    settings::{GameHelpDialog, Settings},
    stream::{ReadPasExt, SkipExt},
    zlib::BlockReader,
    AssetList, AssetStore, Error,
};
use byteorder::{ReadBytesExt, LE};
use log::debug;
use std::io::{self, Seek, SeekFrom};

/// Minimum byte count for a file to plausibly be a Windows executable.
const MIN_EXE_LEN: usize = 0x1B;

/// Decodes a GM8.0/8.1 game executable into an asset store.
///
/// The buffer is decrypted in place and discarded by the caller afterwards;
/// nothing in the returned store borrows it. Code blobs go to `code`, pixel
/// buffers to `images`; both happen during the single sequential pass, and
/// every registered blob is compiled before this returns. Any failure aborts
/// the whole load — the store is never partially returned.
pub fn from_exe<I>(
    mut exe: I,
    strict: bool,
    code: &mut dyn CodeRegistry,
    images: &mut dyn ImageSink,
) -> Result<AssetStore, Error>
where
    I: AsRef<[u8]> + AsMut<[u8]>,
{
    let exe = exe.as_mut();

    // Verify the executable header. Windows EXEs must start with "MZ".
    if exe.len() < MIN_EXE_LEN || &exe[0..2] != b"MZ" {
        return Err(Error::InvalidExeHeader)
    }

    let mut exe = io::Cursor::new(exe);

    // Identify the game version; this also strips the 8.1 stream cipher.
    let game_ver = gamedata::find(&mut exe)?;

    let mut block = BlockReader::new();

    // little helper thing
    macro_rules! assert_ver {
        ($name: literal, $expect: expr, $ver: expr) => {{
            let expected = $expect;
            let got = $ver;
            if strict && got != expected {
                Err(Error::VersionError { expected, got })
            } else {
                Ok(())
            }
        }};
    }

    // Game Settings
    exe.seek(SeekFrom::Current(4))?; // settings version
    debug!("Reading settings chunk...");
    let settings = {
        let chunk = block.inflate(&mut exe)?.to_vec();
        Settings::read(&chunk, game_ver)?
    };

    // Embedded DirectX DLL - not something we need, so skip over it
    let dllname = exe.read_pas_string()?;
    debug!("Skipping embedded DLL '{}'", dllname);
    exe.skip_blob()?;

    // The rest of the asset paragraphs are substitution-ciphered.
    gm80::decrypt(&mut exe)?;

    // Garbage field - random dwords
    let garbage_dwords = exe.read_u32::<LE>()?;
    exe.seek(SeekFrom::Current(i64::from(garbage_dwords) * 4))?;
    debug!("Skipped {} garbage DWORDs", garbage_dwords);

    // Pro flag, game ID
    let pro_flag = exe.read_u32::<LE>()? != 0;
    let game_id = exe.read_u32::<LE>()?;
    debug!("Pro flag: {}", pro_flag);
    debug!("Game ID: {}", game_id);

    // 16 random bytes...
    let guid = [exe.read_u32::<LE>()?, exe.read_u32::<LE>()?, exe.read_u32::<LE>()?, exe.read_u32::<LE>()?];

    // Extensions
    assert_ver!("extensions header", 700, exe.read_u32::<LE>()?)?;
    let extension_count = exe.read_u32::<LE>()? as usize;
    let mut extensions = Vec::with_capacity(extension_count.min(0x1000));
    for _ in 0..extension_count {
        let ext = Extension::read(&mut exe, &mut block)?;
        debug!("+ Added extension '{}' (files: {})", ext.name, ext.files.len());
        extensions.push(ext);
    }

    // Rewrap data immutable - nothing past this point is ciphered.
    let prev_pos = exe.position();
    let mut exe = io::Cursor::new(exe.into_inner() as &[u8]);
    exe.set_position(prev_pos);

    // Triggers
    assert_ver!("triggers header", 800, exe.read_u32::<LE>()?)?;
    let triggers: AssetList<Trigger> = get_assets(&mut exe, &mut block, |data| Trigger::read(data, code))?;
    triggers.iter().flatten().for_each(|trigger| {
        debug!(" + Added trigger '{}' (moment: {})", trigger.name, trigger.check_moment);
    });

    // Constants
    assert_ver!("constants header", 800, exe.read_u32::<LE>()?)?;
    let constant_count = exe.read_u32::<LE>()? as usize;
    let mut constants = Vec::with_capacity(constant_count.min(0x10000));
    for _ in 0..constant_count {
        let name = exe.read_pas_string()?;
        let expression = exe.read_pas_string()?;
        debug!(" + Added constant '{}' (expression: {})", name, expression);
        constants.push(Constant { name, expression });
    }

    // Sounds
    assert_ver!("sounds header", 800, exe.read_u32::<LE>()?)?;
    let sounds: AssetList<Sound> = get_assets(&mut exe, &mut block, Sound::read)?;
    sounds.iter().flatten().for_each(|sound| {
        debug!(" + Added sound '{}' ({})", sound.name, sound.file_name);
    });

    // Sprites
    assert_ver!("sprites header", 800, exe.read_u32::<LE>()?)?;
    let sprites: AssetList<Sprite> = get_assets(&mut exe, &mut block, |data| Sprite::read(data, images))?;
    sprites.iter().flatten().for_each(|sprite| {
        let framecount = sprite.frames.len();
        debug!(
            " + Added sprite '{}' ({}x{}, {} frame{})",
            sprite.name,
            sprite.width,
            sprite.height,
            framecount,
            if framecount > 1 { "s" } else { "" }
        );
    });

    // Backgrounds
    assert_ver!("backgrounds header", 800, exe.read_u32::<LE>()?)?;
    let backgrounds: AssetList<Background> = get_assets(&mut exe, &mut block, |data| Background::read(data, images))?;
    backgrounds.iter().flatten().for_each(|background| {
        debug!(" + Added background '{}' ({}x{})", background.name, background.width, background.height);
    });

    // Paths
    assert_ver!("paths header", 800, exe.read_u32::<LE>()?)?;
    let paths: AssetList<Path> = get_assets(&mut exe, &mut block, Path::read)?;
    paths.iter().flatten().for_each(|path| {
        debug!(
            " + Added path '{}' ({}, {} point{}, precision: {})",
            path.name,
            if path.closed { "closed" } else { "open" },
            path.points.len(),
            if path.points.len() > 1 { "s" } else { "" },
            path.precision
        );
    });

    // Scripts
    assert_ver!("scripts header", 800, exe.read_u32::<LE>()?)?;
    let scripts: AssetList<Script> = get_assets(&mut exe, &mut block, |data| Script::read(data, code))?;
    scripts.iter().flatten().for_each(|script| {
        debug!(" + Added script '{}'", script.name);
    });

    // Fonts
    assert_ver!("fonts header", 800, exe.read_u32::<LE>()?)?;
    let fonts: AssetList<Font> = get_assets(&mut exe, &mut block, |data| Font::read(data, game_ver, images))?;
    fonts.iter().flatten().for_each(|font| {
        debug!(
            " + Added font '{}' ({}, {}px{}{})",
            font.name,
            font.sys_name,
            font.size,
            if font.bold { ", bold" } else { "" },
            if font.italic { ", italic" } else { "" }
        );
    });

    // Timelines
    assert_ver!("timelines header", 800, exe.read_u32::<LE>()?)?;
    let timelines: AssetList<Timeline> = get_assets(&mut exe, &mut block, |data| Timeline::read(data, code))?;
    timelines.iter().flatten().for_each(|timeline| {
        debug!(" + Added timeline '{}' (moments: {})", timeline.name, timeline.moments.len());
    });

    // Objects
    assert_ver!("objects header", 800, exe.read_u32::<LE>()?)?;
    let objects: AssetList<Object> = get_assets(&mut exe, &mut block, |data| Object::read(data, code))?;
    objects.iter().flatten().for_each(|object| {
        debug!(
            " + Added object {} ({}{}{}depth {})",
            object.name,
            if object.solid { "solid; " } else { "" },
            if object.visible { "visible; " } else { "" },
            if object.persistent { "persistent; " } else { "" },
            object.depth,
        );
    });

    // Rooms
    assert_ver!("rooms header", 800, exe.read_u32::<LE>()?)?;
    let rooms: AssetList<Room> = get_assets(&mut exe, &mut block, |data| Room::read(data, code))?;
    rooms.iter().flatten().for_each(|room| {
        debug!(
            " + Added room '{}' ({}x{}, {}FPS{})",
            room.name,
            room.width,
            room.height,
            room.speed,
            if room.persistent { ", persistent" } else { "" },
        );
    });

    // Last instance and tile IDs placed in the room editor
    let last_instance_id = exe.read_u32::<LE>()?;
    let last_tile_id = exe.read_u32::<LE>()?;

    // Included Files
    assert_ver!("included files header", 800, exe.read_u32::<LE>()?)?;
    let included_files: AssetList<IncludeFile> = get_assets(&mut exe, &mut block, IncludeFile::read)?;
    included_files.iter().flatten().for_each(|file| {
        debug!(" + Added included file '{}' (size: {})", file.file_name, file.original_size);
    });

    // Help Dialog
    assert_ver!("help dialog", 800, exe.read_u32::<LE>()?)?;
    let help_dialog = {
        let chunk = block.inflate(&mut exe)?;
        let hdg = GameHelpDialog::read(chunk)?;
        debug!(" + Help dialog caption: '{}'", hdg.caption);
        hdg
    };

    // Action library initialization code. Nothing we need from these.
    assert_ver!("action library initialization code header", 500, exe.read_u32::<LE>()?)?;
    let str_count = exe.read_u32::<LE>()? as usize;
    for _ in 0..str_count {
        exe.skip_blob()?;
    }
    debug!("Skipped {} action library initialization strings", str_count);

    // Room Order
    assert_ver!("room order lookup", 700, exe.read_u32::<LE>()?)?;
    let room_order = {
        let ro_count = exe.read_u32::<LE>()? as usize;
        let mut room_order = Vec::with_capacity(ro_count.min(0x10000));
        for _ in 0..ro_count {
            room_order.push(exe.read_u32::<LE>()?);
        }
        debug!(" + Added room order LUT: {:?}", room_order);
        room_order
    };

    let mut store = AssetStore {
        extensions,
        triggers,
        constants,
        sounds,
        sprites,
        backgrounds,
        paths,
        scripts,
        fonts,
        timelines,
        objects,
        rooms,
        included_files,
        version: game_ver,
        settings,
        help_dialog,
        game_id,
        guid,
        last_instance_id,
        last_tile_id,
        room_order,
    };

    compile(&mut store, code)?;

    Ok(store)
}

/// Reads one per-record-compressed asset section. A record whose first dword
/// is zero is tombstoned: it stays `None` but holds its ID slot.
fn get_assets<T, F>(src: &mut io::Cursor<&[u8]>, block: &mut BlockReader, mut read: F) -> Result<AssetList<T>, Error>
where
    F: FnMut(&mut io::Cursor<&[u8]>) -> Result<T, Error>,
{
    let count = src.read_u32::<LE>()? as usize;
    let mut assets = Vec::with_capacity(count.min(0x10000));
    for _ in 0..count {
        let chunk = block.inflate(src)?;
        let mut data = io::Cursor::new(chunk);
        if data.read_u32::<LE>()? == 0 {
            assets.push(None);
        } else {
            assets.push(Some(Box::new(read(&mut data)?)));
        }
    }
    Ok(assets)
}

/// The post-load pass: resolve object identities, then compile every
/// registered blob. A single compile failure fails the whole load.
fn compile(store: &mut AssetStore, code: &mut dyn CodeRegistry) -> Result<(), Error> {
    debug!("Resolving object identities...");
    store.compile_object_identities();

    debug!("Compiling scripts...");
    for script in store.scripts.iter().flatten() {
        code.compile(script.source).map_err(Error::Compile)?;
    }

    debug!("Compiling timelines...");
    for timeline in store.timelines.iter().flatten() {
        for actions in timeline.moments.values() {
            for action in actions {
                action.compile(code)?;
            }
        }
    }

    debug!("Compiling object events...");
    for object in store.objects.iter().flatten() {
        for event in &object.events {
            for actions in event.values() {
                for action in actions {
                    action.compile(code)?;
                }
            }
        }
    }

    debug!("Compiling triggers...");
    for trigger in store.triggers.iter().flatten() {
        code.compile(trigger.condition).map_err(Error::Compile)?;
    }

    debug!("Compiling room creation code...");
    for room in store.rooms.iter().flatten() {
        code.compile(room.creation_code).map_err(Error::Compile)?;
        for instance in &room.instances {
            code.compile(instance.creation_code).map_err(Error::Compile)?;
        }
    }

    Ok(())
}
