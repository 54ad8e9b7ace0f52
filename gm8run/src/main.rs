mod atlas;
mod game;
mod render;

use game::Game;
use log::debug;
use render::NullBackend;
use std::{fs, path::PathBuf, process};

#[derive(argh::FromArgs)]
/// Loads a GameMaker 8 or 8.1 game executable, decodes its asset database
/// and compiles its texture atlases.
struct Config {
    /// enable various data integrity checks
    #[argh(switch, short = 's')]
    strict: bool,

    /// enable verbose logging. -v -v is more verbose.
    #[argh(switch, short = 'v')]
    verbose: u8,

    /// maximum texture dimension of the simulated graphics backend
    #[argh(option, short = 'm', default = "8192")]
    max_texture_size: u32,

    /// the game executable to load
    #[argh(positional)]
    input: PathBuf,
}

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;

fn main() {
    process::exit(xmain());
}

fn xmain() -> i32 {
    let args: Config = argh::from_env();

    {
        let level = match args.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        env_logger::Builder::new().filter_level(level).init();
    }

    let file = match fs::read(&args.input) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("failed to open '{}': {}", args.input.display(), err);
            return EXIT_FAILURE
        },
    };

    debug!("loading '{}'...", args.input.display());

    let mut game = match Game::launch(file, args.strict, NullBackend::new(args.max_texture_size)) {
        Ok(game) => game,
        Err(err) => {
            eprintln!("failed to load '{}' - {}", args.input.display(), err);
            return EXIT_FAILURE
        },
    };

    if let Err(err) = game.start() {
        eprintln!("failed to start '{}' - {}", args.input.display(), err);
        return EXIT_FAILURE
    }

    let assets = &game.assets;
    println!(
        "loaded '{}' (game id {}): {} sprites, {} backgrounds, {} fonts packed into {} atlas(es); \
         {} sounds, {} paths, {} scripts, {} timelines, {} objects, {} rooms, {} triggers, \
         {} extensions, {} included files; {} code blobs registered",
        args.input.display(),
        assets.game_id,
        assets.sprites.len(),
        assets.backgrounds.len(),
        assets.fonts.len(),
        game.renderer.atlas_count(),
        assets.sounds.len(),
        assets.paths.len(),
        assets.scripts.len(),
        assets.timelines.len(),
        assets.objects.len(),
        assets.rooms.len(),
        assets.triggers.len(),
        assets.extensions.len(),
        assets.included_files.len(),
        game.code.len(),
    );

    EXIT_SUCCESS
}
