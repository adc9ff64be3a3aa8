#![warn(non_snake_case)]
//! # q1bake
//!
//! Generates a lit test room, runs the level build over it and writes every
//! lump to `<out>/<lump>.lmp`.

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use q1bake::bsp::{BspTables, GeneratorConfig, RoomGenerator};
use q1bake::light::OpenSky;
use q1bake::texture::{MemoryTextures, TextureSource, Wad2};
use q1bake::{build_level, BuildContext, BuildOptions, LevelInput, LightingQuality};

#[derive(Parser, Debug)]
#[command(name = "q1bake", version, about = "Bake a generated Quake 1 room into BSP lumps")]
struct Args {
    /// JSON file with build options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lighting quality, 0 (fastest) to 3 (best)
    #[arg(long)]
    quality: Option<i32>,

    /// Store lightmaps as RGB
    #[arg(long)]
    color: bool,

    /// WAD2 file to take texture data from
    #[arg(long)]
    wad: Option<PathBuf>,

    /// Seed for the room generator
    #[arg(long)]
    seed: Option<u64>,

    /// Number of point lights in the room
    #[arg(long, default_value_t = 2)]
    lights: usize,

    /// Open the ceiling to the sky and add a sun
    #[arg(long)]
    sun: bool,

    /// Output directory
    #[arg(long, default_value = "out")]
    out: PathBuf,
}

fn build_options(args: &Args) -> Result<BuildOptions, Box<dyn Error>> {
    let mut options = match &args.config {
        Some(path) => BuildOptions::load(path)?,
        None => BuildOptions::default(),
    };

    // command line wins over the config file
    if let Some(quality) = args.quality {
        options.quality = LightingQuality::try_from(quality)?;
    }
    if args.color {
        options.color_lighting = true;
    }
    if let Some(wad) = &args.wad {
        options.texture_wad = Some(wad.clone());
    }
    Ok(options)
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging.
    env_logger::init();

    let args = Args::parse();
    let options = build_options(&args)?;

    let mut textures: Box<dyn TextureSource> = match &options.texture_wad {
        Some(path) => Box::new(Wad2::open(path)?),
        None => Box::new(MemoryTextures::new()),
    };

    let mut generator = RoomGenerator::new(GeneratorConfig {
        light_count: args.lights,
        sun: args.sun,
        seed: args.seed,
        ..GeneratorConfig::default()
    });
    let level = generator.generate();
    let input = LevelInput {
        tree: level.tree,
        entities: level.entities,
        map_models: level.map_models,
    };

    let mut ctx = BuildContext::new(options);
    let mut tables = BspTables::new();
    let lumps = build_level(&mut ctx, &input, &mut tables, textures.as_mut(), &OpenSky)?;

    fs::create_dir_all(&args.out)?;
    for lump in lumps.lumps() {
        let path = args.out.join(format!("{}.lmp", lump.kind().name()));
        fs::write(&path, lump.as_bytes())?;
        info!("wrote {} ({} bytes)", path.display(), lump.len());
    }
    info!("map model light values: {:?}", lumps.model_lights);

    ctx.dispose();
    Ok(())
}
