#![doc = include_str!("../../README.md")]

mod cli;
mod config;
mod report;
mod wall_test;

use cli::*;
use simplelog::TermLogger;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::config::UserConfig;
use crate::wall_test::{Framebuffer, Shading, TEST_HEIGHT, TEST_WIDTH, WallCanvas};
use log::{error, info};
use render_soft::TextureData;
use render_soft::textures::TextureError;
use wad::WadData;

const BASE_DIR: &str = "wallcache/";

fn main() -> Result<(), Box<dyn Error>> {
    let mut options: CLIOptions = argh::from_env();

    TermLogger::init(
        options.verbose.unwrap_or(log::LevelFilter::Info),
        simplelog::ConfigBuilder::default()
            .set_time_level(log::LevelFilter::Trace)
            .build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let mut user_config = UserConfig::load()?;
    user_config.sync_cli(&mut options);
    user_config.write();

    if options.iwad.is_empty() {
        error!("No IWAD given, use --iwad <path>");
        return Err("no IWAD".into());
    }
    let wad_path: PathBuf = options.iwad.clone().into();
    let wad = WadData::new(&wad_path)?;
    let mut textures = TextureData::from_wad(&wad, user_config.textures.clone())?;
    info!(
        "Loaded {} textures from {}",
        textures.catalog().len(),
        wad_path.display()
    );

    if let Some(name) = &options.texture {
        let tex = find_texture(&textures, name)?;
        let mut stdout = io::stdout().lock();
        report::describe_texture(&textures, tex, &mut stdout)?;
        textures.precache(&[tex]);
        let faults = report::verify_composite(&textures, tex);
        for fault in &faults {
            writeln!(stdout, "{fault}")?;
        }
        writeln!(stdout, "{} faulty columns", faults.len())?;
    }

    if options.check_all {
        let summary = report::check_all(&mut textures);
        let mut stdout = io::stdout().lock();
        for (name, fault) in &summary.faults {
            writeln!(stdout, "{name}: {fault}")?;
        }
        for name in &summary.unstable {
            writeln!(stdout, "{name}: rebuilt composite differs")?;
        }
        writeln!(
            stdout,
            "{} textures, {} composite, {} resident bytes",
            summary.textures, summary.composites, summary.resident_bytes
        )?;
        if !summary.is_clean() {
            let failed = summary.faults.len() + summary.unstable.len();
            return Err(format!("{failed} composite checks failed").into());
        }
    }

    if let Some(name) = &options.wall_test {
        let tex = find_texture(&textures, name)?;
        let shading = Shading::from_wad(&wad)?;
        let mut buffer = Framebuffer::new(TEST_WIDTH, TEST_HEIGHT);
        let mut canvas = WallCanvas {
            buffer: &mut buffer,
            shading: &shading,
            columns: 0,
        };
        wall_test::render_wall(&mut textures, tex, &mut canvas);

        let output = options.output.as_deref().unwrap_or(&user_config.output);
        let mut file = BufWriter::new(File::create(output)?);
        wall_test::write_ppm(&buffer, &mut file)?;
        file.flush()?;
        info!("Wrote {output}");
    }

    #[cfg(feature = "hprof")]
    coarse_prof::write(&mut std::io::stdout())?;
    Ok(())
}

fn find_texture(textures: &TextureData, name: &str) -> Result<usize, TextureError> {
    textures
        .catalog()
        .lookup(name)
        .ok_or_else(|| TextureError::NotFound(name.to_owned()))
}
