//! User configuration options.

use crate::{BASE_DIR, CLIOptions};
use dirs::config_dir;
use log::{error, info, warn};
use render_soft::textures::TextureConfig;
use serde::{Deserialize, Serialize};
use std::{
    fs::{File, OpenOptions, create_dir_all},
    io::{self, Read, Write},
    path::PathBuf,
};

const LOG_TAG: &str = "UserConfig";

fn get_cfg_file() -> io::Result<PathBuf> {
    let mut dir = config_dir().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{LOG_TAG}: Couldn't open user config dir"),
        )
    })?;
    dir.push(BASE_DIR);
    if !dir.exists() {
        create_dir_all(&dir)?;
    }
    dir.push("user.toml");
    Ok(dir)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    pub iwad: String,
    /// Where `--wall-test` writes its image
    pub output: String,
    pub textures: TextureConfig,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            iwad: String::new(),
            output: "wall.ppm".to_owned(),
            textures: TextureConfig::default(),
        }
    }
}

impl UserConfig {
    /// Read the config file, creating a default one if it is empty or can't
    /// be parsed
    pub fn load() -> io::Result<Self> {
        let path = get_cfg_file()?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        let mut buf = String::new();
        if file.read_to_string(&mut buf)? > 0 {
            match toml::from_str(&buf) {
                Ok(data) => {
                    info!(target: LOG_TAG, "Loaded user config file");
                    return Ok(data);
                }
                Err(err) => warn!("Could not deserialise {path:?} recreating config: {err}"),
            }
        }
        UserConfig::create_default(&path)
    }

    fn create_default(path: &PathBuf) -> io::Result<Self> {
        let config = UserConfig::default();
        let mut file = File::create(path)?;
        file.write_all(config.to_toml().as_bytes())?;
        info!("Saved default user config to {path:?}");
        Ok(config)
    }

    fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|err| {
            error!("Could not serialise config: {err}");
            String::new()
        })
    }

    pub fn write(&self) {
        let result = get_cfg_file()
            .and_then(File::create)
            .and_then(|mut file| file.write_all(self.to_toml().as_bytes()));
        if let Err(err) = result {
            error!("Could not write config: {err}");
        }
    }

    /// Sync the CLI options and UserOptions with each other
    pub fn sync_cli(&mut self, cli: &mut CLIOptions) {
        info!("Checking CLI options");

        if !cli.iwad.is_empty() && cli.iwad != self.iwad {
            cli.iwad.clone_into(&mut self.iwad);
            info!("IWAD changed to: {}", &cli.iwad);
        } else {
            self.iwad.clone_into(&mut cli.iwad);
        }

        match cli.output.clone() {
            Some(output) => self.output = output,
            None => cli.output = Some(self.output.clone()),
        }

        if let Some(f) = cli.dev_parm {
            self.textures.dev_parm = f;
        } else {
            cli.dev_parm = Some(self.textures.dev_parm);
        }

        if let Some(f) = cli.brightmaps {
            self.textures.brightmaps = f;
        } else {
            cli.brightmaps = Some(self.textures.brightmaps);
        }

        if let Some(mission) = cli.mission {
            self.textures.mission = mission;
        } else {
            cli.mission = Some(self.textures.mission);
        }
    }
}
