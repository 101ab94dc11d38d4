use argh::FromArgs;
use render_soft::textures::Mission;

/// Build, check and inspect Doom wall texture composites
#[derive(Debug, Clone, FromArgs)]
pub struct CLIOptions {
    /// verbose level: off, error, warn, info, debug
    #[argh(option)]
    pub verbose: Option<log::LevelFilter>,
    /// path to the IWAD
    #[argh(option, default = "Default::default()")]
    pub iwad: String,
    /// developer mode. Every bad column of every texture is reported
    #[argh(option)]
    pub dev_parm: Option<bool>,
    /// full bright pixels on light sources
    #[argh(option)]
    pub brightmaps: Option<bool>,
    /// game mission for brightmap selection <doom, doom2, tnt, plutonia>
    #[argh(option)]
    pub mission: Option<Mission>,
    /// print the definition and column layout of one texture
    #[argh(option)]
    pub texture: Option<String>,
    /// build and verify every composite texture
    #[argh(switch)]
    pub check_all: bool,
    /// render a wall of this texture, seen straight on
    #[argh(option)]
    pub wall_test: Option<String>,
    /// image written by the wall test
    #[argh(option)]
    pub output: Option<String>,
}
