//! Which wall textures get a brightmap, keyed by texture name and filtered by
//! game mission.

use render_trait::Brightmap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mission {
    #[default]
    Doom,
    Doom2,
    PackTnt,
    PackPlut,
}

impl std::str::FromStr for Mission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "doom" | "doom1" => Ok(Mission::Doom),
            "doom2" => Ok(Mission::Doom2),
            "tnt" | "pack_tnt" => Ok(Mission::PackTnt),
            "plutonia" | "pack_plut" => Ok(Mission::PackPlut),
            _ => Err(format!("Unknown mission: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrightmapDef {
    /// Entry only applies to this mission
    pub only_for: Option<Mission>,
    /// Entry never applies to this mission
    pub not_for: Option<Mission>,
    pub texture: String,
    pub brightmap: Brightmap,
}

impl BrightmapDef {
    fn applies_to(&self, mission: Mission) -> bool {
        !(self.only_for.is_some_and(|m| m != mission) || self.not_for == Some(mission))
    }
}

/// Ordered table, the first entry matching both name and mission wins
#[derive(Debug, Clone)]
pub struct BrightmapTable {
    defs: Vec<BrightmapDef>,
}

impl BrightmapTable {
    pub fn new(defs: Vec<BrightmapDef>) -> Self {
        Self { defs }
    }

    pub fn find(&self, texture: &str, mission: Mission) -> Option<Brightmap> {
        self.defs
            .iter()
            .filter(|d| d.applies_to(mission))
            .find(|d| d.texture.eq_ignore_ascii_case(texture))
            .map(|d| d.brightmap)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl Default for BrightmapTable {
    fn default() -> Self {
        Self::new(
            LEGACY_TABLE
                .iter()
                .map(|&(only_for, not_for, texture, brightmap)| BrightmapDef {
                    only_for,
                    not_for,
                    texture: texture.to_owned(),
                    brightmap,
                })
                .collect(),
        )
    }
}

#[rustfmt::skip]
const LEGACY_TABLE: &[(Option<Mission>, Option<Mission>, &str, Brightmap)] = &[
    (Some(Mission::Doom), None, "SW2STON2", Brightmap::RedOnlyDoom1),
    (None, Some(Mission::Doom), "SW1BRN1", Brightmap::RedOnlyDoom2),
    (None, Some(Mission::Doom), "SW1STARG", Brightmap::RedOnlyDoom2),
    (None, Some(Mission::Doom), "SW1STON2", Brightmap::RedOnlyDoom2),
    (None, Some(Mission::Doom), "SW2MARB", Brightmap::RedOnlyDoom2),
    (None, Some(Mission::Doom), "SW2STON2", Brightmap::GreenOnly1Doom2),
    (None, Some(Mission::Doom), "SW2STARG", Brightmap::GreenOnly1Doom2),
    (None, None, "SW1BRCOM", Brightmap::RedOnly),
    (None, None, "SW1DIRT", Brightmap::RedOnly),
    (None, None, "SW1STRTN", Brightmap::RedOnly),
    (None, None, "SW2COMP", Brightmap::RedOnly),
    (None, None, "SW2PANEL", Brightmap::RedOnly),
    (None, None, "SW2SLAD", Brightmap::RedOnly),
    (None, None, "SW2WOOD", Brightmap::RedOnly),
    (None, None, "WOOD4", Brightmap::RedOnly),
    (None, None, "WOODSKUL", Brightmap::RedOnly),
    (None, None, "SLADSKUL", Brightmap::RedOnly),
    (None, None, "SW1BRIK", Brightmap::RedOnly),
    (None, None, "SW1COMM", Brightmap::RedOnly),
    (None, None, "SW1MET2", Brightmap::RedOnly),
    (None, None, "SW1STON1", Brightmap::RedOnly),
    (None, None, "SW1STONE", Brightmap::RedOnly),
    (None, None, "SW2BLUE", Brightmap::RedOnly),
    (None, None, "SW2GSTON", Brightmap::RedOnly),
    (None, None, "SW2ROCK", Brightmap::RedOnly),
    (None, None, "SW2STON6", Brightmap::RedOnly),
    (None, None, "SW2ZIM", Brightmap::RedOnly),
    (None, None, "WOODGARG", Brightmap::RedOnly),
    (None, None, "PNK4EXIT", Brightmap::RedOnly),
    (None, None, "LITERED2", Brightmap::RedOnly),
    (None, None, "COMPSTA2", Brightmap::NotGray),
    (None, None, "EXITSIGN", Brightmap::NotGray),
    (None, None, "PLANET1", Brightmap::NotGray),
    (None, None, "SW2EXIT", Brightmap::NotGray),
    (None, None, "SW2GRAY1", Brightmap::NotGray),
    (None, None, "COMPSTA1", Brightmap::NotGray),
    (None, None, "EXITSTON", Brightmap::NotGray),
    (None, None, "SILVER2", Brightmap::NotGray),
    (None, None, "LITEBLU1", Brightmap::NotGray),
    (None, None, "SW2GRAY", Brightmap::NotGray),
    (None, None, "LITEBLU2", Brightmap::NotGray),
    (None, None, "COMP2", Brightmap::NotGrayOrBrown),
    (None, None, "COMPUTE2", Brightmap::NotGrayOrBrown),
    (None, None, "SILVER3", Brightmap::NotGrayOrBrown),
    (None, None, "COMPUTE1", Brightmap::NotGrayOrBrown),
    (None, None, "COMPUTE3", Brightmap::NotGrayOrBrown),
    (None, None, "SW2MOD1", Brightmap::NotGrayOrBrown),
    (None, None, "BTNTMETL", Brightmap::NotGrayOrBrown),
    (None, Some(Mission::Doom), "SLAD2", Brightmap::NotGrayOrBrown),
    (None, Some(Mission::Doom), "SLAD3", Brightmap::NotGrayOrBrown),
    (None, Some(Mission::Doom), "SLAD4", Brightmap::NotGrayOrBrown),
    (None, Some(Mission::Doom), "SLAD5", Brightmap::NotGrayOrBrown),
    (None, Some(Mission::Doom), "SLAD6", Brightmap::NotGrayOrBrown),
    (None, Some(Mission::Doom), "SLAD7", Brightmap::NotGrayOrBrown),
    (None, Some(Mission::Doom), "SLAD8", Brightmap::NotGrayOrBrown),
    (None, Some(Mission::Doom), "SLAD9", Brightmap::NotGrayOrBrown),
    (None, Some(Mission::Doom), "SLAD10", Brightmap::NotGrayOrBrown),
    (None, Some(Mission::Doom), "SLAD11", Brightmap::NotGrayOrBrown),
    (None, Some(Mission::Doom), "SLAD12", Brightmap::NotGrayOrBrown),
    (None, Some(Mission::Doom), "SLADRIP1", Brightmap::NotGrayOrBrown),
    (None, Some(Mission::Doom), "SLADRIP3", Brightmap::NotGrayOrBrown),
    (None, None, "BTNTSLVR", Brightmap::NotGrayOrBrown),
    (None, None, "SW2BRN1", Brightmap::GreenOnly1),
    (None, None, "SW2BRCOM", Brightmap::GreenOnly1),
    (None, None, "SW2STON1", Brightmap::GreenOnly1),
    (None, None, "SW2STONE", Brightmap::GreenOnly1),
    (None, None, "SW2TEK", Brightmap::GreenOnly1),
    (None, None, "SW2BRIK", Brightmap::GreenOnly1),
    (None, None, "SW2BRN2", Brightmap::GreenOnly1),
    (None, None, "SW2COMM", Brightmap::GreenOnly1),
    (None, None, "SW2DIRT", Brightmap::GreenOnly1),
    (None, None, "SW2MET2", Brightmap::GreenOnly1),
    (None, None, "SW2STRTN", Brightmap::GreenOnly1),
    (None, None, "SW2VINE", Brightmap::GreenOnly1),
    (None, None, "PIPEWAL1", Brightmap::GreenOnly1),
    (None, None, "TEKLITE2", Brightmap::GreenOnly1),
    (None, None, "M_TEC", Brightmap::GreenOnly2),
    (None, None, "SW2BRNGN", Brightmap::GreenOnly2),
    (None, None, "SW2METAL", Brightmap::GreenOnly3),
    (None, None, "LITEYEL2", Brightmap::OrangeYellow),
    (None, None, "LITEYEL3", Brightmap::OrangeYellow),
    (None, None, "YELMETAL", Brightmap::OrangeYellow),
];
