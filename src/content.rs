use anyhow::Context;
use config::{Environment, File, FileFormat};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

static DEFAULT_CONTENT: &str = include_str!("../content.toml");

/// Everything the page says, loaded once at start up.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct WeddingContent {
    pub meta: Meta,
    pub main: Main,
    pub intro: Intro,
    pub date: WeddingDate,
    pub venue: Venue,
    pub gallery: Gallery,
    pub invitation: Invitation,
    pub rsvp: Rsvp,
    pub slack: Slack,
    pub map: Map,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Meta {
    pub title: String,
    pub description: String,
    pub og_image: String,
    pub no_index: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Main {
    pub title: String,
    /// Hero image used when the manifest has nothing to offer.
    pub image: String,
    pub date: String,
    pub venue: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Intro {
    pub title: String,
    pub text: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct WeddingDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub display_date: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Venue {
    pub name: String,
    pub address: String,
    pub tel: String,
    pub place_id: String,
    pub map_zoom: String,
    pub parking: String,
    pub coordinates: Coordinates,
    pub transportation: Transportation,
    pub groom_shuttle: Option<Shuttle>,
    pub bride_shuttle: Option<Shuttle>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Transportation {
    pub subway: String,
    pub bus: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Shuttle {
    pub location: String,
    pub departure_time: String,
    pub contact_name: String,
    pub contact_tel: String,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GalleryLayout {
    Scroll,
    Grid,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GalleryPosition {
    Middle,
    Bottom,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Gallery {
    pub layout: GalleryLayout,
    pub position: GalleryPosition,
    pub max_display: usize,
    /// Served as-is when neither the manifest nor the directory can be read.
    pub images: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Invitation {
    pub message: String,
    pub groom: Family,
    pub bride: Family,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Family {
    pub name: String,
    pub label: String,
    pub father: String,
    pub mother: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Rsvp {
    pub enabled: bool,
    pub show_meal_option: bool,
    pub max_guests: u32,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Slack {
    pub webhook_url: String,
    pub channel: String,
    pub compact_message: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Map {
    pub amap_key: String,
    pub amap_security_code: String,
}

impl WeddingContent {
    /// Built-in defaults, then `path` if it exists, then `WEDDING__*` variables.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!("Loading wedding content from {:?}", path);
        } else {
            debug!("No content file at {:?}, using defaults", path);
        }

        config::Config::builder()
            .add_source(File::from_str(DEFAULT_CONTENT, FileFormat::Toml))
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("WEDDING")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| format!("Invalid wedding content in {:?}", path))
    }

    pub fn defaults() -> anyhow::Result<Self> {
        Ok(toml::from_str(DEFAULT_CONTENT)?)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Family {
    fn has_father(&self) -> bool {
        !self.father.trim().is_empty()
    }

    fn has_mother(&self) -> bool {
        !self.mother.trim().is_empty()
    }

    /// "father · mother", or whichever of the two is set.
    pub fn parents_text(&self) -> String {
        match (self.has_father(), self.has_mother()) {
            (true, true) => format!("{} · {}", self.father, self.mother),
            (true, false) => self.father.clone(),
            (false, true) => self.mother.clone(),
            (false, false) => String::new(),
        }
    }

    pub fn relation_label(&self) -> &str {
        match self.label.as_str() {
            "아들" => "Son",
            "딸" => "Daughter",
            "신랑" => "Groom",
            "신부" => "Bride",
            other => other,
        }
    }
}

impl Map {
    pub fn is_configured(&self) -> bool {
        !self.amap_key.is_empty() && !self.amap_security_code.is_empty()
    }
}
