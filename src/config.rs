//! Per-run configuration.
//!
//! A [`Profile`] carries everything that used to be a module-wide constant:
//! PDF metadata, the alt-text marker, curated lookup tables and the external
//! tool names. It is passed explicitly into every entry point so one process
//! can handle documents for different authors or courses.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::utils::error::{TexAltError, TexAltResult};

/// Environment variable naming a profile file.
pub const PROFILE_ENV: &str = "TEXALT_PROFILE";

/// Profile file picked up from the working directory when nothing else is given.
pub const DEFAULT_PROFILE_FILE: &str = "texalt.toml";

/// Hand-written descriptions for figures that recur across the course notes.
static KNOWN_FIGURES: phf::Map<&'static str, &'static str> = phf_map! {
    "redditfollowadviceuw" =>
        "Screenshot of a Reddit post advising UW students to follow course advice",
    "traystack" =>
        "Photo of a spring-loaded cafeteria tray stack, analogy for the hardware stack data structure",
    "pathfinder" =>
        "Photo of the NASA Mars Pathfinder rover, illustrating the priority inversion bug in the 1997 Mars mission",
    "rs232_serialbits" =>
        "Timing diagram of an RS-232 serial bit frame showing start bit, data bits, parity, and stop bits",
    "rs232_db25pinout" =>
        "DB-25 connector pinout diagram for RS-232 serial interface",
    "includes_multi_protos" =>
        "Diagram showing a single .h header providing function prototypes to multiple .c source files",
    "c-building" =>
        "Flowchart of the C build process: preprocessor, compiler, linker",
};

/// Figure directories and the topic their contents usually illustrate.
static FOLDER_HINTS: phf::Map<&'static str, &'static str> = phf_map! {
    "hwio_figs" => "Hardware I/O diagram",
    "usb_figs" => "USB architecture diagram",
    "sched_figs" => "Scheduler diagram",
    "intro_figs" => "Introduction diagram",
    "cprog_figs" => "C programming diagram",
    "misc_figs" => "Diagram",
    "Serial_figs" => "Serial communication diagram",
};

/// External tool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Markup renderer (LaTeX → self-contained HTML with MathML)
    pub pandoc: String,
    /// Stream-dialect converter (`.shn` → `.tex`)
    pub coursetex: String,
    /// Converter output variant used for HTML (s=slides, h=handout, n=notes, c=combined)
    pub stream_variant: String,
    /// Ask the renderer to inline CSS, fonts and images
    pub embed_resources: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            pandoc: "pandoc".to_string(),
            coursetex: "coursetex".to_string(),
            stream_variant: "n".to_string(),
            embed_resources: true,
        }
    }
}

/// Immutable configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub author: String,
    pub subject: String,
    pub keywords: String,
    /// Option passed to babel
    pub babel_language: String,
    /// BCP 47 tag for `pdflang` and the HTML `lang` metadata
    pub pdf_lang: String,
    /// Sentinel prefixed to machine-generated alt text
    pub alt_marker: String,
    /// Prefix for titles recovered from a stream file's header comment
    pub title_prefix: Option<String>,
    /// Document stem → title
    pub titles: IndexMap<String, String>,
    /// Lowercase image stem → authoritative description
    pub known_figures: IndexMap<String, String>,
    /// Image directory name → topic
    pub folder_hints: IndexMap<String, String>,
    /// Topic for image directories missing from `folder_hints`
    pub default_folder_topic: String,
    pub tools: ToolConfig,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            author: "Your Name".to_string(),
            subject: "Your Subject".to_string(),
            keywords: "keyword1, keyword2".to_string(),
            babel_language: "english".to_string(),
            pdf_lang: "en-US".to_string(),
            alt_marker: "***!!***Guess by texalt:".to_string(),
            title_prefix: None,
            titles: IndexMap::new(),
            known_figures: copy_table(&KNOWN_FIGURES),
            folder_hints: copy_table(&FOLDER_HINTS),
            default_folder_topic: "Diagram".to_string(),
            tools: ToolConfig::default(),
        }
    }
}

fn copy_table(table: &phf::Map<&'static str, &'static str>) -> IndexMap<String, String> {
    let mut entries: Vec<(&str, &str)> = table.entries().map(|(k, v)| (*k, *v)).collect();
    entries.sort();
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Profile {
    /// Parse a TOML profile; missing keys keep their defaults.
    ///
    /// Curated tables given in the file extend the built-in ones rather than
    /// replacing them.
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        let mut parsed: Profile = toml::from_str(input)?;
        let defaults = Profile::default();
        for (table, builtin) in [
            (&mut parsed.known_figures, defaults.known_figures),
            (&mut parsed.folder_hints, defaults.folder_hints),
        ] {
            for (key, value) in builtin {
                table.entry(key).or_insert(value);
            }
        }
        parsed.known_figures = parsed
            .known_figures
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Ok(parsed)
    }

    pub fn load(path: &Path) -> TexAltResult<Self> {
        let text = fs::read_to_string(path).map_err(TexAltError::io("read profile", path))?;
        Self::from_toml_str(&text).map_err(|e| TexAltError::profile(path, e.to_string()))
    }

    /// Resolve the profile for a run: explicit path, then `$TEXALT_PROFILE`,
    /// then `texalt.toml` in the working directory, then built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> TexAltResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Ok(from_env) = std::env::var(PROFILE_ENV) {
            if !from_env.trim().is_empty() {
                return Self::load(&PathBuf::from(from_env));
            }
        }
        let local = Path::new(DEFAULT_PROFILE_FILE);
        if local.is_file() {
            log::debug!("using profile {}", local.display());
            return Self::load(local);
        }
        Ok(Self::default())
    }

    /// Prefix `guess` with the review marker.
    pub fn mark(&self, guess: &str) -> String {
        format!("{} {}", self.alt_marker, guess)
    }
}
