use std::path::PathBuf;

use clap::Parser;
use directories::ProjectDirs;
use treeshop_provider_osm::{NOMINATIM_URL, OSRM_URL};

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Parser)]
#[command(name = "treeshop", version, about = "Price land-clearing jobs from the terminal")]
pub(crate) struct Cli {
    /// Settings file holding rates and the business profile
    #[arg(long, env = "TREESHOP_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Nominatim base URL used for geocoding
    #[arg(long, env = "TREESHOP_GEOCODER_URL", default_value = NOMINATIM_URL)]
    pub geocoder_url: String,

    /// OSRM base URL used for driving routes
    #[arg(long, env = "TREESHOP_ROUTER_URL", default_value = OSRM_URL)]
    pub router_url: String,

    /// Country codes geocoding is limited to (comma separated, empty for none)
    #[arg(long, env = "TREESHOP_COUNTRY", default_value = "us")]
    pub country: String,

    /// Give up on a transport estimate after this many seconds
    #[arg(long, env = "TREESHOP_ESTIMATE_TIMEOUT_SECS", default_value_t = 30)]
    pub estimate_timeout_secs: u64,

    /// Write logs to this file (the terminal is owned by the UI)
    #[arg(long, env = "TREESHOP_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Explicit settings path, else the platform config directory, else the working directory.
    pub(crate) fn settings_path(&self) -> PathBuf {
        if let Some(path) = &self.settings {
            return path.clone();
        }
        ProjectDirs::from("com", "TreeShop", "TreeShop").map_or_else(
            || PathBuf::from(SETTINGS_FILE),
            |dirs| dirs.config_dir().join(SETTINGS_FILE),
        )
    }
}
