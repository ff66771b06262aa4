use serde::{Deserialize, Serialize};

use crate::scoring::SeasonConfig;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub season: Option<SeasonConfig>,
    /// Force colored output on or off; auto-detected from the terminal when unset
    #[serde(default)]
    pub colors: Option<bool>,
}

impl Config {
    /// Season settings, falling back to the built-in defaults.
    pub fn effective_season(&self) -> SeasonConfig {
        self.season.clone().unwrap_or_default()
    }
}
