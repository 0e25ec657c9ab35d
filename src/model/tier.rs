use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Achievement tiers; the derived ordering is the canonical strength order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub fn all() -> [Tier; 4] {
        [Tier::Bronze, Tier::Silver, Tier::Gold, Tier::Platinum]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Tier::Bronze => "\u{1f949}",
            Tier::Silver => "\u{1f948}",
            Tier::Gold => "\u{1f947}",
            Tier::Platinum => "\u{1f3c6}",
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}
