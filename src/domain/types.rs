//! Domain value types
//!
//! `Meter` is a closed enum over the metered resources. `Period` is a plain
//! `String` of form `YYYY-MM`, ordered lexicographically.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A metered resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Meter {
    ApiCalls,
    StorageMb,
}

impl Meter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Meter::ApiCalls => "api_calls",
            Meter::StorageMb => "storage_mb",
        }
    }
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Meter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api_calls" => Ok(Meter::ApiCalls),
            "storage_mb" => Ok(Meter::StorageMb),
            other => Err(format!("unknown meter: {other}")),
        }
    }
}
