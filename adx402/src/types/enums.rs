use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Adx402Error;

/// Role assigned to a wallet by the backend after verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Brand,
    Publisher,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Brand => write!(f, "brand"),
            Role::Publisher => write!(f, "publisher"),
        }
    }
}

/// Ad slot / creative aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16x9")]
    Wide,
    #[serde(rename = "1x1")]
    Square,
    #[serde(rename = "5x6")]
    Portrait,
    #[serde(rename = "4x3")]
    Standard,
    #[serde(rename = "auto")]
    Auto,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Wide => "16x9",
            AspectRatio::Square => "1x1",
            AspectRatio::Portrait => "5x6",
            AspectRatio::Standard => "4x3",
            AspectRatio::Auto => "auto",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = Adx402Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "16x9" | "16:9" => Ok(AspectRatio::Wide),
            "1x1" | "1:1" => Ok(AspectRatio::Square),
            "5x6" | "5:6" => Ok(AspectRatio::Portrait),
            "4x3" | "4:3" => Ok(AspectRatio::Standard),
            "auto" => Ok(AspectRatio::Auto),
            other => Err(Adx402Error::Validation(format!(
                "unknown aspect ratio: {other}"
            ))),
        }
    }
}
