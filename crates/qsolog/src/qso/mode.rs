//! Operating modes and QSO direction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Modulation scheme used for a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Single sideband voice.
    #[serde(rename = "SSB")]
    Ssb,
    /// Morse code.
    #[serde(rename = "CW")]
    Cw,
    /// Amplitude modulation.
    #[serde(rename = "AM")]
    Am,
    /// Frequency modulation.
    #[serde(rename = "FM")]
    Fm,
    /// FT8 digital mode.
    #[serde(rename = "FT-8")]
    Ft8,
    /// Weak signal propagation reporter.
    #[serde(rename = "WSPR")]
    Wspr,
}

impl Mode {
    /// All modes in menu order.
    pub const ALL: [Mode; 6] = [
        Self::Ssb,
        Self::Cw,
        Self::Am,
        Self::Fm,
        Self::Ft8,
        Self::Wspr,
    ];

    /// The mode name as written in log files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ssb => "SSB",
            Self::Cw => "CW",
            Self::Am => "AM",
            Self::Fm => "FM",
            Self::Ft8 => "FT-8",
            Self::Wspr => "WSPR",
        }
    }

    /// The mode name from the ADIF mode enumeration.
    #[must_use]
    pub fn adif_name(self) -> &'static str {
        match self {
            Self::Ft8 => "FT8",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| {
                mode.as_str().eq_ignore_ascii_case(wanted)
                    || mode.adif_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| "unknown mode, expected SSB, CW, AM, FM, FT-8 or WSPR".to_string())
    }
}

/// Whether the logged report was sent or received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QsoDirection {
    /// The operator sent the report.
    #[default]
    Sent,
    /// The operator received the report.
    Rcvd,
}

impl QsoDirection {
    /// The direction as written in log files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "Sent",
            Self::Rcvd => "Rcvd",
        }
    }
}

impl fmt::Display for QsoDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QsoDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sent" => Ok(Self::Sent),
            "rcvd" => Ok(Self::Rcvd),
            _ => Err("expected Sent or Rcvd".to_string()),
        }
    }
}
