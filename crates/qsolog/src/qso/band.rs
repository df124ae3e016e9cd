//! Amateur bands and their sort precedence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An amateur radio band.
///
/// Variants are declared lowest frequency first, and the derived ordering
/// follows that declaration. Sorting a table by band therefore yields
/// 160m, 80m, ... 2m, 70cm rather than the lexicographic order of the names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Band {
    /// 160 metres (1.8 MHz).
    #[serde(rename = "160m")]
    M160,
    /// 80 metres (3.5 MHz).
    #[serde(rename = "80m")]
    M80,
    /// 60 metres (5 MHz).
    #[serde(rename = "60m")]
    M60,
    /// 40 metres (7 MHz).
    #[serde(rename = "40m")]
    M40,
    /// 30 metres (10.1 MHz).
    #[serde(rename = "30m")]
    M30,
    /// 20 metres (14 MHz).
    #[serde(rename = "20m")]
    M20,
    /// 17 metres (18 MHz).
    #[serde(rename = "17m")]
    M17,
    /// 15 metres (21 MHz).
    #[serde(rename = "15m")]
    M15,
    /// 12 metres (24.9 MHz).
    #[serde(rename = "12m")]
    M12,
    /// 10 metres (28 MHz).
    #[serde(rename = "10m")]
    M10,
    /// 6 metres (50 MHz).
    #[serde(rename = "6m")]
    M6,
    /// 2 metres (144 MHz).
    #[serde(rename = "2m")]
    M2,
    /// 70 centimetres (430 MHz).
    #[serde(rename = "70cm")]
    Cm70,
}

impl Band {
    /// All bands in precedence order.
    pub const ALL: [Band; 13] = [
        Self::M160,
        Self::M80,
        Self::M60,
        Self::M40,
        Self::M30,
        Self::M20,
        Self::M17,
        Self::M15,
        Self::M12,
        Self::M10,
        Self::M6,
        Self::M2,
        Self::Cm70,
    ];

    /// The band name as written in log files and ADIF exports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::M160 => "160m",
            Self::M80 => "80m",
            Self::M60 => "60m",
            Self::M40 => "40m",
            Self::M30 => "30m",
            Self::M20 => "20m",
            Self::M17 => "17m",
            Self::M15 => "15m",
            Self::M12 => "12m",
            Self::M10 => "10m",
            Self::M6 => "6m",
            Self::M2 => "2m",
            Self::Cm70 => "70cm",
        }
    }

    /// Position of the band in the sort precedence table, starting at 1.
    #[must_use]
    pub fn precedence(self) -> usize {
        // ALL is declared in variant order
        self as usize + 1
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Band {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|band| band.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown band, expected one of {}", band_names()))
    }
}

fn band_names() -> String {
    Band::ALL
        .iter()
        .map(|band| band.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
