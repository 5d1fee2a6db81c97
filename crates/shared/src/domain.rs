use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ColorError;

macro_rules! id_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(BarId, u64);
id_newtype!(ObserverId, i64);

/// Colors understood by the client's boss bar renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarColor {
    Pink,
    Blue,
    Red,
    Green,
    Yellow,
    #[default]
    Purple,
    RebeccaPurple,
    White,
}

impl BarColor {
    pub const ALL: [BarColor; 8] = [
        BarColor::Pink,
        BarColor::Blue,
        BarColor::Red,
        BarColor::Green,
        BarColor::Yellow,
        BarColor::Purple,
        BarColor::RebeccaPurple,
        BarColor::White,
    ];

    /// Wire id sent in show packets.
    pub fn id(self) -> u32 {
        match self {
            BarColor::Pink => 0,
            BarColor::Blue => 1,
            BarColor::Red => 2,
            BarColor::Green => 3,
            BarColor::Yellow => 4,
            BarColor::Purple => 5,
            BarColor::RebeccaPurple => 6,
            BarColor::White => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BarColor::Pink => "pink",
            BarColor::Blue => "blue",
            BarColor::Red => "red",
            BarColor::Green => "green",
            BarColor::Yellow => "yellow",
            BarColor::Purple => "purple",
            BarColor::RebeccaPurple => "rebecca_purple",
            BarColor::White => "white",
        }
    }

    /// Parses a comma separated list such as `"red, blue,green"`.
    pub fn parse_list(raw: &str) -> Result<Vec<BarColor>, ColorError> {
        raw.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for BarColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BarColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BarColor::ALL
            .into_iter()
            .find(|color| color.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ColorError::UnknownName(s.to_string()))
    }
}

impl TryFrom<u32> for BarColor {
    type Error = ColorError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        BarColor::ALL
            .into_iter()
            .find(|color| color.id() == value)
            .ok_or(ColorError::UnknownId(value))
    }
}
