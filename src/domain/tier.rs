use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The star rating of a restaurant.
///
/// The tier only matters to the draw: it picks which bucket a restaurant
/// falls into. Anything outside `1..=3` is rejected, both when decoding a
/// payload and when parsing user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum Tier {
    /// One star. Drawn most often.
    One = 1,
    /// Two stars.
    Two = 2,
    /// Three stars. Drawn least often.
    Three = 3,
}

impl Tier {
    /// All tiers in ascending order.
    pub const ALL: [Self; 3] = [Self::One, Self::Two, Self::Three];

    /// The number of stars, `1..=3`.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Render the tier as a three-slot star bar, e.g. `★★☆`.
    #[must_use]
    pub fn stars(self) -> String {
        let filled = usize::from(self.value());
        let mut bar = "★".repeat(filled);
        bar.push_str(&"☆".repeat(3 - filled));
        bar
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.value()
    }
}

impl TryFrom<i64> for Tier {
    type Error = InvalidTierError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(InvalidTierError(other.to_string())),
        }
    }
}

impl TryFrom<u8> for Tier {
    type Error = InvalidTierError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl FromStr for Tier {
    type Err = InvalidTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<i64>()
            .map_err(|_| InvalidTierError(trimmed.to_string()))
            .and_then(Self::try_from)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Error returned when a rating is not one of 1, 2 or 3.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("invalid rating tier '{0}': must be 1, 2 or 3")]
pub struct InvalidTierError(String);
