// src/prices/commodity.rs
//! Commodity identifiers and the per-variant price rules attached to them.
//!
//! Each commodity carries its own base price and seasonal rule; adding a crop
//! means adding a variant, not extending a chain of string comparisons.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Exact multiplier in basis points (10_000 = 1.0). Applying it truncates toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Multiplier(u32);

impl Multiplier {
    pub const ONE: Multiplier = Multiplier(10_000);

    pub const fn from_bp(bp: u32) -> Self {
        Multiplier(bp)
    }

    pub fn bp(self) -> u32 {
        self.0
    }

    pub fn apply(self, price: u32) -> u32 {
        let scaled = u64::from(price) * u64::from(self.0) / 10_000;
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 10_000.0
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Multiplier::ONE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Commodity {
    Wheat,
    Rice,
    Potato,
    Onion,
    Tomato,
    Cotton,
    Sugarcane,
    Mustard,
    Gram,
    Soyabean,
}

impl Commodity {
    pub const ALL: [Commodity; 10] = [
        Commodity::Wheat,
        Commodity::Rice,
        Commodity::Potato,
        Commodity::Onion,
        Commodity::Tomato,
        Commodity::Cotton,
        Commodity::Sugarcane,
        Commodity::Mustard,
        Commodity::Gram,
        Commodity::Soyabean,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Commodity::Wheat => "Wheat",
            Commodity::Rice => "Rice",
            Commodity::Potato => "Potato",
            Commodity::Onion => "Onion",
            Commodity::Tomato => "Tomato",
            Commodity::Cotton => "Cotton",
            Commodity::Sugarcane => "Sugarcane",
            Commodity::Mustard => "Mustard",
            Commodity::Gram => "Gram",
            Commodity::Soyabean => "Soyabean",
        }
    }

    /// Nationwide base price, INR per quintal.
    pub fn base_price(self) -> u32 {
        match self {
            Commodity::Wheat => 2200,
            Commodity::Rice => 2950,
            Commodity::Potato => 1350,
            Commodity::Onion => 2650,
            Commodity::Tomato => 2000,
            Commodity::Cotton => 5850,
            Commodity::Sugarcane => 300,
            Commodity::Mustard => 5000,
            Commodity::Gram => 4750,
            Commodity::Soyabean => 4400,
        }
    }

    /// Harvest gluts push prices down (rabi Mar-May, kharif Oct-Dec, winter
    /// vegetables Jan-Feb); the early monsoon pushes vegetables up (Jun-Jul).
    pub fn seasonal_multiplier(self, month: u32) -> Multiplier {
        use Commodity::*;
        let bp = match (self, month) {
            (Wheat, 3) => 8_500,
            (Mustard, 3) => 8_000,
            (Gram, 3) => 8_200,
            (Wheat, 4) => 8_000,
            (Mustard, 4) => 7_500,
            (Gram, 4) => 7_800,
            (Wheat | Mustard | Gram, 5) => 8_500,

            (Rice, 10) => 8_500,
            (Cotton, 10) => 9_000,
            (Soyabean, 10) => 8_800,
            (Rice, 11) => 8_000,
            (Cotton, 11) => 8_500,
            (Soyabean, 11) => 8_500,
            (Rice, 12) => 8_500,
            (Cotton | Soyabean, 12) => 9_000,

            (Potato, 1) => 7_500,
            (Onion, 1) => 8_500,
            (Potato, 2) => 7_000,
            (Onion, 2) => 8_000,

            (Potato, 6) => 12_500,
            (Onion, 6) => 13_000,
            (Tomato, 6) => 12_000,
            (Potato, 7) => 13_000,
            (Onion, 7) => 13_500,
            (Tomato, 7) => 12_500,

            _ => return Multiplier::ONE,
        };
        Multiplier::from_bp(bp)
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown commodity: {0}")]
pub struct UnknownCommodity(pub String);

impl FromStr for Commodity {
    type Err = UnknownCommodity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let found = match key.as_str() {
            "soybean" => Some(Commodity::Soyabean),
            "paddy" => Some(Commodity::Rice),
            "chana" => Some(Commodity::Gram),
            _ => Commodity::ALL
                .iter()
                .copied()
                .find(|c| c.name().eq_ignore_ascii_case(&key)),
        };
        found.ok_or_else(|| UnknownCommodity(s.trim().to_string()))
    }
}

/// State-level adjustment relative to the nationwide base (keys lower-cased).
static STATE_MULTIPLIERS: Lazy<HashMap<&'static str, Multiplier>> = Lazy::new(|| {
    [
        ("uttar pradesh", 10_000),
        ("punjab", 11_500),
        ("haryana", 11_200),
        ("rajasthan", 9_500),
        ("madhya pradesh", 9_200),
        ("bihar", 8_800),
        ("west bengal", 9_000),
        ("maharashtra", 10_500),
        ("gujarat", 10_800),
        ("karnataka", 9_800),
    ]
    .into_iter()
    .map(|(k, bp)| (k, Multiplier::from_bp(bp)))
    .collect()
});

/// Unlisted states get 1.0.
pub fn state_multiplier(state: &str) -> Multiplier {
    let key = state.trim().to_ascii_lowercase();
    STATE_MULTIPLIERS
        .get(key.as_str())
        .copied()
        .unwrap_or(Multiplier::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively_and_aliases() {
        assert_eq!("wheat".parse::<Commodity>().unwrap(), Commodity::Wheat);
        assert_eq!(" SOYABEAN ".parse::<Commodity>().unwrap(), Commodity::Soyabean);
        assert_eq!("soybean".parse::<Commodity>().unwrap(), Commodity::Soyabean);
        assert!("banana".parse::<Commodity>().is_err());
    }

    #[test]
    fn state_lookup_defaults_to_one() {
        assert_eq!(state_multiplier("Punjab").bp(), 11_500);
        assert_eq!(state_multiplier("punjab ").bp(), 11_500);
        assert_eq!(state_multiplier("Kerala"), Multiplier::ONE);
    }

    #[test]
    fn seasonal_rules_only_fire_for_listed_months() {
        assert_eq!(Commodity::Wheat.seasonal_multiplier(4).bp(), 8_000);
        assert_eq!(Commodity::Wheat.seasonal_multiplier(8), Multiplier::ONE);
        assert_eq!(Commodity::Sugarcane.seasonal_multiplier(4), Multiplier::ONE);
        assert_eq!(Commodity::Tomato.seasonal_multiplier(7).bp(), 12_500);
    }

    #[test]
    fn multiplier_truncates() {
        assert_eq!(Multiplier::from_bp(9_500).apply(2024), 1922);
        assert_eq!(Multiplier::from_bp(10_700).apply(2024), 2165);
    }
}
