// src/prices/model.rs
//! Regional price model: the deterministic last tier of price resolution.
//!
//! Pipeline per commodity: base price -> state multiplier -> seasonal multiplier
//! (each stage truncates) -> two synthesized markets around the modal price.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::commodity::{state_multiplier, Commodity, Multiplier};
use super::{MarketLocation, PriceLookup, PriceQuery};
use crate::resolve::{FallbackSynthesizer, PayloadContent, Synthesized};

pub const ESTIMATE_CAVEAT: &str =
    "यह अनुमानित मूल्य डेटा है। वास्तविक भावों के लिए स्थानीय मंडी से संपर्क करें।";

/// Spread around the modal price, in basis points.
///
/// The primary market spans `[-lower, +lower]`; the secondary market trades at
/// `+premium` and spans `[-lower + premium, +upper]`. The commodity envelope is
/// therefore `[-lower, +upper]` (defaults -5% / +7%) and no market quotes
/// outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadBands {
    pub lower_bp: u32,
    pub upper_bp: u32,
    pub secondary_premium_bp: u32,
}

impl Default for SpreadBands {
    fn default() -> Self {
        Self {
            lower_bp: 500,
            upper_bp: 700,
            secondary_premium_bp: 200,
        }
    }
}

impl SpreadBands {
    /// Bands that keep `min <= modal <= max` for both markets.
    pub fn is_valid(&self) -> bool {
        self.lower_bp <= 10_000
            && self.lower_bp <= self.upper_bp
            && self.secondary_premium_bp <= self.upper_bp
    }

    fn below(&self, extra_bp: u32) -> Multiplier {
        Multiplier::from_bp((10_000 + extra_bp).saturating_sub(self.lower_bp))
    }

    fn above(bp: u32) -> Multiplier {
        Multiplier::from_bp(10_000 + bp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub market_name: String,
    pub min_price: u32,
    pub max_price: u32,
    pub modal_price: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommodityPrice {
    pub commodity: Commodity,
    pub modal_price: u32,
    pub markets: Vec<MarketQuote>,
    pub price_range: PriceRange,
}

/// Price payload shared by every tier. INR per quintal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    pub date: NaiveDate,
    pub location: String,
    pub entries: Vec<CommodityPrice>,
}

impl PriceTable {
    pub fn get(&self, commodity: Commodity) -> Option<&CommodityPrice> {
        self.entries.iter().find(|e| e.commodity == commodity)
    }

    pub fn total_markets(&self) -> usize {
        self.entries.iter().map(|e| e.markets.len()).sum()
    }
}

impl PayloadContent for PriceTable {
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Modal price for a commodity in a state during a calendar month (1-12).
pub fn modal_price(commodity: Commodity, state: &str, month: u32) -> u32 {
    let regional = state_multiplier(state).apply(commodity.base_price());
    commodity.seasonal_multiplier(month).apply(regional)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegionalPriceModel {
    bands: SpreadBands,
}

impl RegionalPriceModel {
    pub fn new(bands: SpreadBands) -> Self {
        let bands = if bands.is_valid() {
            bands
        } else {
            SpreadBands::default()
        };
        Self { bands }
    }

    pub fn bands(&self) -> SpreadBands {
        self.bands
    }

    pub fn commodity_price(
        &self,
        commodity: Commodity,
        location: &MarketLocation,
        month: u32,
    ) -> CommodityPrice {
        let modal = modal_price(commodity, &location.state, month);
        let b = self.bands;

        let primary = MarketQuote {
            market_name: format!("मंडी समिति, {}, {}", location.district, location.state),
            min_price: b.below(0).apply(modal),
            max_price: SpreadBands::above(b.lower_bp).apply(modal),
            modal_price: modal,
        };
        let secondary = MarketQuote {
            market_name: format!("कृषि उपज मार्केट, {}", location.district),
            min_price: b.below(b.secondary_premium_bp).apply(modal),
            max_price: SpreadBands::above(b.upper_bp).apply(modal),
            modal_price: SpreadBands::above(b.secondary_premium_bp).apply(modal),
        };

        CommodityPrice {
            commodity,
            modal_price: modal,
            price_range: PriceRange {
                min: b.below(0).apply(modal),
                max: SpreadBands::above(b.upper_bp).apply(modal),
            },
            markets: vec![primary, secondary],
        }
    }

    /// Single-commodity estimate: one district mandi at `[-lower, +lower]`.
    pub fn spot_quote(
        &self,
        commodity: Commodity,
        location: &MarketLocation,
        month: u32,
    ) -> CommodityPrice {
        let modal = modal_price(commodity, &location.state, month);
        let b = self.bands;
        let range = PriceRange {
            min: b.below(0).apply(modal),
            max: SpreadBands::above(b.lower_bp).apply(modal),
        };
        CommodityPrice {
            commodity,
            modal_price: modal,
            markets: vec![MarketQuote {
                market_name: format!("मंडी समिति, {}", location.district),
                min_price: range.min,
                max_price: range.max,
                modal_price: modal,
            }],
            price_range: range,
        }
    }

    /// Full tables carry two markets per commodity; a single-commodity query
    /// gets the spot quote.
    pub fn table(&self, query: &PriceQuery, location: &MarketLocation, as_of: NaiveDate) -> PriceTable {
        let month = as_of.month();
        let entries = match query {
            PriceQuery::All => query
                .commodities()
                .into_iter()
                .map(|c| self.commodity_price(c, location, month))
                .collect(),
            PriceQuery::Commodity(c) => vec![self.spot_quote(*c, location, month)],
        };
        PriceTable {
            date: as_of,
            location: location.to_string(),
            entries,
        }
    }
}

impl FallbackSynthesizer<PriceLookup> for RegionalPriceModel {
    fn synthesize(
        &self,
        query: &PriceQuery,
        context: &MarketLocation,
        as_of: NaiveDate,
    ) -> Synthesized<PriceTable> {
        Synthesized {
            payload: self.table(query, context, as_of),
            caveat: ESTIMATE_CAVEAT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(state: &str) -> MarketLocation {
        MarketLocation::new("Ludhiana", state)
    }

    #[test]
    fn wheat_punjab_april() {
        let p = RegionalPriceModel::default().commodity_price(Commodity::Wheat, &loc("Punjab"), 4);
        assert_eq!(p.modal_price, 2024);
        assert_eq!(p.price_range.min, 1922);
        assert_eq!(p.price_range.max, 2165);
    }

    #[test]
    fn secondary_market_trades_at_premium() {
        let p = RegionalPriceModel::default().commodity_price(Commodity::Wheat, &loc("Punjab"), 4);
        let second = &p.markets[1];
        assert_eq!(second.modal_price, 2064);
        assert_eq!(second.min_price, 1963);
        assert_eq!(second.max_price, 2165);
        assert_eq!(p.markets[0].max_price, 2125);
    }

    #[test]
    fn spot_quote_is_one_district_mandi() {
        let p = RegionalPriceModel::default().spot_quote(Commodity::Wheat, &loc("Punjab"), 4);
        assert_eq!(p.markets.len(), 1);
        assert_eq!(p.markets[0].market_name, "मंडी समिति, Ludhiana");
        assert_eq!((p.price_range.min, p.modal_price, p.price_range.max), (1922, 2024, 2125));
    }

    #[test]
    fn invalid_bands_fall_back_to_default() {
        let m = RegionalPriceModel::new(SpreadBands {
            lower_bp: 900,
            upper_bp: 100,
            secondary_premium_bp: 0,
        });
        assert_eq!(m.bands(), SpreadBands::default());
    }
}
