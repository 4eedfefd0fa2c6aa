// src/prices/mod.rs
//! Mandi price resolution: live tiers first, regional estimate last.

pub mod commodity;
pub mod model;
pub mod service;
pub mod sources;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::resolve::Lookup;

pub use commodity::{state_multiplier, Commodity, Multiplier, UnknownCommodity};
pub use model::{
    modal_price, CommodityPrice, MarketQuote, PriceRange, PriceTable, RegionalPriceModel,
    SpreadBands, ESTIMATE_CAVEAT,
};
pub use service::{CommodityReport, PriceError, PriceReport, PriceService, PriceSummary};
pub use sources::{AuthoritativeApiAttempt, ScrapeProbeAttempt};

/// Marker for the price instantiation of the resolver.
pub struct PriceLookup;

impl Lookup for PriceLookup {
    type Query = PriceQuery;
    type Context = MarketLocation;
    type Payload = PriceTable;
    const LABEL: &'static str = "prices";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceQuery {
    All,
    Commodity(Commodity),
}

impl PriceQuery {
    pub fn commodities(&self) -> Vec<Commodity> {
        match self {
            PriceQuery::All => Commodity::ALL.to_vec(),
            PriceQuery::Commodity(c) => vec![*c],
        }
    }
}

/// The minimum context price tiers need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketLocation {
    pub district: String,
    pub state: String,
}

impl MarketLocation {
    pub fn new(district: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            district: district.into(),
            state: state.into(),
        }
    }
}

impl fmt::Display for MarketLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.district, self.state)
    }
}
