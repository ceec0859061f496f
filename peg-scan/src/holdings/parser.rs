//! Holdings row parser.
//!
//! Turns the segmented holdings text into `HoldingRow`s with one pattern:
//! a lazy stock-name prefix, one sector label from a closed vocabulary, the
//! `Equity` instrument token, then the first `d.d%` weight after it.
//! Rows whose sector is not in the vocabulary never match and are dropped.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Instrument-type token that follows the sector label.
pub const INSTRUMENT_TOKEN: &str = "Equity";

/// Sector labels recognised on holdings pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sector {
    ConsumerDiscretionary,
    ConsumerStaples,
    CapitalGoods,
    MetalsAndMining,
    Financial,
    Healthcare,
    Technology,
    Automobile,
    Construction,
    Chemicals,
    Energy,
    Insurance,
    Communication,
    Textiles,
    Services,
}

impl Sector {
    /// Every sector, in pattern alternation order.
    pub const ALL: [Sector; 15] = [
        Sector::ConsumerDiscretionary,
        Sector::ConsumerStaples,
        Sector::CapitalGoods,
        Sector::MetalsAndMining,
        Sector::Financial,
        Sector::Healthcare,
        Sector::Technology,
        Sector::Automobile,
        Sector::Construction,
        Sector::Chemicals,
        Sector::Energy,
        Sector::Insurance,
        Sector::Communication,
        Sector::Textiles,
        Sector::Services,
    ];

    /// Label exactly as printed on the page.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConsumerDiscretionary => "Consumer Discretionary",
            Self::ConsumerStaples => "Consumer Staples",
            Self::CapitalGoods => "Capital Goods",
            Self::MetalsAndMining => "Metals & Mining",
            Self::Financial => "Financial",
            Self::Healthcare => "Healthcare",
            Self::Technology => "Technology",
            Self::Automobile => "Automobile",
            Self::Construction => "Construction",
            Self::Chemicals => "Chemicals",
            Self::Energy => "Energy",
            Self::Insurance => "Insurance",
            Self::Communication => "Communication",
            Self::Textiles => "Textiles",
            Self::Services => "Services",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|sector| sector.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown sector: {s}"))
    }
}

/// One constituent of a fund.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingRow {
    /// Stock name, trimmed
    pub stock: String,
    /// Sector label
    pub sector: Sector,
    /// Portfolio weight in percent, in (0, 100]
    pub weight_percent: f64,
}

/// Holdings of one fund in order of appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoldingsTable {
    pub rows: Vec<HoldingRow>,
}

impl HoldingsTable {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no row was parsed.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of row weights as observed (not forced to 100).
    pub fn total_weight(&self) -> f64 {
        self.rows.iter().map(|r| r.weight_percent).sum()
    }

    /// Iterate rows in parse order.
    pub fn iter(&self) -> std::slice::Iter<'_, HoldingRow> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a HoldingsTable {
    type Item = &'a HoldingRow;
    type IntoIter = std::slice::Iter<'a, HoldingRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

static HOLDING_ROW_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let sectors = Sector::ALL
        .iter()
        .map(|s| regex::escape(s.as_str()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"(?P<stock>.*?)(?P<sector>{sectors})(?P<instrument>{INSTRUMENT_TOKEN}).*?(?P<weight>\d+\.\d+)%"
    ))
    .unwrap()
});

/// Parse segmented holdings text into rows, left to right.
pub fn parse_holdings(text: &str) -> HoldingsTable {
    let mut rows = Vec::new();

    for caps in HOLDING_ROW_PATTERN.captures_iter(text) {
        let stock = caps["stock"].trim().to_string();
        let Ok(sector) = caps["sector"].parse::<Sector>() else {
            continue;
        };
        let Ok(weight_percent) = caps["weight"].parse::<f64>() else {
            continue;
        };

        if !(weight_percent > 0.0 && weight_percent <= 100.0) {
            debug!(stock = %stock, weight = weight_percent, "Dropping row with out-of-range weight");
            continue;
        }

        rows.push(HoldingRow {
            stock,
            sector,
            weight_percent,
        });
    }

    HoldingsTable { rows }
}

/// Parse and compare the row count against the page's declared count.
pub fn parse_holdings_checked(text: &str, declared_count: usize) -> HoldingsTable {
    let table = parse_holdings(text);
    if table.len() != declared_count {
        warn!(
            declared = declared_count,
            parsed = table.len(),
            "Parsed holdings count differs from declared count"
        );
    }
    table
}
