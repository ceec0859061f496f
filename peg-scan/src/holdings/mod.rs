//! Holdings extraction.
//!
//! Raw page text → segmented holdings text → structured `HoldingsTable`.

mod parser;
mod segmenter;

pub use parser::{
    parse_holdings, parse_holdings_checked, HoldingRow, HoldingsTable, Sector, INSTRUMENT_TOKEN,
};
pub use segmenter::{
    extract_holdings_text, locate_holdings, slice_holdings, HoldingsWindow, SegmentError,
    HEADER_OFFSET, HOLDINGS_ANCHOR,
};

/// Extract the holdings table from a page body.
///
/// Segmentation failures are hard failures for the fund; parse losses are not.
pub fn extract_holdings(body: &str) -> Result<HoldingsTable, SegmentError> {
    let (window, text) = extract_holdings_text(body)?;
    Ok(parse_holdings_checked(text, window.declared_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_end_to_end() {
        let body = "Nifty 50 Index Fund(2)NameSectorInstrumentAssets\
                    HDFC Bank Ltd.FinancialEquity60.00%\
                    Infosys Ltd.TechnologyEquity40.00%\
                    Returns calculator 12.00%";
        let table = extract_holdings(body).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.total_weight(), 100.0);
    }

    #[test]
    fn test_extract_unrecognized_layout() {
        assert_eq!(
            extract_holdings("<no table here>"),
            Err(SegmentError::BoundaryNotFound)
        );
    }
}
