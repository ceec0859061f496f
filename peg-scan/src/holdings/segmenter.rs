//! Holdings segmenter.
//!
//! The holdings page flattens its table into one run of text with no
//! separators between cells. The only structure left is:
//!
//! ```text
//! ...Holdings (52)NameSectorInstrumentAssetsHDFC Bank Ltd.FinancialEquity9.87%ICICI...
//!             ^^^^                                                       ^
//!             declared count                                             one '%' per row
//! ```
//!
//! So the record sequence is located through the header anchor, sized by the
//! parenthesised count before it, and cut after that many `%` signs.

use thiserror::Error;

/// Header sentinel: the end of the count parenthetical glued to the table header.
pub const HOLDINGS_ANCHOR: &str = ")NameSectorInstrumentAssets";

/// Offset from the anchor start to the last header character.
///
/// Scanning starts on the character after it, i.e. right past the anchor.
pub const HEADER_OFFSET: usize = 26;

/// Failure modes of holdings segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    /// The header anchor does not appear in the page text
    #[error("holdings boundary not found: page layout not recognized")]
    BoundaryNotFound,

    /// No `(` precedes the anchor
    #[error("holdings count not found before the table header")]
    CountNotFound,

    /// Text between `(` and the anchor is not a decimal count
    #[error("malformed holdings count: {found:?}")]
    MalformedCount { found: String },

    /// Text ended before the declared number of rows was seen
    #[error("truncated holdings: expected {expected} rows, found {found}")]
    TruncatedInput { expected: usize, found: usize },
}

/// Location and declared size of the holdings table inside a page body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldingsWindow {
    /// Byte offset of the anchor in the body
    pub start_offset: usize,
    /// Number of rows the page declares
    pub declared_count: usize,
}

/// Find the holdings anchor and read the declared count before it.
pub fn locate_holdings(text: &str) -> Result<HoldingsWindow, SegmentError> {
    let start_offset = text
        .find(HOLDINGS_ANCHOR)
        .ok_or(SegmentError::BoundaryNotFound)?;

    let before = &text[..start_offset];
    let open = before.rfind('(').ok_or(SegmentError::CountNotFound)?;
    let digits = &before[open + 1..];

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(SegmentError::MalformedCount {
            found: digits.to_string(),
        });
    }

    let declared_count = digits
        .parse::<usize>()
        .map_err(|_| SegmentError::MalformedCount {
            found: digits.to_string(),
        })?;

    Ok(HoldingsWindow {
        start_offset,
        declared_count,
    })
}

/// Cut the text that holds exactly `window.declared_count` rows.
///
/// Every character after the header is kept until the `%` counter reaches
/// the declared count; the returned slice ends on that `%`.
pub fn slice_holdings<'a>(text: &'a str, window: &HoldingsWindow) -> Result<&'a str, SegmentError> {
    let begin = window.start_offset + HEADER_OFFSET + 1;
    let rest = text.get(begin..).unwrap_or("");

    if window.declared_count == 0 {
        return Ok(&rest[..0]);
    }

    let mut seen = 0;
    for (idx, ch) in rest.char_indices() {
        if ch == '%' {
            seen += 1;
            if seen == window.declared_count {
                return Ok(&rest[..idx + ch.len_utf8()]);
            }
        }
    }

    Err(SegmentError::TruncatedInput {
        expected: window.declared_count,
        found: seen,
    })
}

/// Locate and slice in one step.
pub fn extract_holdings_text(text: &str) -> Result<(HoldingsWindow, &str), SegmentError> {
    let window = locate_holdings(text)?;
    let slice = slice_holdings(text, &window)?;
    Ok((window, slice))
}
