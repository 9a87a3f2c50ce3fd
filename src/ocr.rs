//! Bill text extraction.

use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("bill payload is not valid UTF-8 text: {0}")]
    InvalidText(#[from] std::string::FromUtf8Error),
    #[error("OCR engine failed: {0}")]
    Engine(String),
}

/// Turns an uploaded bill payload into text
pub trait OcrEngine: Send + Sync {
    fn extract_text(&self, image: &[u8]) -> Result<String, OcrError>;
}

/// Engine for clients that upload text they already extracted on-device
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextOcr;

impl OcrEngine for PlainTextOcr {
    fn extract_text(&self, image: &[u8]) -> Result<String, OcrError> {
        let text = String::from_utf8(image.to_vec())?;
        Ok(text.trim().to_string())
    }
}

// Tried in order; the first pattern with a parsable match wins
static AMOUNT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"amount due[:\s]*\$?(\d+\.?\d*)",
        r"total[:\s]*\$?(\d+\.?\d*)",
        r"balance[:\s]*\$?(\d+\.?\d*)",
        r"\$(\d+\.?\d*)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Pull the amount due out of bill text, `0.0` when none is found
pub fn extract_bill_amount(ocr_text: &str) -> f64 {
    let text = ocr_text.to_lowercase().replace(',', "");

    AMOUNT_PATTERNS
        .iter()
        .filter_map(|pattern| pattern.captures(&text))
        .find_map(|captures| captures.get(1)?.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_due_takes_priority() {
        let text = "CITY POWER\nPrevious balance: $80.00\nAmount Due: $124.58";
        assert!((extract_bill_amount(text) - 124.58).abs() < f64::EPSILON);
    }

    #[test]
    fn test_thousands_separator_removed() {
        let text = "General Hospital\nTOTAL: $2,450.00";
        assert!((extract_bill_amount(text) - 2450.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dollar_fallback_and_missing_amount() {
        assert!((extract_bill_amount("Netflix Premium $22.99 per month") - 22.99).abs() < f64::EPSILON);
        assert!(extract_bill_amount("no amount here").abs() < f64::EPSILON);
    }

    #[test]
    fn test_plain_text_engine() {
        let text = PlainTextOcr.extract_text(b"  ELECTRIC BILL \n").expect("utf-8");
        assert_eq!(text, "ELECTRIC BILL");
        assert!(PlainTextOcr.extract_text(&[0xff, 0xfe]).is_err());
    }
}
