//! Common types for the shared crate
//!
//! Printer identity, paper geometry and the raw job handed to the broker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Printer identifier as reported by the broker (opaque, usually the OS queue name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrinterId(pub String);

impl PrinterId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrinterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrinterId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PrinterId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Thermal paper roll width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PaperWidth {
    Mm58,
    #[default]
    Mm80,
}

impl PaperWidth {
    pub fn millimetres(self) -> u8 {
        match self {
            PaperWidth::Mm58 => 58,
            PaperWidth::Mm80 => 80,
        }
    }
}

impl TryFrom<u8> for PaperWidth {
    type Error = String;

    fn try_from(mm: u8) -> Result<Self, Self::Error> {
        match mm {
            58 => Ok(PaperWidth::Mm58),
            80 => Ok(PaperWidth::Mm80),
            other => Err(format!("unsupported paper width: {}mm (expected 58 or 80)", other)),
        }
    }
}

impl From<PaperWidth> for u8 {
    fn from(width: PaperWidth) -> Self {
        width.millimetres()
    }
}

impl FromStr for PaperWidth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mm: u8 = s
            .trim()
            .trim_end_matches("mm")
            .parse()
            .map_err(|_| format!("invalid paper width: {}", s))?;
        Self::try_from(mm)
    }
}

/// Receipt geometry derived from the paper width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLayout {
    pub paper_width_mm: PaperWidth,
}

impl ReceiptLayout {
    pub fn new(paper_width_mm: PaperWidth) -> Self {
        Self { paper_width_mm }
    }

    /// Printable columns in the normal font
    pub fn char_width(&self) -> usize {
        match self.paper_width_mm {
            PaperWidth::Mm58 => 32,
            PaperWidth::Mm80 => 48,
        }
    }

    /// Column width of metadata labels ("No", "Kasir", ...)
    pub fn label_width(&self) -> usize {
        match self.paper_width_mm {
            PaperWidth::Mm58 => 8,
            PaperWidth::Mm80 => 10,
        }
    }
}

impl From<PaperWidth> for ReceiptLayout {
    fn from(width: PaperWidth) -> Self {
        Self::new(width)
    }
}

/// Raw job submitted to a printer: text interleaved with device control codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    pub printer: PrinterId,
    pub data: Vec<u8>,
}

impl PrintJob {
    pub fn new(printer: impl Into<PrinterId>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            printer: printer.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_widths() {
        let narrow = ReceiptLayout::new(PaperWidth::Mm58);
        assert_eq!(narrow.char_width(), 32);
        assert_eq!(narrow.label_width(), 8);

        let wide = ReceiptLayout::default();
        assert_eq!(wide.char_width(), 48);
        assert_eq!(wide.label_width(), 10);
    }

    #[test]
    fn test_paper_width_parse() {
        assert_eq!("58".parse::<PaperWidth>().unwrap(), PaperWidth::Mm58);
        assert_eq!("80mm".parse::<PaperWidth>().unwrap(), PaperWidth::Mm80);
        assert!("76".parse::<PaperWidth>().is_err());
    }

    #[test]
    fn test_paper_width_serde() {
        let layout: ReceiptLayout = serde_json::from_str(r#"{"paperWidthMm":58}"#).unwrap();
        assert_eq!(layout.paper_width_mm, PaperWidth::Mm58);
        assert!(serde_json::from_str::<ReceiptLayout>(r#"{"paperWidthMm":60}"#).is_err());
    }
}
