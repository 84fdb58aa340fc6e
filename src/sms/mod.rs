// ABOUTME: Message-level layer over the TPDU codec - segmentation and reassembly

pub mod collect;
pub mod segment;

pub use collect::{Collector, ExpiredGroup, ExpiryHandler};
pub use segment::{EncodingHint, Segmenter};

use crate::pdu::tpdu::Tpdu;
use crate::pdu::PduError;

/// Decode an ordered, complete segment list into the full message text.
pub fn assemble_text(segments: &[Tpdu]) -> Result<String, PduError> {
    let mut text = String::new();
    for segment in segments {
        text.push_str(&segment.text()?);
    }
    Ok(text)
}
