// ABOUTME: Splits outgoing payloads into SUBMIT TPDUs with concatenation headers
// ABOUTME: Picks the cheapest alphabet and allocates wrapping 8-bit references

use crate::pdu::address::Address;
use crate::pdu::alphabet;
use crate::pdu::dcs::Dcs;
use crate::pdu::submit::Submit;
use crate::pdu::udh::UserDataHeader;
use crate::pdu::user_data::UserData;
use crate::pdu::PduError;
use std::sync::atomic::{AtomicU8, Ordering};

/// Septets in a single GSM 7-bit message.
pub const GSM7_SINGLE: usize = 160;
/// Septets per segment once a concatenation header is present.
pub const GSM7_SEGMENT: usize = 153;
/// UTF-16 code units in a single UCS-2 message (140 octets).
pub const UCS2_SINGLE: usize = 70;
/// UTF-16 code units per concatenated UCS-2 segment (134 octets).
pub const UCS2_SEGMENT: usize = 67;
/// Octets in a single 8-bit message.
pub const OCTET_SINGLE: usize = 140;
/// Octets per concatenated 8-bit segment.
pub const OCTET_SEGMENT: usize = 134;

/// How the segmenter should choose the payload alphabet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum EncodingHint {
    /// GSM 7-bit when every character maps, UCS-2 otherwise.
    #[default]
    Auto,
    /// Always UCS-2.
    ForceUcs2,
    /// Opaque 8-bit octets; the payload is not treated as text.
    Force8Bit,
}

/// Stateful encoder for outgoing messages. The concatenation reference is a
/// per-segmenter counter wrapping mod 256, so interleaved long messages to
/// the same destination stay distinguishable.
#[derive(Debug, Default)]
pub struct Segmenter {
    next_reference: AtomicU8,
}

impl Segmenter {
    pub fn new() -> Self {
        Segmenter::default()
    }

    /// Split `payload` into one or more SUBMIT TPDUs for `destination`.
    /// Every returned TPDU shares the same alphabet, destination and (when
    /// concatenated) reference; sequence numbers start at 1.
    pub fn segment(
        &self,
        payload: &[u8],
        destination: &Address,
        hint: EncodingHint,
    ) -> Result<Vec<Submit>, PduError> {
        if hint == EncodingHint::Force8Bit {
            return self.build(
                destination,
                Dcs::eight_bit(),
                chunk_octets(payload, OCTET_SINGLE, OCTET_SEGMENT),
            );
        }

        let text = std::str::from_utf8(payload)
            .map_err(|_| PduError::BadPdu("text payload is not valid UTF-8"))?;

        let use_gsm7 = hint == EncodingHint::Auto
            && text.chars().all(|c| alphabet::char_cost(c).is_some());
        if use_gsm7 {
            let chunks = chunk_text(text, GSM7_SINGLE, GSM7_SEGMENT, |c| {
                alphabet::char_cost(c).unwrap_or(2)
            });
            let mut segments = Vec::with_capacity(chunks.len());
            for chunk in &chunks {
                segments.push(UserData::Septets(alphabet::encode_gsm7(chunk)?));
            }
            return self.build(destination, Dcs::gsm7(), segments);
        }

        let chunks = chunk_text(text, UCS2_SINGLE, UCS2_SEGMENT, |c| c.len_utf16());
        let segments = chunks
            .iter()
            .map(|chunk| UserData::Octets(alphabet::encode_ucs2(chunk)))
            .collect();
        self.build(destination, Dcs::ucs2(), segments)
    }

    fn build(
        &self,
        destination: &Address,
        dcs: Dcs,
        segments: Vec<UserData>,
    ) -> Result<Vec<Submit>, PduError> {
        if segments.len() > 0xFF {
            return Err(PduError::BadPdu("message needs more than 255 segments"));
        }
        let total = segments.len() as u8;

        if total <= 1 {
            let user_data = segments
                .into_iter()
                .next()
                .unwrap_or_else(|| match dcs.alphabet {
                    crate::pdu::Alphabet::Gsm7 => UserData::Septets(Vec::new()),
                    _ => UserData::Octets(Vec::new()),
                });
            return Ok(vec![Submit::new(destination.clone(), dcs, user_data)]);
        }

        let reference = self.next_reference.fetch_add(1, Ordering::Relaxed);
        let mut tpdus = Vec::with_capacity(segments.len());
        for (i, user_data) in segments.into_iter().enumerate() {
            let mut submit = Submit::new(destination.clone(), dcs, user_data);
            submit.udh = Some(UserDataHeader::concat8(reference, total, i as u8 + 1));
            tpdus.push(submit);
        }
        Ok(tpdus)
    }
}

/// Split text into chunks by a per-character cost. A message fitting
/// `single_cap` stays whole; otherwise each chunk holds at most
/// `segment_cap` cost, never splitting a character (or its escape pair).
fn chunk_text(text: &str, single_cap: usize, segment_cap: usize, cost: impl Fn(char) -> usize) -> Vec<String> {
    let total: usize = text.chars().map(&cost).sum();
    if total <= single_cap {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::with_capacity(total / segment_cap + 1);
    let mut current = String::new();
    let mut used = 0;
    for c in text.chars() {
        let c_cost = cost(c);
        if used + c_cost > segment_cap {
            chunks.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += c_cost;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn chunk_octets(payload: &[u8], single_cap: usize, segment_cap: usize) -> Vec<UserData> {
    if payload.len() <= single_cap {
        return vec![UserData::Octets(payload.to_vec())];
    }
    payload
        .chunks(segment_cap)
        .map(|chunk| UserData::Octets(chunk.to_vec()))
        .collect()
}
