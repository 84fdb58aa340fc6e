//! Host-side AT command dispatcher and SMS PDU codec for cellular modems.
//!
//! Two subsystems make up the crate:
//!
//! * [`device`] - a full-duplex line multiplexer over a serial byte stream.
//!   It serialises host commands, classifies every incoming line as a
//!   final response, an intermediate response or an unsolicited result
//!   code (URC), and routes each to the right consumer.
//! * [`pdu`] and [`sms`] - bit-exact SMS-SUBMIT/DELIVER/STATUS-REPORT
//!   codecs per 3GPP TS 23.040 with TS 23.038 alphabets, plus automatic
//!   segmentation of long messages and reassembly of incoming segments.
//!
//! The serial port itself is out of scope: any `AsyncRead + AsyncWrite`
//! byte stream works, whether it comes from a serial-port crate, a
//! pseudo-terminal or a test harness.
//!
//! ## Sending a message
//!
//! ```rust,no_run
//! use atmodem::{Device, DeviceConfig, SmsFormat};
//!
//! # async fn example(port: tokio::io::DuplexStream) -> Result<(), Box<dyn std::error::Error>> {
//! let device = Device::open(port, None, DeviceConfig::default());
//!
//! device.test().await?;
//! device.set_sms_format(SmsFormat::Pdu).await?;
//! device.send_sms("+8613800138000", "hello from rust").await?;
//!
//! device.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Receiving unsolicited result codes
//!
//! ```rust,no_run
//! use atmodem::{Device, DeviceConfig, Urc};
//! use std::sync::Arc;
//!
//! # async fn example(port: tokio::io::DuplexStream) -> Result<(), Box<dyn std::error::Error>> {
//! let handler = Arc::new(|urc: Urc| {
//!     if urc.label == "+CMTI" {
//!         println!("new message stored at index {:?}", urc.params.get(1));
//!     }
//! });
//! let device = Device::open(port, Some(handler), DeviceConfig::default());
//! # Ok(())
//! # }
//! ```

pub mod device;
pub mod line;
pub mod pdu;
pub mod sms;

#[cfg(test)]
mod tests;

// Re-export the dispatcher surface.
pub use device::sms::{SmsFormat, SmsMessage};
pub use device::{
    AtError, AtResult, CommandSet, Device, DeviceConfig, ResponseSet, Urc, UrcHandler, UrcSet,
};

// Re-export the codec surface.
pub use pdu::{
    Address, Alphabet, Dcs, Decodable, Deliver, Encodable, PduError, PduFrame, Scts,
    StatusReport, Submit, Tpdu, UserData, UserDataHeader, ValidityPeriod,
};
pub use sms::{Collector, EncodingHint, Segmenter};
