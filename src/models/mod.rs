//! Device event models
//!
//! An [`Event`] is the default target type for incoming trigger payloads:
//! a device reading set with an origin timestamp. Events arrive JSON or
//! CBOR encoded; JSON goes through serde, CBOR through the hand-written
//! map codec below so unknown keys from older senders are tolerated.

use minicbor::decode::Error as DecodeError;
use minicbor::{Decoder, Encoder};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single reading produced by a device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reading {
    /// Reading id (may be empty until core-data assigns one)
    pub id: String,
    /// Name of the value descriptor
    pub name: String,
    /// Reading value, stringified
    pub value: String,
    /// Origin timestamp in nanoseconds since epoch
    pub origin: i64,
    /// Name of the device that produced the reading
    pub device: String,
}

/// A device event: one or more readings from a single device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    /// Event id assigned by core-data
    pub id: String,
    /// Name of the originating device
    pub device: String,
    /// Origin timestamp in nanoseconds since epoch
    pub origin: i64,
    /// Readings carried by this event
    pub readings: Vec<Reading>,
}

impl Event {
    /// Create an event for `device` carrying a single reading.
    pub fn with_reading(device: impl Into<String>, reading: Reading) -> Self {
        Self {
            id: String::new(),
            device: device.into(),
            origin: chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0),
            readings: vec![reading],
        }
    }

    /// Encode as a definite-length CBOR map.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new(Vec::new());
        enc.map(4)?;
        enc.str("id")?.str(&self.id)?;
        enc.str("device")?.str(&self.device)?;
        enc.str("origin")?.i64(self.origin)?;
        enc.str("readings")?.array(self.readings.len() as u64)?;
        for reading in &self.readings {
            enc.map(5)?;
            enc.str("id")?.str(&reading.id)?;
            enc.str("name")?.str(&reading.name)?;
            enc.str("value")?.str(&reading.value)?;
            enc.str("origin")?.i64(reading.origin)?;
            enc.str("device")?.str(&reading.device)?;
        }
        Ok(enc.into_writer())
    }

    /// Decode from a CBOR map, skipping unrecognized keys.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let mut dec = Decoder::new(bytes);
        let mut event = Event::default();

        let entries = definite_len(dec.map()?)?;
        for _ in 0..entries {
            match dec.str()? {
                "id" => event.id = dec.str()?.to_string(),
                "device" => event.device = dec.str()?.to_string(),
                "origin" => event.origin = dec.i64()?,
                "readings" => {
                    let count = definite_len(dec.array()?)?;
                    for _ in 0..count {
                        event.readings.push(decode_reading(&mut dec)?);
                    }
                }
                _ => dec.skip()?,
            }
        }

        Ok(event)
    }
}

fn definite_len(len: Option<u64>) -> Result<u64> {
    len.ok_or_else(|| DecodeError::message("indefinite-length collections are not supported").into())
}

fn decode_reading(dec: &mut Decoder<'_>) -> Result<Reading> {
    let mut reading = Reading::default();
    let entries = definite_len(dec.map()?)?;
    for _ in 0..entries {
        match dec.str()? {
            "id" => reading.id = dec.str()?.to_string(),
            "name" => reading.name = dec.str()?.to_string(),
            "value" => reading.value = dec.str()?.to_string(),
            "origin" => reading.origin = dec.i64()?,
            "device" => reading.device = dec.str()?.to_string(),
            _ => dec.skip()?,
        }
    }
    Ok(reading)
}
