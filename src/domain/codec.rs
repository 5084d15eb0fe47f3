//! Versioned encode/decode pairs for every persisted record.
//!
//! Each entity is wrapped in a version-tagged envelope before it touches
//! the store, so the layout can evolve without breaking data written by
//! an earlier build. Nothing reads or writes the store except through
//! these functions.

use crate::domain::ledger::LedgerState;
use crate::domain::payee::{Address, Payee};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
#[serde(tag = "v")]
enum PayeeRecord {
    #[serde(rename = "1")]
    V1 { payee: Payee },
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "v")]
enum LedgerRecord {
    #[serde(rename = "1")]
    V1 { ledger: LedgerState },
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "v")]
enum IndexRecord {
    #[serde(rename = "1")]
    V1 { active: Vec<Address> },
}

fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| LedgerError::Codec(e.to_string()))
}

fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| LedgerError::Codec(e.to_string()))
}

pub fn encode_payee(payee: &Payee) -> Result<Vec<u8>> {
    encode(&PayeeRecord::V1 {
        payee: payee.clone(),
    })
}

pub fn decode_payee(bytes: &[u8]) -> Result<Payee> {
    let PayeeRecord::V1 { payee } = decode(bytes)?;
    Ok(payee)
}

pub fn encode_ledger(ledger: &LedgerState) -> Result<Vec<u8>> {
    encode(&LedgerRecord::V1 {
        ledger: ledger.clone(),
    })
}

pub fn decode_ledger(bytes: &[u8]) -> Result<LedgerState> {
    let LedgerRecord::V1 { ledger } = decode(bytes)?;
    Ok(ledger)
}

pub fn encode_index(active: &[Address]) -> Result<Vec<u8>> {
    encode(&IndexRecord::V1 {
        active: active.to_vec(),
    })
}

pub fn decode_index(bytes: &[u8]) -> Result<Vec<Address>> {
    let IndexRecord::V1 { active } = decode(bytes)?;
    Ok(active)
}
