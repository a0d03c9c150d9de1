//! Wire format for WAL records.
//!
//! Each record is a sequence of UTF-8 fields joined by the ASCII Unit
//! Separator (0x1F) and terminated by the ASCII Record Separator (0x1E):
//!
//! ```text
//! record  := tx US opcode (US field)* RS
//! tx      := 36-char canonical UUID
//! opcode  := "SET" | "DELETE" | "TAG" | "UNTAG" | "COMMIT"
//! ```
//!
//! Ported field-for-field from the reference implementation's
//! `operation.go` (`serialize`/`deserialize`/`opSplit`).

use crate::error::{Error, Result};
use uuid::Uuid;

pub const FIELD_SEPARATOR: u8 = 0x1F;
pub const RECORD_SEPARATOR: u8 = 0x1E;

/// One WAL operation, stamped with the id of the transaction that produced
/// it. `Commit` carries no payload beyond the transaction id: it marks
/// every preceding buffered operation in the same transaction as durable
/// and visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Set {
        tx_id: Uuid,
        key: String,
        value: String,
    },
    Delete {
        tx_id: Uuid,
        key: String,
    },
    Tag {
        tx_id: Uuid,
        key: String,
        tag: String,
    },
    Untag {
        tx_id: Uuid,
        key: String,
        tag: String,
    },
    Commit {
        tx_id: Uuid,
    },
}

impl Operation {
    pub fn tx_id(&self) -> Uuid {
        match self {
            Operation::Set { tx_id, .. }
            | Operation::Delete { tx_id, .. }
            | Operation::Tag { tx_id, .. }
            | Operation::Untag { tx_id, .. }
            | Operation::Commit { tx_id } => *tx_id,
        }
    }

    fn opcode(&self) -> &'static str {
        match self {
            Operation::Set { .. } => "SET",
            Operation::Delete { .. } => "DELETE",
            Operation::Tag { .. } => "TAG",
            Operation::Untag { .. } => "UNTAG",
            Operation::Commit { .. } => "COMMIT",
        }
    }

    /// Serializes this operation into a framed WAL record, US-joined
    /// fields terminated by a single RS byte.
    pub fn serialize(&self) -> Vec<u8> {
        let mut fields: Vec<&str> = vec![];
        let tx_id_str = self.tx_id().to_string();
        fields.push(&tx_id_str);
        fields.push(self.opcode());

        match self {
            Operation::Set { key, value, .. } => {
                fields.push(key);
                fields.push(value);
            }
            Operation::Delete { key, .. } => {
                fields.push(key);
            }
            Operation::Tag { key, tag, .. } | Operation::Untag { key, tag, .. } => {
                fields.push(key);
                fields.push(tag);
            }
            Operation::Commit { .. } => {}
        }

        let mut out = fields.join(&(FIELD_SEPARATOR as char).to_string()).into_bytes();
        out.push(RECORD_SEPARATOR);
        out
    }
}

/// Deserializes a single framed (or unframed, trailing-RS-optional) WAL
/// record. Returns `Error::Corruption` on any malformed input: unknown
/// opcode, non-UUID transaction id, or a field count mismatch for the
/// opcode.
pub fn deserialize(data: &[u8]) -> Result<Operation> {
    let data = if data.last() == Some(&RECORD_SEPARATOR) {
        &data[..data.len() - 1]
    } else {
        data
    };

    let record = std::str::from_utf8(data)
        .map_err(|e| Error::Corruption(format!("record is not valid UTF-8: {e}")))?;
    let fields: Vec<&str> = record.split(FIELD_SEPARATOR as char).collect();

    const TX_FIELD: usize = 0;
    const OPCODE_FIELD: usize = 1;
    const KEY_FIELD: usize = 2;
    const VALUE_OR_TAG_FIELD: usize = 3;

    if fields.len() < 2 {
        return Err(Error::Corruption(format!(
            "corrupted operation record, expected at least 2 fields: {record}"
        )));
    }

    let tx_id = Uuid::parse_str(fields[TX_FIELD])
        .map_err(|_| Error::Corruption(format!("unsupported transaction id: {}", fields[TX_FIELD])))?;

    let (expected_field_count, opcode) = match fields[OPCODE_FIELD] {
        "SET" => (4, "SET"),
        "DELETE" => (3, "DELETE"),
        "TAG" => (4, "TAG"),
        "UNTAG" => (4, "UNTAG"),
        "COMMIT" => (2, "COMMIT"),
        other => {
            return Err(Error::Corruption(format!(
                "unsupported operation code: {other}"
            )))
        }
    };

    if fields.len() != expected_field_count {
        return Err(Error::Corruption(format!(
            "unexpected number of fields for {opcode} operation, expected {expected_field_count} found {} in record: {record}",
            fields.len()
        )));
    }

    Ok(match opcode {
        "SET" => Operation::Set {
            tx_id,
            key: fields[KEY_FIELD].to_string(),
            value: fields[VALUE_OR_TAG_FIELD].to_string(),
        },
        "DELETE" => Operation::Delete {
            tx_id,
            key: fields[KEY_FIELD].to_string(),
        },
        "TAG" => Operation::Tag {
            tx_id,
            key: fields[KEY_FIELD].to_string(),
            tag: fields[VALUE_OR_TAG_FIELD].to_string(),
        },
        "UNTAG" => Operation::Untag {
            tx_id,
            key: fields[KEY_FIELD].to_string(),
            tag: fields[VALUE_OR_TAG_FIELD].to_string(),
        },
        "COMMIT" => Operation::Commit { tx_id },
        _ => unreachable!("opcode already validated above"),
    })
}

/// Scans a byte buffer for the next full (RS-terminated) record.
///
/// Returns `Some((consumed, record))` where `record` includes the
/// trailing RS byte, or `None` if no complete record is present — an
/// incomplete tail (a torn write from a crash mid-append) is left
/// untouched by the caller, matching the scan/recovery policy in the
/// design: trailing incomplete records are silently dropped.
pub fn next_record(data: &[u8]) -> Option<(usize, &[u8])> {
    let idx = data.iter().position(|&b| b == RECORD_SEPARATOR)?;
    Some((idx + 1, &data[..=idx]))
}
