//! Record (de)serialization to and from the store's wire shape
//!
//! Wire shape: `{ "id": "...", "createdTime": "...", "fields": { ... } }`.
//! `id` and `createdTime` are absent on create payloads, which is how the
//! same type serves both reads and writes.

use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use super::Record;
use super::Value;

#[derive(Serialize, Deserialize)]
struct WireRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(
        rename = "createdTime",
        skip_serializing_if = "Option::is_none",
        default
    )]
    created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    fields: HashMap<String, Value>,
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireRecord {
            id: self.id.clone(),
            created_time: self.created_time,
            fields: self.fields.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireRecord::deserialize(deserializer)?;
        Ok(Record {
            id: wire.id,
            created_time: wire.created_time,
            fields: wire.fields,
        })
    }
}
