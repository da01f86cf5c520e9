//! Snapshot dump: save/load of the committed store
//!
//! A debugging/export aid, not a wire protocol. The dump is a JSON
//! document grouping entries by table, with Base64-encoded payloads; the
//! only contract is that `save` followed by `load` reproduces the same
//! table/key/value/sequence set.

use crate::key::split;
use crate::ops::Snapshot;
use crate::store::InMemoryKeyValueStore;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cascade_core::{Error, Result, Sequenced};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

#[derive(Serialize, Deserialize)]
struct StoreDump {
    next_sequence: u64,
    tables: Vec<TableDump>,
}

#[derive(Serialize, Deserialize)]
struct TableDump {
    name: String,
    entries: Vec<EntryDump>,
}

#[derive(Serialize, Deserialize)]
struct EntryDump {
    key: String,
    sequence: u64,
    data: String,
}

impl InMemoryKeyValueStore {
    /// Write the committed snapshot as a JSON dump
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let (snapshot, next_sequence) = self.committed();

        let mut tables: Vec<TableDump> = Vec::new();
        for (composite, value) in snapshot.iter() {
            let (table, key) = split(composite);
            if tables.last().map(|t| t.name.as_str()) != Some(table) {
                tables.push(TableDump {
                    name: table.to_string(),
                    entries: Vec::new(),
                });
            }
            // Sorted map order guarantees the last table is the right one.
            if let Some(current) = tables.last_mut() {
                current.entries.push(EntryDump {
                    key: key.to_string(),
                    sequence: value.sequence(),
                    data: STANDARD.encode(value.value()),
                });
            }
        }

        let dump = StoreDump {
            next_sequence,
            tables,
        };
        serde_json::to_writer(writer, &dump).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Rebuild a store from a JSON dump produced by [`Self::save`]
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        let dump: StoreDump =
            serde_json::from_reader(reader).map_err(|e| Error::Serialization(e.to_string()))?;

        let mut snapshot = Snapshot::new();
        let mut max_sequence = dump.next_sequence;
        for table in &dump.tables {
            for entry in &table.entries {
                let data = STANDARD
                    .decode(&entry.data)
                    .map_err(|e| Error::Serialization(e.to_string()))?;
                max_sequence = max_sequence.max(entry.sequence);
                snapshot.insert(
                    crate::key::compose(&table.name, &entry.key),
                    Sequenced::new(entry.sequence, data),
                );
            }
        }

        let store = InMemoryKeyValueStore::new();
        store.install(snapshot, max_sequence);
        Ok(store)
    }
}
