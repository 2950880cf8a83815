//! # Snapshot Repository
//!
//! Every request works on a whole [`Snapshot`]: `load` reads each
//! collection document, the caller mutates the snapshot in memory, and
//! `commit` writes every document back as one batch.
//!
//! A `revision` document counts commits. The backend checks it inside the
//! same exclusive hold that applies the batch, and `commit` refuses to
//! write when it no longer matches the revision the snapshot was loaded
//! at, so two writers sharing a data directory cannot silently overwrite
//! each other.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use nir_core::{default_procedures, Cid, Doctor, Payer, Procedure, Sector};
use nir_ledger::{AuditEntry, AuditLog, EventSink, HistoryLedger, DEFAULT_AUDIT_CAPACITY};
use nir_state::{BedEvent, BedRegistry};

use crate::backend::{FileBackend, KvBackend, MemoryBackend};
use crate::error::StoreError;

pub const KEY_SECTORS: &str = "sectors";
pub const KEY_BEDS: &str = "beds";
pub const KEY_PAYERS: &str = "payers";
pub const KEY_CIDS: &str = "cids";
pub const KEY_HISTORY: &str = "history";
pub const KEY_DOCTORS: &str = "doctors";
pub const KEY_PROCEDURES: &str = "procedures";
pub const KEY_AUDIT: &str = "audit";
pub const KEY_REVISION: &str = "revision";

const DOCUMENT_KEYS: [&str; 9] = [
    KEY_SECTORS,
    KEY_BEDS,
    KEY_PAYERS,
    KEY_CIDS,
    KEY_HISTORY,
    KEY_DOCTORS,
    KEY_PROCEDURES,
    KEY_AUDIT,
    KEY_REVISION,
];

/// The whole board at one revision.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub sectors: Vec<Sector>,
    pub beds: BedRegistry,
    pub payers: Vec<Payer>,
    pub cids: Vec<Cid>,
    pub doctors: Vec<Doctor>,
    pub procedures: Vec<Procedure>,
    pub history: HistoryLedger,
    pub audit: AuditLog,
    revision: u64,
}

impl Snapshot {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Feed `event` to the history ledger and the audit log.
    pub fn record(&mut self, event: &BedEvent, actor: &str) {
        self.history.record(event, actor);
        self.audit.record(event, actor);
        tracing::info!(
            kind = event.kind(),
            bed = %event.bed().number,
            actor,
            "bed event recorded"
        );
    }
}

/// Raw documents read in one pass, decoded on demand.
struct Documents(HashMap<&'static str, String>);

impl Documents {
    fn read(backend: &dyn KvBackend) -> Result<Self, StoreError> {
        let raw = backend.get_many(&DOCUMENT_KEYS)?;
        Ok(Self(
            DOCUMENT_KEYS
                .into_iter()
                .zip(raw)
                .filter_map(|(key, doc)| doc.map(|doc| (key, doc)))
                .collect(),
        ))
    }

    fn take<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, StoreError> {
        self.0.remove(key).map(|raw| decode(key, &raw)).transpose()
    }
}

#[derive(Debug)]
pub struct Repository {
    backend: Box<dyn KvBackend>,
    audit_capacity: usize,
}

impl Repository {
    pub fn new(backend: impl KvBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    pub fn open_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileBackend::new(dir))
    }

    pub fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }

    pub fn audit_capacity(&self) -> usize {
        self.audit_capacity
    }

    /// Read every collection. Missing documents load as empty, except
    /// procedures: a store without them is seeded with the defaults and
    /// committed at once so their ids stay stable.
    pub fn load(&self) -> Result<Snapshot, StoreError> {
        loop {
            let mut docs = Documents::read(self.backend.as_ref())?;
            let procedures: Option<Vec<Procedure>> = docs.take(KEY_PROCEDURES)?;
            let seeding = procedures.is_none();
            let audit: Vec<AuditEntry> = docs.take(KEY_AUDIT)?.unwrap_or_default();

            let mut snapshot = Snapshot {
                sectors: docs.take(KEY_SECTORS)?.unwrap_or_default(),
                beds: docs.take(KEY_BEDS)?.unwrap_or_default(),
                payers: docs.take(KEY_PAYERS)?.unwrap_or_default(),
                cids: docs.take(KEY_CIDS)?.unwrap_or_default(),
                doctors: docs.take(KEY_DOCTORS)?.unwrap_or_default(),
                procedures: procedures.unwrap_or_else(default_procedures),
                history: docs.take(KEY_HISTORY)?.unwrap_or_default(),
                audit: AuditLog::from_entries(audit, self.audit_capacity),
                revision: docs.take(KEY_REVISION)?.unwrap_or_default(),
            };
            if !seeding {
                return Ok(snapshot);
            }

            match self.commit(&mut snapshot) {
                Ok(()) => {
                    tracing::info!(count = snapshot.procedures.len(), "seeded default procedures");
                    return Ok(snapshot);
                }
                // Another writer committed first; read what it wrote.
                Err(StoreError::Conflict { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Persist `snapshot` and advance its revision.
    ///
    /// Fails with [`StoreError::Conflict`] if another commit landed since
    /// `snapshot` was loaded. On any error nothing is written.
    pub fn commit(&self, snapshot: &mut Snapshot) -> Result<(), StoreError> {
        let loaded = snapshot.revision;
        let next = loaded + 1;
        let writes = [
            (KEY_SECTORS, encode(KEY_SECTORS, &snapshot.sectors)?),
            (KEY_BEDS, encode(KEY_BEDS, &snapshot.beds)?),
            (KEY_PAYERS, encode(KEY_PAYERS, &snapshot.payers)?),
            (KEY_CIDS, encode(KEY_CIDS, &snapshot.cids)?),
            (KEY_DOCTORS, encode(KEY_DOCTORS, &snapshot.doctors)?),
            (KEY_PROCEDURES, encode(KEY_PROCEDURES, &snapshot.procedures)?),
            (KEY_HISTORY, encode(KEY_HISTORY, &snapshot.history)?),
            (KEY_AUDIT, encode(KEY_AUDIT, &snapshot.audit.to_vec())?),
            (KEY_REVISION, encode(KEY_REVISION, &next)?),
        ];

        let unchanged = |current: Option<&str>| -> Result<(), StoreError> {
            let found: u64 = match current {
                Some(raw) => decode(KEY_REVISION, raw)?,
                None => 0,
            };
            if found != loaded {
                tracing::warn!(loaded, found, "commit rejected: revision moved");
                return Err(StoreError::Conflict { loaded, found });
            }
            Ok(())
        };
        self.backend.put_batch(KEY_REVISION, &unchanged, &writes)?;

        snapshot.revision = next;
        tracing::debug!(revision = next, "snapshot committed");
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|source| StoreError::Serialization {
        key: key.to_string(),
        source,
    })
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialization {
        key: key.to_string(),
        source,
    })
}
