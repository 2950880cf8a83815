//! # Identifier Newtypes
//!
//! Newtype wrappers for every identifier on the board. These prevent
//! accidental identifier confusion: a `PayerId` is not a `CidId`, and
//! neither is a `BedId`.
//!
//! All identifiers are UUID v4 and serialize as the bare UUID string.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::NirError;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = NirError;

            /// Accepts a bare UUID or the prefixed display form.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.trim();
                let raw = raw
                    .strip_prefix(concat!($prefix, ":"))
                    .unwrap_or(raw);
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|e| NirError::InvalidIdentifier {
                        input: s.to_string(),
                        reason: e.to_string(),
                    })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a physical bed.
    BedId,
    "bed"
);
define_id!(
    /// Unique identifier for a hospital sector (ward, ICU, ...).
    SectorId,
    "sector"
);
define_id!(
    /// Unique identifier for one internment episode.
    HistoryId,
    "history"
);
define_id!(
    /// Unique identifier for an audit log entry.
    AuditId,
    "audit"
);
define_id!(
    /// Unique identifier for a payer (health plan, SUS, private).
    PayerId,
    "payer"
);
define_id!(
    /// Unique identifier for a CID (ICD-10 diagnosis code) entry.
    CidId,
    "cid"
);
define_id!(
    /// Unique identifier for a doctor.
    DoctorId,
    "doctor"
);
define_id!(
    /// Unique identifier for a surgical procedure.
    ProcedureId,
    "procedure"
);
