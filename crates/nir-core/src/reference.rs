//! # Reference Tables
//!
//! Flat, id-keyed lookup records: sectors, payers, CIDs, doctors and
//! procedures. None of them has a lifecycle beyond create and delete.
//! Constructors validate the required text fields.

use serde::{Deserialize, Serialize};

use crate::error::{require_text, ValidationError};
use crate::identity::{CidId, DoctorId, PayerId, ProcedureId, SectorId};

/// A hospital sector grouping beds (ward, ICU, emergency...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub id: SectorId,
    pub name: String,
    /// Short code shown on the board (e.g. "UTI-A").
    pub code: String,
    /// Display order; lower sorts first.
    pub order: i32,
}

impl Sector {
    pub fn new(name: &str, code: &str, order: i32) -> Result<Self, ValidationError> {
        Ok(Self {
            id: SectorId::new(),
            name: require_text("name", name)?,
            code: require_text("code", code)?,
            order,
        })
    }
}

/// A payer: health plan, public system or private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    pub id: PayerId,
    pub name: String,
}

impl Payer {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id: PayerId::new(),
            name: require_text("name", name)?,
        })
    }
}

/// A CID (ICD-10) diagnosis code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cid {
    pub id: CidId,
    pub code: String,
    pub description: String,
}

impl Cid {
    pub fn new(code: &str, description: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id: CidId::new(),
            code: require_text("code", code)?.to_uppercase(),
            description: require_text("description", description)?,
        })
    }

    /// `"J18.9 - Pneumonia"` style label.
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.description)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
}

impl Doctor {
    pub fn new(name: &str, specialty: Option<&str>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: DoctorId::new(),
            name: require_text("name", name)?,
            specialty: specialty
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    pub id: ProcedureId,
    pub name: String,
}

impl Procedure {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id: ProcedureId::new(),
            name: require_text("name", name)?,
        })
    }
}

/// Procedures a fresh store starts with.
pub fn default_procedures() -> Vec<Procedure> {
    [
        "Apendicectomia",
        "Colecistectomia",
        "Angioplastia Coronária",
        "Artroplastia de Quadril",
    ]
    .into_iter()
    .map(|name| Procedure {
        id: ProcedureId::new(),
        name: name.to_string(),
    })
    .collect()
}
