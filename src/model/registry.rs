use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::identity::Identifier;
use crate::model::store::StoreError;

/// One eligible voter, as loaded from the registry dataset.
///
/// Immutable once loaded; there is exactly one identity per identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterIdentity {
    pub identifier: Identifier,
    pub name: String,
    pub dob: NaiveDate,
    pub constituency: String,
}

/// On-disk registry record; the identifier is the map key.
#[derive(Debug, Deserialize)]
struct RegistryRecord {
    name: String,
    dob: NaiveDate,
    constituency: String,
}

/// Static lookup of eligible-voter records, keyed by identifier.
///
/// Loaded once at ignition from a JSON map
/// `identifier -> {name, dob, constituency}` and never mutated afterwards.
/// Whether an identifier has already voted is a ledger concern, not a
/// registry one.
#[derive(Debug)]
pub struct IdentityRegistry {
    voters: HashMap<Identifier, VoterIdentity>,
}

impl IdentityRegistry {
    /// Load the registry dataset from the given path.
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let records: HashMap<Identifier, RegistryRecord> =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                StoreError::Corrupt(format!(
                    "registry dataset {}: {source}",
                    path.display()
                ))
            })?;
        let voters = records
            .into_iter()
            .map(|(identifier, record)| {
                let identity = VoterIdentity {
                    identifier: identifier.clone(),
                    name: record.name,
                    dob: record.dob,
                    constituency: record.constituency,
                };
                (identifier, identity)
            })
            .collect();
        Ok(Self { voters })
    }

    /// Look up a voter by identifier. Pure read, no side effects.
    pub fn lookup(&self, identifier: &Identifier) -> Option<&VoterIdentity> {
        self.voters.get(identifier)
    }

    /// Number of eligible voters in the dataset.
    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }
}
