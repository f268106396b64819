//! Repository settings supplied by the host application.

use serde::Deserialize;

use crate::repository::{ReadOptions, SetOptions, WriteOptions};

fn enabled() -> bool {
    true
}

/// Collection name and timestamp defaults for one repository.
///
/// Deserializes from whatever format the application loads its settings from:
///
/// ```json
/// { "collection": "users", "timestamps": false }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryConfig {
    pub collection: String,
    #[serde(default = "enabled")]
    pub timestamps: bool,
}

impl RepositoryConfig {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            timestamps: true,
        }
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            timestamps: self.timestamps,
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            timestamps: self.timestamps,
        }
    }

    pub fn set_options(&self) -> SetOptions {
        SetOptions::from(self.write_options())
    }
}
