//! Metadata storage trait.

use crate::StoreError;

/// Bookkeeping values that live outside the document collections, such as
/// the schema version.
pub trait MetaStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stored schema version; 0 for a database that has never been migrated.
    fn get_schema_version(&self) -> Result<u32, StoreError> {
        match self.get_meta(SCHEMA_VERSION_KEY)? {
            None => Ok(0),
            Some(bytes) => {
                let raw: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Serialization(format!(
                        "{SCHEMA_VERSION_KEY} is {} bytes, expected 4",
                        bytes.len()
                    ))
                })?;
                Ok(u32::from_le_bytes(raw))
            }
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.put_meta(SCHEMA_VERSION_KEY, &version.to_le_bytes())
    }
}

pub const SCHEMA_VERSION_KEY: &str = "schema_version";
