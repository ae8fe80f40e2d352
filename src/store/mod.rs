pub mod records;
pub mod users;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppError;
use crate::loader::LoadError;

pub use records::{DepositQuery, MineralQuery, RecordStore};
pub use users::AccountStore;

/// Read a JSON array from disk. `Ok(None)` means the file does not exist yet.
pub async fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>, LoadError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// Write a JSON array to disk through a temporary sibling file and a rename,
/// so readers never observe a half-written collection.
pub async fn write_collection<T: Serialize>(path: &Path, items: &[T]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let body = serde_json::to_vec_pretty(items)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
