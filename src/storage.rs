use crate::errors::DirectoryError;
use crate::models::{AppData, BaseData};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

/// Missing or unreadable files yield an empty document so the service can
/// still start.
async fn load_or_default<T: DeserializeOwned + Default>(path: &Path, what: &str) -> T {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse {what} file {}: {err}", path.display());
                T::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("no {what} file at {}, starting empty", path.display());
            T::default()
        }
        Err(err) => {
            error!("failed to read {what} file {}: {err}", path.display());
            T::default()
        }
    }
}

pub async fn load_base(path: &Path) -> BaseData {
    let base: BaseData = load_or_default(path, "seed").await;
    info!(
        businesses = base.businesses.len(),
        deals = base.deals.len(),
        reviews = base.reviews.len(),
        "base data loaded"
    );
    base
}

pub async fn load_data(path: &Path) -> AppData {
    load_or_default(path, "data").await
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), DirectoryError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "business_directory_{name}_{}_{nanos}.json",
            std::process::id()
        ))
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let data = load_data(&temp_path("missing")).await;
        assert!(data.businesses.custom.is_empty());
        assert!(data.profiles.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_empty() {
        let path = temp_path("corrupt");
        fs::write(&path, b"{ not json").await.unwrap();
        let base = load_base(&path).await;
        assert!(base.businesses.is_empty());
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn persisted_overlay_reloads() {
        let path = temp_path("persist");
        let mut data = AppData::default();
        data.businesses.remove("b1");
        data.profiles.insert("ana".into(), Profile::default());
        persist_data(&path, &data).await.unwrap();

        let loaded = load_data(&path).await;
        assert!(loaded.businesses.deleted.contains("b1"));
        assert!(loaded.profiles.contains_key("ana"));
        let _ = fs::remove_file(&path).await;
    }
}
