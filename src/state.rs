use crate::models::{AppData, BaseData};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub base: Arc<BaseData>,
    pub data: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, base: BaseData, data: AppData) -> Self {
        Self {
            data_path,
            base: Arc::new(base),
            data: Arc::new(Mutex::new(data)),
        }
    }
}
