use zipcast_core::{AppError, StorageError};
use zipcast_weather::StoreError;

use super::IntoAppError;

impl IntoAppError for StoreError {
    fn into_app_error(self) -> AppError {
        match self {
            StoreError::Corrupt { .. } => {
                AppError::Storage(StorageError::Corruption(self.to_string()))
            }
            StoreError::Io(_) | StoreError::Serialize(_) => {
                AppError::Storage(StorageError::WriteFailed(self.to_string()))
            }
        }
    }
}
