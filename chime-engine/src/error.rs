use chime_storage::StorageError;

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EngineError {
    pub fn is_connectivity(&self) -> bool {
        match self {
            EngineError::Storage(e) => e.is_connectivity(),
        }
    }
}
