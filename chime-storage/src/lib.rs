pub mod entities;
pub mod error;
pub mod traits;

pub use entities::timer::StoredTimer;
pub use error::StorageError;
pub use traits::timer::TimerStorage;
