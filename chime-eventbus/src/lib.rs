pub mod core {
    pub mod bus;
}

pub mod impls {
    pub mod local;
}

pub mod error;

pub use core::bus::{EventBus, TimerFired};
pub use error::EventBusError;
pub use impls::local::LocalEventBus;
