pub mod timer;

pub use timer::TimerStorage;
