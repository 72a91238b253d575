pub mod db;

pub mod models {
    pub mod timer;
}

pub mod crud {
    pub mod timer_crud;
}

pub mod persistence {
    pub mod timer;
}

pub use persistence::timer::TimerPersistence;
