pub mod choice;
pub mod event;
pub mod level;
pub mod replay;
pub mod save;
pub mod session;
pub mod shared;
pub mod snapshot;
pub mod tutorial;
