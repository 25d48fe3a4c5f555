pub mod env;
pub mod event;
pub mod replay;
pub mod runner;
pub mod scheduler;
