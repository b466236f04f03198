//! GPIO initialisation, output drivers, and the task watchdog.

pub mod hw_init;
pub mod outputs;
pub mod watchdog;
