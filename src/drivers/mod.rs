//! Output drivers, hardware initialisation, thread pinning, and the task watchdog.

pub mod hw_init;
pub mod indicator;
pub mod status_led;
pub mod task_pin;
pub mod watchdog;
