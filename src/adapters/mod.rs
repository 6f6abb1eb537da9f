//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements                 | Connects to                    |
//! |-----------------|----------------------------|--------------------------------|
//! | `hardware`      | BusTransport, ClockPort    | I²C master (ESP-IDF / sim)     |
//! | `outputs`       | IndicatorPort              | RGB status LED                 |
//! |                 | DisplayPort, RecordPort    | display and recorder below     |
//! | `display`       | DisplayPort                | Text console                   |
//! | `record_worker` | RecordPort                 | Background writer thread       |
//! | `csv_log`       | RecordPort                 | Append-only CSV file (SD card) |
//! | `log_sink`      | EventSink                  | Serial log output              |
//! | `time`          | —                          | Monotonic uptime               |
//! | `sim_bus`       | `embedded_hal::i2c::I2c`   | Simulated slaves + DS3231      |

pub mod csv_log;
pub mod display;
pub mod hardware;
pub mod log_sink;
pub mod outputs;
pub mod record_worker;
#[cfg(not(target_os = "espidf"))]
pub mod sim_bus;
pub mod time;
