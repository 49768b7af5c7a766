//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                 |
//! |----------------|--------------------|-----------------------------|
//! | `config_file`  | ConfigPort         | JSON / YAML file            |
//! | `log_sink`     | EventSink          | `log` facade                |
//! | `memory`       | DevicePort         | In-memory entity map        |
//! | `state_file`   | DevicePort         | JSON entity file (host sim) |

pub mod config_file;
pub mod log_sink;
pub mod memory;
pub mod state_file;
