//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements    | Connects to                  |
//! |---------------|---------------|------------------------------|
//! | `config_file` | ConfigPort    | JSON file on the host        |
//! | `log_sink`    | EventSink     | `log` facade                 |
//! | `sim`         | SensorPort    | Simulated pack model         |
//! |               | ActuatorPort  |                              |

pub mod config_file;
pub mod log_sink;
pub mod sim;
