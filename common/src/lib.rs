pub mod config;
pub mod connectivity;
pub mod display;
pub mod interval;
pub mod router;
pub mod sampler;
pub mod telemetry;
pub mod topics;
pub mod types;

pub use config::{MonitorConfig, NetworkConfig, RuntimeConfig};
pub use connectivity::{LinkCommand, LinkSupervisor, NetworkLink, SessionCommand, SessionSupervisor};
pub use display::{DisplayState, NumericDisplay};
pub use interval::IntervalScheduler;
pub use router::{MessageRouter, RouterAction};
pub use sampler::{Sampler, TemperatureSensor};
pub use telemetry::{telemetry_payload, MacAddr, ParseMacError};
pub use topics::*;
pub use types::{Brightness, ConnectivityState};
