pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod value;

pub use clock::{Clock, FixedClock, SystemClock, CLOCK_SKEW_TOLERANCE};
pub use config::VigilConfig;
pub use error::{RecoveryAction, VigilError};
pub use value::{metadata_keys, Metadata, Value};
