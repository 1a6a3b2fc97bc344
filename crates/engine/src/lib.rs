//! Simulation and crop lifecycle engine for the AirMind hydroponic tower.
//!
//! The engine is synchronous and free of I/O.  A host (the hub) owns one
//! [`Session`], feeds it timer ticks and operator actions, and renders
//! [`Snapshot`]s.

pub mod assistant;
pub mod catalog;
pub mod control;
pub mod error;
pub mod lifecycle;
pub mod session;
pub mod sim;
pub mod status;

pub use catalog::{Catalog, CropProfile};
pub use control::ControlState;
pub use error::EngineError;
pub use lifecycle::LifecycleState;
pub use session::{Notice, NoticeKind, Session, SessionSettings, Snapshot};
pub use sim::{FastrandNoise, NoiseSource, SensorReading, SensorSimulator, SimParams};
pub use status::{Evaluation, Status, Thresholds};
