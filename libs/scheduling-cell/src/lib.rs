// libs/scheduling-cell/src/lib.rs
pub mod adapters;
pub mod error;
pub mod handlers;
pub mod models;
pub mod ports;
pub mod router;
pub mod services;

pub use error::*;
pub use models::*;
pub use ports::{AvailabilityPort, PortError, WorkingHoursPolicy};
pub use router::scheduling_routes;
pub use services::SchedulingService;
