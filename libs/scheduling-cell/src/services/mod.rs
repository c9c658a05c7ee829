pub mod bulk_checker;
pub mod deadline;
pub mod interval;
pub mod resolver;
pub mod scheduling;
pub mod slot_checker;
pub mod working_hours;

pub use bulk_checker::BulkSlotChecker;
pub use deadline::Deadline;
pub use resolver::ConflictResolver;
pub use scheduling::SchedulingService;
pub use slot_checker::SlotChecker;
pub use working_hours::StandardWorkingHours;
