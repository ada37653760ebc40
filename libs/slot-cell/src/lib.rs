pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AvailabilitySlot, CreateSlotRequest, SlotError, SlotQuery};
pub use services::registry::SlotRegistryService;
