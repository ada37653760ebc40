pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Appointment, AppointmentError, AppointmentStatus, ApproveAppointmentRequest,
    BookSlotRequest, Doctor, Modality, Patient, RejectAppointmentRequest,
    RequestAppointmentRequest, Service,
};
pub use services::approval::AppointmentApprovalService;
pub use services::booking::AppointmentBookingService;
pub use services::lifecycle::AppointmentLifecycle;
