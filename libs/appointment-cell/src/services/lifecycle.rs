// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Status machine for appointments: pending is the only state that moves,
/// and it moves exactly once.
pub struct AppointmentLifecycle;

impl AppointmentLifecycle {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {:?} to {:?}", current_status, new_status);

        let valid_transitions = self.get_valid_transitions(current_status);

        if !valid_transitions.contains(new_status) {
            warn!("Invalid status transition attempted: {:?} -> {:?}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition(current_status.clone()));
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Rejected,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Confirmed => vec![],
            AppointmentStatus::Rejected => vec![],
        }
    }

    pub fn is_terminal(&self, status: &AppointmentStatus) -> bool {
        self.get_valid_transitions(status).is_empty()
    }
}

impl Default for AppointmentLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
