// libs/slot-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreateSlotRequest, SlotError, SlotQuery};
use crate::services::registry::SlotRegistryService;

fn map_slot_error(error: SlotError) -> AppError {
    match error {
        SlotError::NotFound => AppError::NotFound("Slot not found".to_string()),
        SlotError::InvalidTimeRange(msg) => AppError::Validation(msg),
        SlotError::Overlap => {
            AppError::BadRequest("Slot overlaps an existing availability window".to_string())
        },
        SlotError::InUse => {
            AppError::BadRequest("Slot has pending or confirmed appointments".to_string())
        },
        SlotError::Validation(msg) => AppError::Validation(msg),
        SlotError::Database(msg) => AppError::Internal(msg),
    }
}

#[axum::debug_handler]
pub async fn create_slot(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if !user.is_staff() {
        return Err(AppError::Auth("Only doctors and admins can create slots".to_string()));
    }

    // Doctors publish their own schedule; admins publish on behalf of one
    let doctor_id = match request.doctor_id {
        Some(id) => {
            if !user.is_admin() && id.to_string() != user.id {
                return Err(AppError::Auth(
                    "Not authorized to create slots for another doctor".to_string(),
                ));
            }
            id
        },
        None => Uuid::parse_str(&user.id)
            .map_err(|_| AppError::Validation("doctor_id is required".to_string()))?,
    };

    let registry = SlotRegistryService::new(&state);
    let slot = registry.create_slot(doctor_id, request, token).await
        .map_err(map_slot_error)?;

    Ok(Json(json!({
        "success": true,
        "slot": slot,
        "message": "Slot created successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_slot(
    State(state): State<Arc<AppConfig>>,
    Path(slot_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let registry = SlotRegistryService::new(&state);
    let slot = registry.get_slot(slot_id, auth.token()).await
        .map_err(map_slot_error)?;

    Ok(Json(json!(slot)))
}

#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<SlotQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let registry = SlotRegistryService::new(&state);
    let slots = registry.list_slots(query, auth.token()).await
        .map_err(map_slot_error)?;

    let count = slots.len();
    Ok(Json(json!({
        "slots": slots,
        "count": count
    })))
}

#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<AppConfig>>,
    Path(slot_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if !user.is_staff() {
        return Err(AppError::Auth("Only doctors and admins can delete slots".to_string()));
    }

    let registry = SlotRegistryService::new(&state);

    if !user.is_admin() {
        let slot = registry.get_slot(slot_id, token).await.map_err(map_slot_error)?;
        if slot.doctor_id.to_string() != user.id {
            return Err(AppError::Auth(
                "Not authorized to delete another doctor's slot".to_string(),
            ));
        }
    }

    registry.delete_slot(slot_id, token).await.map_err(map_slot_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Slot deleted successfully"
    })))
}
