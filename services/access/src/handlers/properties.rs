use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use keyhold_auth_types::identity::IdentityHeaders;
use keyhold_domain::id::{PropertyId, UserId};

use crate::domain::types::Property;
use crate::error::AccessServiceError;
use crate::state::AppState;
use crate::usecase::property::{
    CreatePropertyInput, CreatePropertyUseCase, ListPropertiesUseCase,
};

#[derive(Serialize)]
pub struct PropertyResponse {
    pub id: PropertyId,
    pub owner_id: UserId,
    pub name: String,
    pub address: String,
    pub image_ref: Option<String>,
    #[serde(serialize_with = "keyhold_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Property> for PropertyResponse {
    fn from(property: Property) -> Self {
        Self {
            id: property.id,
            owner_id: property.owner_id,
            name: property.name,
            address: property.address,
            image_ref: property.image_ref,
            created_at: property.created_at,
        }
    }
}

// ── POST /properties ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreatePropertyRequest {
    pub name: String,
    pub address: String,
    pub image_ref: Option<String>,
}

pub async fn create_property(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Json(body): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<PropertyResponse>), AccessServiceError> {
    let usecase = CreatePropertyUseCase {
        users: state.user_repo(),
        properties: state.property_repo(),
    };
    let property = usecase
        .execute(
            identity.user_id,
            CreatePropertyInput {
                name: body.name,
                address: body.address,
                image_ref: body.image_ref,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(property.into())))
}

// ── GET /properties ──────────────────────────────────────────────────────────

pub async fn list_properties(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<Vec<PropertyResponse>>, AccessServiceError> {
    let usecase = ListPropertiesUseCase {
        users: state.user_repo(),
        properties: state.property_repo(),
    };
    let properties = usecase.execute(identity.user_id).await?;
    Ok(Json(properties.into_iter().map(Into::into).collect()))
}
