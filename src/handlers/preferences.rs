// src/handlers/preferences.rs
// DOCUMENTATION: HTTP handlers for food preferences

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

use super::identity_from;
use crate::errors::RouletteError;
use crate::models::UpdatePreferenceRequest;
use crate::services::RouletteService;

/// GET /preferences
pub async fn get_preferences(
    service: web::Data<RouletteService>,
    req: HttpRequest,
) -> Result<impl Responder, RouletteError> {
    let identity = identity_from(&req)?;
    let preference = service.preferences(&identity).await?;
    Ok(HttpResponse::Ok().json(preference))
}

/// PUT /preferences
/// Replace the caller's preferences
pub async fn update_preferences(
    service: web::Data<RouletteService>,
    req: HttpRequest,
    body: web::Json<UpdatePreferenceRequest>,
) -> Result<impl Responder, RouletteError> {
    let identity = identity_from(&req)?;

    if let Err(e) = body.validate() {
        return Err(RouletteError::ValidationError(e.to_string()));
    }

    let preference = body.into_inner().into_preference();
    service.save_preferences(&identity, &preference).await?;
    Ok(HttpResponse::Ok().json(preference))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/preferences")
            .route(web::get().to(get_preferences))
            .route(web::put().to(update_preferences)),
    );
}
