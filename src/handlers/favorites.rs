// src/handlers/favorites.rs
// DOCUMENTATION: HTTP handlers for saved restaurants
// PURPOSE: List, toggle and remove favorites

use actix_web::{web, HttpRequest, HttpResponse, Responder};

use super::identity_from;
use crate::errors::RouletteError;
use crate::models::{favorites_feature_collection, ToggleFavoriteRequest, ToggleFavoriteResponse};
use crate::services::RouletteService;

/// GET /favorites
/// Saved list, newest first
pub async fn list_favorites(
    service: web::Data<RouletteService>,
    req: HttpRequest,
) -> Result<impl Responder, RouletteError> {
    let identity = identity_from(&req)?;
    let favorites = service.favorites(&identity).await?;
    Ok(HttpResponse::Ok().json(favorites))
}

/// GET /favorites.geojson
pub async fn favorites_geojson(
    service: web::Data<RouletteService>,
    req: HttpRequest,
) -> Result<impl Responder, RouletteError> {
    let identity = identity_from(&req)?;
    let favorites = service.favorites(&identity).await?;
    Ok(HttpResponse::Ok()
        .content_type("application/geo+json")
        .json(favorites_feature_collection(&favorites)))
}

/// POST /favorites/toggle
/// Save the place if it is not saved, otherwise unsave it
pub async fn toggle_favorite(
    service: web::Data<RouletteService>,
    req: HttpRequest,
    body: web::Json<ToggleFavoriteRequest>,
) -> Result<impl Responder, RouletteError> {
    let identity = identity_from(&req)?;
    let place = body.into_inner().place;

    if place.name.trim().is_empty() || !place.coordinates.is_valid() {
        return Err(RouletteError::InvalidInput(
            "place needs a name and valid coordinates".to_string(),
        ));
    }

    let saved = service.toggle_favorite(&identity, &place).await?;
    Ok(HttpResponse::Ok().json(ToggleFavoriteResponse {
        place_id: place.id,
        saved,
    }))
}

/// DELETE /favorites/{place_id}
pub async fn delete_favorite(
    service: web::Data<RouletteService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<impl Responder, RouletteError> {
    let identity = identity_from(&req)?;
    service.unsave(&identity, &path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configuration for favorites routes
/// Place ids contain a slash (`node/123`), so the delete route takes the tail
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/favorites", web::get().to(list_favorites))
        .route("/favorites.geojson", web::get().to(favorites_geojson))
        .route("/favorites/toggle", web::post().to(toggle_favorite))
        .route("/favorites/{place_id:.*}", web::delete().to(delete_favorite));
}
