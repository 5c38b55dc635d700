// src/handlers/restaurants.rs
// DOCUMENTATION: HTTP handlers for nearby discovery
// PURPOSE: Preference-filtered nearby restaurants as JSON or GeoJSON

use actix_web::{web, HttpRequest, HttpResponse, Responder};

use super::identity_from;
use crate::errors::RouletteError;
use crate::models::LocationQuery;
use crate::services::RouletteService;

/// GET /restaurants/nearby
/// Places matching the caller's preferences, with distance from the caller
pub async fn nearby(
    service: web::Data<RouletteService>,
    req: HttpRequest,
    query: web::Query<LocationQuery>,
) -> Result<impl Responder, RouletteError> {
    let identity = identity_from(&req)?;
    let result = service
        .nearby_with_distance(&identity, query.coordinates()?)
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

/// GET /restaurants/nearby.geojson
/// Same places as a FeatureCollection for map views
pub async fn nearby_geojson(
    service: web::Data<RouletteService>,
    req: HttpRequest,
    query: web::Query<LocationQuery>,
) -> Result<impl Responder, RouletteError> {
    let identity = identity_from(&req)?;
    let result = service
        .nearby_with_distance(&identity, query.coordinates()?)
        .await?;
    Ok(HttpResponse::Ok()
        .content_type("application/geo+json")
        .json(result.to_feature_collection()))
}

/// Configuration for discovery routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/restaurants")
            .route("/nearby", web::get().to(nearby))
            .route("/nearby.geojson", web::get().to(nearby_geojson)),
    );
}
