// src/handlers/roulette.rs
// DOCUMENTATION: HTTP handlers for the roulette
// PURPOSE: Wheel pool, spins and quota status

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Serialize;

use super::identity_from;
use crate::errors::RouletteError;
use crate::models::{LocationQuery, Place};
use crate::services::RouletteService;

/// Response for GET /roulette/pool
#[derive(Debug, Serialize)]
pub struct PoolResponse {
    pub segments: Vec<Place>,
    pub total: usize,
}

/// GET /roulette/pool
/// Wheel segments the next spin would draw from
pub async fn get_pool(
    service: web::Data<RouletteService>,
    req: HttpRequest,
    query: web::Query<LocationQuery>,
) -> Result<impl Responder, RouletteError> {
    let identity = identity_from(&req)?;
    let segments = service
        .candidate_pool(&identity, query.coordinates()?)
        .await?;
    Ok(HttpResponse::Ok().json(PoolResponse {
        total: segments.len(),
        segments,
    }))
}

/// POST /roulette/spin
/// Body `{lat, lng}`; send `{}` to spin at the last known location
pub async fn spin(
    service: web::Data<RouletteService>,
    req: HttpRequest,
    body: web::Json<LocationQuery>,
) -> Result<impl Responder, RouletteError> {
    let identity = identity_from(&req)?;
    let reported = body.coordinates()?;

    let outcome = service.spin_nearby(&identity, reported).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// GET /quota
pub async fn get_quota(
    service: web::Data<RouletteService>,
    req: HttpRequest,
) -> Result<impl Responder, RouletteError> {
    let identity = identity_from(&req)?;
    let quota = service.quota_status(&identity).await?;
    Ok(HttpResponse::Ok().json(quota))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/roulette")
            .route("/pool", web::get().to(get_pool))
            .route("/spin", web::post().to(spin)),
    )
    .route("/quota", web::get().to(get_quota));
}
