// src/handlers/identity.rs
// DOCUMENTATION: Authenticated identity extraction
// PURPOSE: Read the identity the upstream auth gateway attaches to each request

use actix_web::HttpRequest;
use uuid::Uuid;

use crate::errors::RouletteError;
use crate::models::Identity;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_EMAIL_HEADER: &str = "X-User-Email";

/// Identity from request headers
/// A missing or malformed user id means the caller is unauthenticated
pub fn identity_from(req: &HttpRequest) -> Result<Identity, RouletteError> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .ok_or_else(|| {
            log::warn!("Request to {} without a valid user id", req.path());
            RouletteError::AuthRequired
        })?;

    let email = req
        .headers()
        .get(USER_EMAIL_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();

    Ok(Identity { user_id, email })
}
