//! Header-based identity extraction.
//!
//! Authentication is an external collaborator; by the time a request reaches
//! this service, a gateway has resolved the caller and stamped two opaque
//! headers: `x-user-id` (the human) and `x-acting-profile` (the business
//! profile they act for). This extractor turns them into an [`Actor`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{Actor, ProfileId, UserId};
use uuid::Uuid;

use crate::error::ApiError;

/// Headers carrying the resolved caller identity.
pub const USER_HEADER: &str = "x-user-id";
pub const PROFILE_HEADER: &str = "x-acting-profile";

/// The authenticated caller, extracted from the identity headers.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Actor);

fn header_uuid(parts: &Parts, name: &str) -> Result<Uuid, ApiError> {
    let value = parts
        .headers
        .get(name)
        .ok_or_else(|| ApiError::Unidentified(format!("missing {name} header")))?;
    let value = value
        .to_str()
        .map_err(|_| ApiError::Unidentified(format!("malformed {name} header")))?;
    Uuid::parse_str(value).map_err(|_| ApiError::Unidentified(format!("malformed {name} header")))
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = UserId::from_uuid(header_uuid(parts, USER_HEADER)?);
        let profile = ProfileId::from_uuid(header_uuid(parts, PROFILE_HEADER)?);
        Ok(Identity(Actor { user, profile }))
    }
}
