//! Identity handling for the booking server.
//!
//! Authentication happens upstream of this service. The gateway in front of us terminates the
//! session and forwards the resolved identity as two trusted headers, [`ACTOR_ID_HEADER`] and
//! [`ACTOR_ROLE_HEADER`]. This module only turns that pair into an [`Actor`]; it never validates
//! credentials. Role enforcement lives in [`crate::middleware`], and the engine re-checks resource
//! ownership on every mutation, so a forged id can still only reach its own orders.

use std::{
    future::{ready, Ready},
    str::FromStr,
};

use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpMessage, HttpRequest};
use festa_booking_engine::db_types::{Actor, Role};
use log::*;

use crate::errors::{AuthError, ServerError};

pub const ACTOR_ID_HEADER: &str = "fbs_actor_id";
pub const ACTOR_ROLE_HEADER: &str = "fbs_actor_role";

/// The identity attached to the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorClaims {
    pub actor: Actor,
}

impl ActorClaims {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    /// Parses the forwarded identity headers. Both headers must be present and well-formed;
    /// anything else is an authentication failure, never a guess.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthError> {
        let id = headers.get(ACTOR_ID_HEADER).ok_or(AuthError::MissingIdentity)?;
        let role = headers.get(ACTOR_ROLE_HEADER).ok_or(AuthError::MissingIdentity)?;
        let id = id
            .to_str()
            .map_err(|e| AuthError::MalformedIdentity(e.to_string()))?
            .parse::<i64>()
            .map_err(|e| AuthError::MalformedIdentity(format!("{ACTOR_ID_HEADER} is not a valid id. {e}")))?;
        let role = role
            .to_str()
            .map_err(|e| AuthError::MalformedIdentity(e.to_string()))
            .and_then(|s| Role::from_str(s).map_err(|e| AuthError::MalformedIdentity(e.to_string())))?;
        Ok(Self::new(Actor::new(id, role)))
    }
}

impl FromRequest for ActorClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // The ACL middleware has usually parsed the headers already and left the claims in the
        // request extensions; fall back to the headers for routes it does not wrap.
        if let Some(claims) = req.extensions().get::<ActorClaims>() {
            return ready(Ok(*claims));
        }
        let result = ActorClaims::from_headers(req.headers()).map_err(|e| {
            debug!("💻️ Request presented no usable identity. {e}");
            ServerError::from(e)
        });
        ready(result)
    }
}
