//! Access control middleware for the Festa Booking Server.
//! This middleware can be placed on any route or service.
//!
//! It parses the forwarded identity headers into an [`ActorClaims`] and checks the resolved role
//! against the roles the route accepts. Requests without a usable identity are rejected with a
//! 401 response; requests whose role is not on the list are rejected with a 403 response. Admins
//! pass every role check. On success the claims are stored in the request extensions so that
//! handlers do not have to parse the headers a second time.

use std::pin::Pin;
use std::rc::Rc;

use actix_web::dev::{forward_ready, Service, Transform};
use actix_web::{dev::ServiceRequest, dev::ServiceResponse, Error, HttpMessage};
use festa_booking_engine::db_types::Role;
use futures::future::{ok, Ready};
use futures::Future;

use crate::auth::ActorClaims;
use crate::errors::ServerError;

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
    where
        S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
        S::Future: 'static,
        B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService {
            required_roles: self.required_roles.clone(),
            service: Rc::new(service),
        })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
    where
        S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
        S::Future: 'static,
        B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let claims = ActorClaims::from_headers(req.headers()).map_err(|e| {
                log::debug!("Rejecting request without a usable identity. {e}");
                Error::from(ServerError::AuthenticationError(e))
            })?;
            if claims.actor.is_admin() || required_roles.contains(&claims.actor.role) {
                req.extensions_mut().insert(claims);
                service.call(req).await
            } else {
                log::debug!("{} does not hold any of the roles this route accepts", claims.actor);
                Err(ServerError::InsufficientPermissions(format!("{} may not access this endpoint", claims.actor))
                    .into())
            }
        })
    }
}
