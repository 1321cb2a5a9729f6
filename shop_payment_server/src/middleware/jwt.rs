//! JWT verification middleware.
//!
//! Wraps a scope and checks every incoming request for a `Bearer` access token in the
//! `Authorization` header. If the token verifies, the claims are stored in the request extensions
//! for the ACL middleware and the handlers to read. Otherwise a 401 Unauthorized response is
//! returned before the request reaches any handler.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};

use crate::{auth::validate_token, config::AuthConfig, errors::AuthError, errors::ServerError};

pub struct JwtMiddlewareFactory {
    auth_config: AuthConfig,
}

impl JwtMiddlewareFactory {
    pub fn new(auth_config: AuthConfig) -> Self {
        JwtMiddlewareFactory { auth_config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { auth_config: self.auth_config.clone(), service: Rc::new(service) })
    }
}

pub struct JwtMiddlewareService<S> {
    auth_config: AuthConfig,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
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
        let auth_config = self.auth_config.clone();
        Box::pin(async move {
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty());
            let token = match token {
                Some(t) => t,
                None => return Err(ServerError::AuthenticationError(AuthError::MissingToken).into()),
            };
            match validate_token(token, &auth_config) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    service.call(req).await
                },
                Err(e) => {
                    log::debug!("💻️ Rejecting request with invalid access token. {e}");
                    Err(ServerError::AuthenticationError(e).into())
                },
            }
        })
    }
}
