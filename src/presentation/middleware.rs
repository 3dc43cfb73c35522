use crate::domain::user::UserSummary;
use crate::infrastructure::security::parse_basic_auth;
use crate::presentation::handlers::{ApiError, AppState};
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::{EitherBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{AUTHORIZATION, HeaderName, HeaderValue},
    middleware::Next,
    web,
};
use std::{
    future::{Ready, ready},
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
    time::Instant,
};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

/// The user resolved by [`BasicAuthMiddleware`] for the current request.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub UserSummary);

impl AuthenticatedUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
const RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");

/// Tags every request with a correlation id and reports how long it took.
///
/// An `x-request-id` set by a proxy in front of the service is kept. Handler
/// logs run inside a `request` span carrying the id. Mount with
/// `App::wrap(from_fn(track_request))`.
pub async fn track_request(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let request_id = req
        .headers()
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.path(),
    );

    let started = Instant::now();
    let mut res = next.call(req).instrument(span.clone()).await?;
    let elapsed_ms = started.elapsed().as_millis();

    let headers = res.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        headers.insert(REQUEST_ID, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("{elapsed_ms}ms")) {
        headers.insert(RESPONSE_TIME, value);
    }

    span.in_scope(|| info!(status = res.status().as_u16(), elapsed_ms, "Request processed"));
    Ok(res)
}

/// Guards a route with HTTP basic authentication.
///
/// On success the user is stored as [`AuthenticatedUser`] in the request
/// extensions; any failure short-circuits with `401 Access Denied`.
pub struct BasicAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for BasicAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = BasicAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BasicAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct BasicAuthMiddlewareService<S> {
    service: Rc<S>,
}

async fn authenticate(req: &ServiceRequest) -> Result<AuthenticatedUser, ApiError> {
    let Some(header) = req.headers().get(AUTHORIZATION) else {
        warn!(path = %req.path(), "Auth header not found");
        return Err(ApiError::unauthorized());
    };
    let credentials = match header.to_str().ok().map(parse_basic_auth) {
        Some(Ok(credentials)) => credentials,
        Some(Err(e)) => {
            warn!(error = %e, "Malformed auth header");
            return Err(ApiError::unauthorized());
        }
        None => {
            warn!("Auth header is not visible ASCII");
            return Err(ApiError::unauthorized());
        }
    };

    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("application state is not configured".to_string()))?;

    let user = state.auth_service.authenticate(&credentials).await?;
    Ok(AuthenticatedUser(UserSummary::from(&user)))
}

impl<S, B> Service<ServiceRequest> for BasicAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            match authenticate(&req).await {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => {
                    let response = err.error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}
