use std::future::Future;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::Uri;
use actix_web::http::header::{self, HeaderName, HeaderValue};
use actix_web::test::{self, TestRequest};

use super::multipart::MultipartBody;
use super::{CapturedResponse, RequestContext};
use crate::error::{HarnessError, HarnessResult};

/// The raw "issue one request" primitive the client builds on.
///
/// Implementations perform exactly one round trip and never follow redirects
/// themselves.
pub trait RequestDispatcher {
    fn dispatch(
        &self,
        request: &RequestContext,
    ) -> impl Future<Output = HarnessResult<CapturedResponse>>;
}

/// Dispatches requests into an actix-web service created with
/// `actix_web::test::init_service`.
pub struct ActixDispatcher<S> {
    service: S,
}

impl<S> ActixDispatcher<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

impl<S, B> RequestDispatcher for ActixDispatcher<S>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    async fn dispatch(&self, request: &RequestContext) -> HarnessResult<CapturedResponse> {
        let req = build_request(request)?;
        log::debug!("Dispatching {} {}", request.method, request.uri);

        let response = test::try_call_service(&self.service, req)
            .await
            .map_err(|e| HarnessError::Dispatch(e.to_string()))?;

        capture(response).await
    }
}

/// Translate a [`RequestContext`] into an actix test request.
///
/// Parameters go into the query string for GET-like methods and into a form
/// body otherwise. Files switch the body to multipart. A raw body wins over
/// both.
pub(crate) fn build_request(ctx: &RequestContext) -> HarnessResult<Request> {
    let in_query = ctx.parameters_in_query();

    let mut uri = ctx.uri.clone();
    if in_query && !ctx.parameters.is_empty() {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&ctx.parameters)
            .finish();
        uri.push(if uri.contains('?') { '&' } else { '?' });
        uri.push_str(&query);
    }

    uri.parse::<Uri>().map_err(|e| HarnessError::InvalidUri {
        uri: uri.clone(),
        message: e.to_string(),
    })?;

    let mut req = TestRequest::default().method(ctx.method.clone()).uri(&uri);

    for (name, value) in ctx.server.headers() {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| HarnessError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| HarnessError::InvalidHeader {
            name: name.clone(),
            message: e.to_string(),
        })?;
        req = req.insert_header((header_name, header_value));
    }

    if let Some(addr) = ctx.server.remote_addr()? {
        req = req.peer_addr(addr);
    }

    let form_fields: &[(String, String)] = if in_query { &[] } else { &ctx.parameters };

    if let Some(body) = &ctx.body {
        req = req.set_payload(body.clone());
    } else if !ctx.files.is_empty() {
        let multipart = MultipartBody::encode(form_fields, &ctx.files);
        req = req
            .insert_header((header::CONTENT_TYPE, multipart.content_type()))
            .set_payload(multipart.into_bytes());
    } else if !form_fields.is_empty() {
        req = req.set_form(form_fields);
    }

    Ok(req.to_request())
}

async fn capture<B: MessageBody>(response: ServiceResponse<B>) -> HarnessResult<CapturedResponse> {
    let mut captured = CapturedResponse::new(response.status());
    for (name, value) in response.headers().iter() {
        let value = value
            .to_str()
            .map(str::to_owned)
            .unwrap_or_else(|_| String::from_utf8_lossy(value.as_bytes()).into_owned());
        captured = captured.with_header(name.as_str(), value);
    }

    let body = test::try_read_body(response).await.map_err(|e| {
        let err: Box<dyn std::error::Error> = e.into();
        HarnessError::Body(err.to_string())
    })?;

    Ok(captured.with_body(body))
}
