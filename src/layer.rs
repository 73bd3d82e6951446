use futures_util::{future::BoxFuture, Future};
use http::{header::CONTENT_TYPE, HeaderValue, Request, Response, StatusCode};
use pin_project::pin_project;

use std::{
    marker::PhantomData,
    pin::Pin,
    task::{ready, Context, Poll},
};

use bytes::Bytes;
use tower::{Layer, Service};

use crate::provider::{IssuedToken, TokenIntent, TokenProvider};

trait IssueToken<ReqBody, ResBody> {
    type Future: Future<Output = Response<ResBody>>;

    fn issue(&mut self, request: Request<ReqBody>, intent: TokenIntent) -> Self::Future;
}

impl<S, ReqBody, ResBody> IssueToken<ReqBody, ResBody> for TokenProviderService<S, ResBody>
where
    ReqBody: http_body::Body + Send + 'static,
    ReqBody::Data: Send,
    ReqBody::Error: Send,
    ResBody: From<Bytes> + Send + 'static,
{
    type Future = BoxFuture<'static, Response<ResBody>>;

    fn issue(&mut self, request: Request<ReqBody>, intent: TokenIntent) -> Self::Future {
        let provider = self.provider.clone();
        Box::pin(async move {
            match provider.handle_request(intent, request).await {
                Ok(token) => token_response(&token),
                Err(error) => error.into(),
            }
        })
    }
}

pub struct TokenProviderLayer<ResBody> {
    provider: TokenProvider,
    phantom: PhantomData<fn() -> ResBody>,
}

impl<ResBody> Clone for TokenProviderLayer<ResBody> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            phantom: PhantomData,
        }
    }
}

impl<S, ResBody> Layer<S> for TokenProviderLayer<ResBody> {
    type Service = TokenProviderService<S, ResBody>;

    fn layer(&self, inner: S) -> Self::Service {
        TokenProviderService::new(inner, self.provider.clone())
    }
}

impl<ResBody> TokenProviderLayer<ResBody> {
    pub(crate) fn new(provider: TokenProvider) -> Self {
        TokenProviderLayer {
            provider,
            phantom: PhantomData,
        }
    }
}

pub struct TokenProviderService<S, ResBody> {
    inner: S,
    provider: TokenProvider,
    phantom: PhantomData<fn() -> ResBody>,
}

impl<S, ResBody> Clone for TokenProviderService<S, ResBody>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            provider: self.provider.clone(),
            phantom: PhantomData,
        }
    }
}

impl<S, ResBody> TokenProviderService<S, ResBody> {
    fn new(inner: S, provider: TokenProvider) -> Self {
        Self {
            inner,
            provider,
            phantom: PhantomData,
        }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for TokenProviderService<S, ResBody>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ReqBody: http_body::Body + Send + 'static,
    ReqBody::Data: Send,
    ReqBody::Error: Send,
    ResBody: From<Bytes> + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future, ResBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        match self.provider.classify(request.uri().path()) {
            Some(intent) => ResponseFuture {
                state: State::Issue {
                    issue: self.issue(request, intent),
                },
            },
            None => ResponseFuture {
                state: State::Forward {
                    fut: self.inner.call(request),
                },
            },
        }
    }
}

#[pin_project]
pub struct ResponseFuture<F, ResBody> {
    #[pin]
    state: State<BoxFuture<'static, Response<ResBody>>, F>,
}

#[pin_project(project = StateProj)]
enum State<I, F> {
    /// The request matched one of the token paths; the provider produces
    /// the whole response and the inner service is never called.
    Issue {
        #[pin]
        issue: I,
    },
    /// Any other path is delegated unchanged.
    Forward {
        #[pin]
        fut: F,
    },
}

impl<F, ResBody, E> Future for ResponseFuture<F, ResBody>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = Result<Response<ResBody>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        match this.state.project() {
            StateProj::Issue { issue } => {
                let response = ready!(issue.poll(cx));
                Poll::Ready(Ok(response))
            }
            StateProj::Forward { fut } => fut.poll(cx),
        }
    }
}

fn token_response<B>(token: &IssuedToken) -> Response<B>
where
    B: From<Bytes>,
{
    let body = serde_json::to_vec(token).unwrap_or_default();
    let mut response = Response::builder()
        .status(StatusCode::OK)
        .body(B::from(Bytes::from(body)))
        .unwrap();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
