use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use std::{future::Future, io, net::SocketAddr, sync::Arc};

use crate::error::RequestError;
use crate::http::codec::ConnectionCodec;
use crate::http::{IntoResponse, Request, Response};
use futures_util::{SinkExt, StreamExt};
use http::header::{CONTENT_LENGTH, USER_AGENT};
use http::{header::CONNECTION, HeaderValue, StatusCode};
use tokio::net::ToSocketAddrs;
use tokio::sync::OwnedSemaphorePermit;
use tokio::{net::TcpStream, sync::Semaphore};
use tokio_util::codec::{Decoder, Framed};

type Handler<A, F> = fn(Request, A) -> F;

pub struct Server<A, F> {
    state: A,
    handler: Handler<A, F>,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
}

const PERMITS: usize = 1_000;

impl<S, F> Server<S, F>
where
    S: Clone + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    pub fn new(state: S, handler: Handler<S, F>, timeout: Duration) -> Self {
        Self {
            state,
            handler,
            semaphore: Arc::new(Semaphore::new(PERMITS)),
            timeout,
        }
    }

    pub async fn bind<A: ToSocketAddrs>(self, addr: A) -> io::Result<()> {
        let server = Arc::new(self);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        tracing::info!(target: "listener", ?addr, "server is running");

        let (tx, mut rx) = tokio::sync::mpsc::channel(10_000);
        let pending = Arc::new(AtomicUsize::new(0));
        tokio::spawn({
            let pending = Arc::clone(&pending);
            async move {
                loop {
                    let (socket, addr) = match listener.accept().await {
                        Ok(conn) => conn,
                        Err(err) => {
                            tracing::warn!(target: "listener", %err, "failed to accept connection");
                            continue;
                        }
                    };

                    pending.fetch_add(1, Ordering::Relaxed);
                    if tx.send((socket, addr)).await.is_err() {
                        break;
                    }
                }
            }
        });

        let mut now = Instant::now();
        let mut connections = 0usize;

        while let Some((socket, addr)) = rx.recv().await {
            let permit = server.acquire_permit().await;

            connections += 1;
            let pending = pending.fetch_sub(1, Ordering::Relaxed) - 1;
            if now.elapsed() > Duration::from_secs(1) {
                tracing::debug!(
                    target: "listener",
                    "{connections}/s with {} tasks running, pending connections: {pending}",
                    PERMITS - server.semaphore.available_permits()
                );
                now = Instant::now();
                connections = 0;
            }

            let server = server.clone();
            tokio::spawn(async move {
                let timeout = server.timeout;
                if tokio::time::timeout(timeout, server.handle_request(socket, addr, permit))
                    .await
                    .is_err()
                {
                    tracing::warn!(target: "listener", ?addr, ?timeout, "connection timed out");
                }
            });
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, socket, permit))]
    async fn handle_request(
        self: Arc<Self>,
        socket: TcpStream,
        addr: SocketAddr,
        permit: OwnedSemaphorePermit,
    ) {
        let mut codec = ConnectionCodec::default().framed(socket);
        let req = match codec.next().await.transpose() {
            Ok(Some(req)) => {
                tracing::debug!(?req, "received request");
                req
            }
            Ok(None) => {
                tracing::debug!("connection ended before request");
                return;
            }
            Err(err) => {
                tracing::warn!(%err, "failed to read request");
                reject(&mut codec, &err).await;
                return;
            }
        };

        let user = req
            .headers()
            .get(USER_AGENT)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("Unknown"));
        let method = req.method().clone();
        let path = req.uri().to_string();

        let now = Instant::now();
        let mut resp = (self.handler)(req, self.state.clone()).await;
        let elapsed = now.elapsed();

        let length = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|len| len.to_str().ok().map(str::to_owned))
            .or_else(|| resp.body().as_ref().map(|body| body.len().to_string()))
            .unwrap_or_else(|| "-".into());
        tracing::info!(
            target: "requests",
            %method,
            %path,
            status = resp.status().as_u16(),
            ?user,
            r#""{method} {path}" {} {length} - {elapsed:?}"#, resp.status().as_u16()
        );

        const CLOSE: HeaderValue = HeaderValue::from_static("close");
        resp.headers_mut().append(CONNECTION, CLOSE);

        drop(permit);

        if let Err(err) = codec.send(resp).await {
            tracing::warn!(%err, "failed to send response");
        }
    }

    async fn acquire_permit(&self) -> OwnedSemaphorePermit {
        loop {
            if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
                break permit;
            }

            let mut factor = 1;
            loop {
                const BACKOFF: Duration = Duration::from_millis(50);
                tokio::time::sleep(factor * BACKOFF).await;
                factor *= 2;
                let available_permits = self.semaphore.available_permits();
                if available_permits >= PERMITS / 100 {
                    break;
                }
            }
        }
    }
}

/// Best-effort error response for a request that could not be decoded.
async fn reject(codec: &mut Framed<TcpStream, ConnectionCodec>, err: &RequestError) {
    let status = match err {
        RequestError::Io(_) => return,
        RequestError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        RequestError::UnsupportedVersion => StatusCode::HTTP_VERSION_NOT_SUPPORTED,
        RequestError::HttpError(_)
        | RequestError::Utf8(_)
        | RequestError::HeaderValue(_)
        | RequestError::ContentLength(_)
        | RequestError::InvalidFormat => StatusCode::BAD_REQUEST,
    };

    let mut resp = status.into_response();
    resp.headers_mut()
        .append(CONNECTION, HeaderValue::from_static("close"));

    if let Err(err) = codec.send(resp).await {
        tracing::debug!(%err, "failed to send rejection");
    }
}
