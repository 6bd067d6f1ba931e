use bytes::Bytes;
use http::{header::HOST, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use url::{Position, Url};

use crate::error::RemoteError;
use crate::runner::Handler;

/// Serves test requests by forwarding them to a running HTTP/1.1 server.
///
/// Every request opens its own connection. The request URI is resolved against the
/// base URL, so `/user/1` with base `http://localhost:8080` goes to
/// `http://localhost:8080/user/1`. Request extensions stay local.
///
/// Transport failures do not panic: they come back as `502 Bad Gateway` with the
/// error text as body, which then shows up as an ordinary status mismatch.
#[derive(Debug)]
pub struct RemoteHandler {
    base: Url,
    runtime: Runtime,
}

impl RemoteHandler {
    pub fn new(base: &str) -> Result<Self, RemoteError> {
        let base = Url::parse(base)?;
        if base.host_str().is_none() {
            return Err(RemoteError::NoHost(base.to_string()));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self { base, runtime })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    async fn fetch(&self, request: Request<Bytes>) -> Result<Response<Bytes>, RemoteError> {
        let url = self.base.join(&request.uri().to_string())?;
        let host = url
            .host_str()
            .ok_or_else(|| RemoteError::NoHost(url.to_string()))?
            .trim_start_matches('[')
            .trim_end_matches(']');
        let port = url.port_or_known_default().unwrap_or(80);

        let stream = TcpStream::connect((host, port)).await?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
        tokio::task::spawn(async move {
            if let Err(err) = conn.await {
                log::warn!("Connection failed: {:?}", err);
            }
        });

        let (parts, body) = request.into_parts();
        let mut outgoing = Request::builder()
            .method(parts.method)
            .uri(&url[Position::BeforePath..Position::AfterQuery])
            .header(HOST, &url[Position::BeforeHost..Position::AfterPort])
            .body(Full::new(body))?;
        for (name, value) in &parts.headers {
            outgoing.headers_mut().append(name, value.clone());
        }

        let res = sender.send_request(outgoing).await?;
        let (parts, body) = res.into_parts();
        let body = body.collect().await?.to_bytes();

        Ok(Response::from_parts(parts, body))
    }
}

impl Handler for RemoteHandler {
    fn serve(&self, request: Request<Bytes>) -> Response<Bytes> {
        let target = format!("{} {}", request.method(), request.uri());

        match self.runtime.block_on(self.fetch(request)) {
            Ok(response) => response,
            Err(err) => {
                log::error!("{target} via {} failed: {err}", self.base);
                let mut response = Response::new(Bytes::from(err.to_string()));
                *response.status_mut() = StatusCode::BAD_GATEWAY;
                response
            }
        }
    }
}
