use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};

use crate::cache::{AssetRequest, CacheController, Fetcher};

const BODY_LIMIT: usize = 10 * 1024 * 1024; // 10 MB

/// Local offline-first gateway: the request-interception boundary between
/// clients and the origin. GETs run through the cache controller's
/// strategies; every other method passes through untouched.
struct Gateway<F: Fetcher> {
    controller: Arc<CacheController<F>>,
    client: reqwest::Client,
}

impl<F: Fetcher> Clone for Gateway<F> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
            client: self.client.clone(),
        }
    }
}

pub fn router<F: Fetcher>(controller: Arc<CacheController<F>>) -> Router {
    let state = Gateway {
        controller,
        client: reqwest::Client::new(),
    };
    Router::new()
        .fallback(intercept::<F>)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .with_state(state)
}

pub async fn start_server<F: Fetcher>(
    controller: Arc<CacheController<F>>,
    port: u16,
    bind: &str,
) -> Result<()> {
    let origin = controller.origin().to_string();
    let app = router(controller);
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, %origin, "offline gateway listening");
    println!("Offline gateway for {origin} listening on http://{addr}");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn intercept<F: Fetcher>(State(gateway): State<Gateway<F>>, request: Request) -> Response {
    if request.method() != Method::GET {
        return pass_through(&gateway, request).await;
    }
    let asset = to_asset_request(gateway.controller.origin(), &request);
    match gateway.controller.handle(&asset).await {
        Ok(cached) => {
            let mut builder = Response::builder().status(cached.status);
            if let Some(ct) = &cached.content_type {
                builder = builder.header(header::CONTENT_TYPE, ct.as_str());
            }
            builder
                .body(Body::from(cached.body))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Err(err) => {
            warn!(url = asset.url, error = %err, "request failed with no cached fallback");
            (StatusCode::BAD_GATEWAY, format!("Upstream unavailable: {err}")).into_response()
        }
    }
}

/// Map an incoming HTTP request onto the controller's request model. The
/// fetch-metadata headers are authoritative when a browser sends them; the
/// extensionless-HTML heuristic covers plain clients.
fn to_asset_request(origin: &str, request: &Request) -> AssetRequest {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map_or("/", axum::http::uri::PathAndQuery::as_str);
    let url = format!("{origin}{path_and_query}");

    let header_str = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    };
    let destination = header_str("sec-fetch-dest")
        .filter(|dest| !dest.is_empty() && *dest != "empty")
        .map(str::to_string);
    let file = request.uri().path().rsplit('/').next().unwrap_or("");
    let navigate = header_str("sec-fetch-mode") == Some("navigate")
        || (destination.is_none()
            && !file.contains('.')
            && header_str("accept").is_some_and(|accept| accept.contains("text/html")));

    AssetRequest {
        url,
        navigate,
        destination,
    }
}

/// Only GET is intercepted; everything else is forwarded to the origin and
/// relayed back as-is.
async fn pass_through<F: Fetcher>(gateway: &Gateway<F>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or("/", axum::http::uri::PathAndQuery::as_str);
    let url = format!("{}{}", gateway.controller.origin(), path_and_query);

    let bytes = match axum::body::to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
    };

    let mut upstream = gateway.client.request(parts.method, url);
    if let Some(ct) = parts.headers.get(header::CONTENT_TYPE) {
        upstream = upstream.header(header::CONTENT_TYPE, ct.clone());
    }

    let response = match upstream.body(bytes.to_vec()).send().await {
        Ok(response) => response,
        Err(err) => {
            return (StatusCode::BAD_GATEWAY, format!("Upstream unavailable: {err}"))
                .into_response();
        }
    };

    let status = response.status();
    let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
    match response.bytes().await {
        Ok(body) => {
            let mut builder = Response::builder().status(status);
            if let Some(ct) = content_type {
                builder = builder.header(header::CONTENT_TYPE, ct);
            }
            builder
                .body(Body::from(body.to_vec()))
                .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
        }
        Err(err) => {
            (StatusCode::BAD_GATEWAY, format!("Upstream unavailable: {err}")).into_response()
        }
    }
}
