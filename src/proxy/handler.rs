use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;
use hyper::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode, Uri};
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::io;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cache::MetadataCache;
use crate::config::Config;
use crate::error::ServiceError;
use crate::youtube::{Extractor, Resolution, SearchResultSummary, SearchService, VideoResolver};

pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;
pub type SharedState = Arc<AppState>;

/// Everything a request handler needs, built once at startup.
pub struct AppState {
    pub config: Config,
    pub cache: MetadataCache,
    pub search: SearchService,
    pub resolver: VideoResolver,
}

impl AppState {
    pub fn new(config: Config, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            cache: MetadataCache::new(config.cache_capacity, config.cache_ttl),
            search: SearchService::new(Arc::clone(&extractor), config.search_limit),
            resolver: VideoResolver::new(extractor, config.info_timeout, config.demo_fallback),
            config,
        }
    }
}

#[derive(Serialize)]
struct SearchResponse<'a> {
    videos: &'a [SearchResultSummary],
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

pub async fn handle_request<B>(
    req: Request<B>,
    state: SharedState,
) -> Result<Response<ResponseBody>, Infallible> {
    let params = query_params(req.uri());
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    drop(req);

    let result = match (&method, path.as_str()) {
        (&Method::GET, "/api/search") => search(&state, &params).await,
        (&Method::GET, "/api/info") => video_info(&state, &params).await,
        (&Method::GET, "/api/download") => download(&state, &params).await,
        (_, "/api/search" | "/api/info" | "/api/download") => Ok(json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorBody {
                error: "Method not allowed".into(),
                details: None,
            },
        )),
        _ => Ok(json_response(
            StatusCode::NOT_FOUND,
            &ErrorBody {
                error: "Not found".into(),
                details: None,
            },
        )),
    };

    Ok(result.unwrap_or_else(|err| error_response(&state, err)))
}

async fn search(
    state: &AppState,
    params: &HashMap<String, String>,
) -> Result<Response<ResponseBody>, ServiceError> {
    let query = required(params, "q").ok_or_else(|| {
        ServiceError::invalid_input("Query parameter 'q' is required")
    })?;

    if let Some(videos) = state.cache.search_results(query).await {
        debug!(query, "search cache hit");
        return Ok(json_response(StatusCode::OK, &SearchResponse { videos: &videos }));
    }

    debug!(query, "search cache miss");
    let videos = state.search.search(query).await?;
    let videos = state.cache.store_search_results(query, videos).await;
    Ok(json_response(StatusCode::OK, &SearchResponse { videos: &videos }))
}

async fn video_info(
    state: &AppState,
    params: &HashMap<String, String>,
) -> Result<Response<ResponseBody>, ServiceError> {
    let url = required(params, "url")
        .ok_or_else(|| ServiceError::invalid_input("URL parameter is required"))?;
    state.resolver.ensure_valid(url)?;

    if let Some(info) = state.cache.video_info(url).await {
        debug!(url, "video info cache hit");
        return Ok(json_response(StatusCode::OK, info.as_ref()));
    }

    match state.resolver.resolve(url).await? {
        Resolution::Extracted(info) => {
            let info = state.cache.store_video_info(url, info).await;
            Ok(json_response(StatusCode::OK, info.as_ref()))
        }
        Resolution::Fallback(info) => Ok(json_response(StatusCode::OK, &info)),
    }
}

async fn download(
    state: &AppState,
    params: &HashMap<String, String>,
) -> Result<Response<ResponseBody>, ServiceError> {
    let (url, itag) = required(params, "url")
        .zip(required(params, "format"))
        .ok_or_else(|| ServiceError::invalid_input("URL and format parameters are required"))?;

    let target = state.resolver.select_download(url, itag).await?;
    let stream = state.resolver.open_download(url, &target).await?;
    info!(url, itag, filename = %target.filename, "streaming download");

    // The first chunk is already in hand. A later error aborts the body so the
    // client sees a broken transfer rather than a short file.
    let logged_url = url.to_string();
    let body = StreamBody::new(
        stream
            .inspect_err(move |err| warn!(url = %logged_url, error = %err, "download stream failed"))
            .map_ok(Frame::data),
    );

    let mut response = Response::new(BodyExt::boxed_unsync(body));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", target.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    let content_type = HeaderValue::from_str(&target.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("video/mp4"));
    response.headers_mut().insert(CONTENT_DISPOSITION, disposition);
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    Ok(response)
}

fn required<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

fn query_params(uri: &Uri) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes()) {
        params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    params
}

fn error_response(state: &AppState, err: ServiceError) -> Response<ResponseBody> {
    let status = err.status();
    if status.is_server_error() {
        error!(error = %err, details = ?err.details(), "request failed");
    } else {
        debug!(error = %err, "rejected request");
    }

    let details = if state.config.expose_error_details() {
        err.details()
    } else {
        None
    };
    json_response(
        status,
        &ErrorBody {
            error: err.to_string(),
            details,
        },
    )
}

fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response<ResponseBody> {
    let (status, body) = match serde_json::to_vec(value) {
        Ok(bytes) => (status, full(bytes)),
        Err(err) => {
            error!(error = %err, "could not serialize response");
            (StatusCode::INTERNAL_SERVER_ERROR, empty())
        }
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn full(bytes: impl Into<Bytes>) -> ResponseBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}
