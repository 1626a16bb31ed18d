use crate::workflow::runner::Runner;
use bytes::BufMut;
use canopycore::model::AnalysisRequest;
use futures_util::TryStreamExt;
use log::{info, warn};
use serde_json::json;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

/// Largest accepted image upload.
pub const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

fn error_reply(status: StatusCode, message: impl Into<String>) -> WithStatus<Json> {
    warp::reply::with_status(
        warp::reply::json(&json!({ "error": message.into() })),
        status,
    )
}

/// The mock backend's routes:
/// `POST /api/analyze-area`, `POST /api/detect-deforestation`, `GET /health`.
pub fn routes(
    runner: Arc<Runner>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let runner_filter = warp::any().map(move || runner.clone());

    let analyze_route = warp::path!("api" / "analyze-area")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(runner_filter.clone())
        .and_then(|body: bytes::Bytes, runner: Arc<Runner>| async move {
            Ok::<_, Rejection>(analyze_area(&body, &runner).await)
        });

    let image_route = warp::path!("api" / "detect-deforestation")
        .and(warp::post())
        .and(warp::multipart::form().max_length(MAX_UPLOAD_BYTES))
        .and(runner_filter)
        .and_then(|form: FormData, runner: Arc<Runner>| async move {
            Ok::<_, Rejection>(detect_deforestation(form, &runner).await)
        });

    let health_route = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({ "status": "ok" })));

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST"])
        .allow_headers(vec!["content-type"]);

    analyze_route
        .or(image_route)
        .or(health_route)
        .with(cors)
        .recover(handle_rejection)
}

async fn analyze_area(body: &[u8], runner: &Runner) -> WithStatus<Json> {
    let request: AnalysisRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(err) => {
            warn!("rejecting analyze-area request: {}", err);
            return error_reply(StatusCode::BAD_REQUEST, format!("invalid request: {}", err));
        }
    };
    match runner.execute(&request).await {
        Ok(result) => {
            info!(
                "analyze-area {} -> {} sites",
                request.detection_mode.as_str(),
                result.total_sites
            );
            warp::reply::with_status(warp::reply::json(&result), StatusCode::OK)
        }
        Err(err) => {
            warn!("analyze-area failed: {:#}", err);
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err))
        }
    }
}

async fn detect_deforestation(form: FormData, runner: &Runner) -> WithStatus<Json> {
    let upload = match read_file_part(form).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return error_reply(StatusCode::BAD_REQUEST, "No file uploaded"),
        Err(err) => {
            warn!("reading upload failed: {}", err);
            return error_reply(StatusCode::BAD_REQUEST, format!("invalid upload: {}", err));
        }
    };
    let (file_name, bytes) = upload;
    if file_name.is_empty() {
        return error_reply(StatusCode::BAD_REQUEST, "No file selected");
    }
    match runner.analyze_image(&bytes) {
        Ok(analysis) => {
            info!(
                "detect-deforestation {} -> {:.2}%",
                file_name, analysis.deforestation_percentage
            );
            warp::reply::with_status(warp::reply::json(&analysis), StatusCode::OK)
        }
        Err(err) => {
            warn!("image analysis of {} failed: {:#}", file_name, err);
            error_reply(StatusCode::BAD_REQUEST, "Failed to process image")
        }
    }
}

/// Returns the name and contents of the `file` part, if the form has one.
async fn read_file_part(mut form: FormData) -> Result<Option<(String, Vec<u8>)>, warp::Error> {
    while let Some(part) = form.try_next().await? {
        if part.name() != "file" {
            continue;
        }
        let file_name = part.filename().unwrap_or_default().to_string();
        let bytes = collect_part(part).await?;
        return Ok(Some((file_name, bytes)));
    }
    Ok(None)
}

async fn collect_part(part: Part) -> Result<Vec<u8>, warp::Error> {
    part.stream()
        .try_fold(Vec::new(), |mut data, chunk| async move {
            data.put(chunk);
            Ok(data)
        })
        .await
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let reply = if err.is_not_found() {
        error_reply(StatusCode::NOT_FOUND, "not found")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        error_reply(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        error_reply(StatusCode::PAYLOAD_TOO_LARGE, "upload too large")
    } else {
        warn!("rejected request: {:?}", err);
        error_reply(StatusCode::BAD_REQUEST, "malformed request")
    };
    Ok(reply)
}

/// Binds the backend and returns the bound address with the server future.
/// The server stops when `shutdown` resolves.
pub fn bind(
    runner: Arc<Runner>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<(SocketAddr, impl Future<Output = ()>)> {
    let (bound, server) = warp::serve(routes(runner))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|err| anyhow::anyhow!("binding {}: {}", addr, err))?;
    info!("mock analysis backend listening on http://{}", bound);
    Ok((bound, server))
}
