use crate::frontend::interface::Frontend;
use crate::frontend::render::{
    error_outcome, prediction_outcome, results_heading, subtitle, upload_error_outcome, Outcome,
    IMAGE_CAPTION, IMAGE_WIDTH, TITLE,
};
use crate::library::logger::interface::Logger;
use crate::model_holder::ModelHolder;
use crate::prediction::decode_image;
use crate::upload::Upload;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::error::Error;
use std::fmt::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const UPLOAD_FIELD: &str = "image";
const FILE_NAME_FIELD: &str = "file_name";
const IMAGE_DATA_FIELD: &str = "image_data";

#[derive(Clone)]
struct WebState {
    holder: Arc<Mutex<ModelHolder>>,
    top_k: usize,
    logger: Arc<dyn Logger + Send + Sync>,
}

pub struct FrontendWeb {
    addr: SocketAddr,
    state: WebState,
}

impl FrontendWeb {
    pub fn new(
        addr: SocketAddr,
        top_k: usize,
        holder: ModelHolder,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Self {
        Self {
            addr,
            state: WebState {
                holder: Arc::new(Mutex::new(holder)),
                top_k,
                logger: logger.with_namespace("web"),
            },
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/upload", post(select_upload))
            .route("/predict", post(predict_upload))
            .route("/health", get(health))
            // The predict form carries the image base64-encoded.
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES * 2))
            .with_state(self.state.clone())
    }

    async fn serve(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let _ = self
            .state
            .logger
            .info(&format!("Listening on http://{}", listener.local_addr()?));
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

impl Frontend for FrontendWeb {
    fn run(self: Box<Self>) -> Result<(), Box<dyn Error + Send + Sync>> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on((*self).serve())
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn index(State(state): State<WebState>) -> Html<String> {
    Html(render_page(state.top_k, None, None))
}

async fn select_upload(
    State(state): State<WebState>,
    multipart: Multipart,
) -> Result<Html<String>, (StatusCode, String)> {
    let Some((file_name, bytes)) = read_file_field(multipart).await? else {
        return Ok(Html(render_page(state.top_k, None, None)));
    };

    let upload = match Upload::new(&file_name, bytes) {
        Ok(upload) => upload,
        Err(e) => {
            let outcome = upload_error_outcome(&e, state.logger.as_ref());
            return Ok(Html(render_page(state.top_k, None, Some(&outcome))));
        }
    };

    let _ = state.logger.info(&format!(
        "Selected {} ({} bytes)",
        upload.file_name,
        upload.bytes.len()
    ));

    let image_bytes = upload.bytes.clone();
    let decoded = tokio::task::spawn_blocking(move || decode_image(&image_bytes).map(|_| ()))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    if let Err(e) = decoded {
        let _ = state.logger.error(&e.to_string());
        let outcome = error_outcome(&e);
        return Ok(Html(render_page(state.top_k, None, Some(&outcome))));
    }

    Ok(Html(render_page(state.top_k, Some(&upload), None)))
}

async fn predict_upload(
    State(state): State<WebState>,
    multipart: Multipart,
) -> Result<Html<String>, (StatusCode, String)> {
    let Some((file_name, bytes)) = read_selected_fields(multipart).await? else {
        return Ok(Html(render_page(state.top_k, None, None)));
    };

    let upload = match Upload::new(&file_name, bytes) {
        Ok(upload) => upload,
        Err(e) => {
            let outcome = upload_error_outcome(&e, state.logger.as_ref());
            return Ok(Html(render_page(state.top_k, None, Some(&outcome))));
        }
    };

    let _ = state.logger.info(&format!(
        "Predicting {} ({} bytes)",
        upload.file_name,
        upload.bytes.len()
    ));

    let worker_state = state.clone();
    let image_bytes = upload.bytes.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let model = worker_state
            .holder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_model();
        prediction_outcome(
            model,
            &image_bytes,
            worker_state.top_k,
            worker_state.logger.as_ref(),
        )
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Html(render_page(state.top_k, Some(&upload), Some(&outcome))))
}

fn bad_request(error: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, error.to_string())
}

/// Reads the chosen file from the upload form.
async fn read_file_field(
    mut multipart: Multipart,
) -> Result<Option<(String, Vec<u8>)>, (StatusCode, String)> {
    let mut received = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(bad_request)?;
        received = Some((file_name, bytes.to_vec()));
    }

    Ok(received)
}

/// Reads the image carried over from the preview page in hidden fields.
async fn read_selected_fields(
    mut multipart: Multipart,
) -> Result<Option<(String, Vec<u8>)>, (StatusCode, String)> {
    let mut file_name = None;
    let mut image_data = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        match field.name() {
            Some(FILE_NAME_FIELD) => file_name = Some(field.text().await.map_err(bad_request)?),
            Some(IMAGE_DATA_FIELD) => image_data = Some(field.text().await.map_err(bad_request)?),
            _ => {}
        }
    }

    let (Some(file_name), Some(image_data)) = (file_name, image_data) else {
        return Ok(None);
    };
    let bytes = STANDARD.decode(image_data.trim()).map_err(bad_request)?;
    Ok(Some((file_name, bytes)))
}

fn render_page(top_k: usize, upload: Option<&Upload>, outcome: Option<&Outcome>) -> String {
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<p>{subtitle}</p>\n",
        title = TITLE,
        subtitle = encode_text(&subtitle(top_k)),
    );

    let _ = write!(
        html,
        "<form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n<input type=\"file\" name=\"{field}\" accept=\".jpg,.jpeg,.png\" required>\n<button type=\"submit\">Upload</button>\n</form>\n",
        field = UPLOAD_FIELD,
    );

    let image_decoded = !matches!(outcome, Some(Outcome::ImageError(_)));
    if let (Some(upload), true) = (upload, image_decoded) {
        let encoded = STANDARD.encode(&upload.bytes);
        let name = encode_double_quoted_attribute(&upload.file_name);
        let _ = write!(
            html,
            "<figure>\n<img src=\"data:{mime};base64,{encoded}\" width=\"{width}\" alt=\"{name}\">\n<figcaption>{caption}</figcaption>\n</figure>\n",
            mime = upload.mime_type(),
            width = IMAGE_WIDTH,
            caption = IMAGE_CAPTION,
        );
        let _ = write!(
            html,
            "<form action=\"/predict\" method=\"post\" enctype=\"multipart/form-data\">\n<input type=\"hidden\" name=\"{FILE_NAME_FIELD}\" value=\"{name}\">\n<input type=\"hidden\" name=\"{IMAGE_DATA_FIELD}\" value=\"{encoded}\">\n<button type=\"submit\">Predict</button>\n</form>\n",
        );
    }

    match outcome {
        Some(Outcome::Results(lines)) => {
            let _ = writeln!(html, "<h2>{}</h2>", encode_text(&results_heading(top_k)));
            for line in lines {
                let _ = write!(
                    html,
                    "<div class=\"prediction\">\n<p>{text}</p>\n<progress max=\"1\" value=\"{value:.4}\"></progress>\n</div>\n",
                    text = encode_text(&line.text),
                    value = line.fraction,
                );
            }
        }
        Some(Outcome::ImageError(message)) | Some(Outcome::PredictionError(message)) => {
            let _ = writeln!(html, "<p class=\"error\">{}</p>", encode_text(message));
        }
        None => {}
    }

    html.push_str("</body>\n</html>\n");
    html
}
