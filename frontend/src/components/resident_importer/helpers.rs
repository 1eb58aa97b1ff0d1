//! Backend calls and small browser utilities for the resident importer.
//!
//! Every call resolves to `Result<_, ImportError>` so `update.rs` handles
//! network failures and API errors the same way.

use common::error::ImportError;
use common::jobs::JobStatus;
use common::requests::{
    DispatchRequest, DispatchStarted, OrganizeRequest, ResidentsResponse, UploadResponse,
};
use gloo_console::error;
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::{FormData, HtmlElement};

const API_PATH: &str = "/api/residents";

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Turns a non-success response into the error the user should see.
async fn read_error(resp: Response) -> ImportError {
    match resp.json::<ErrorBody>().await {
        Ok(body) if body.error.code == "EMPTY_RESULT" => ImportError::EmptyResult,
        Ok(body) if body.error.code == "NOTHING_SELECTED" => ImportError::NothingSelected,
        Ok(body) => ImportError::upstream(Some(body.error.message.as_str())),
        Err(e) => {
            error!(format!("unreadable error body ({}): {}", resp.status(), e));
            ImportError::upstream(None)
        }
    }
}

fn network_error(e: gloo_net::Error) -> ImportError {
    error!(format!("request failed: {}", e));
    ImportError::upstream(None)
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ImportError> {
    if !resp.ok() {
        return Err(read_error(resp).await);
    }
    resp.json::<T>().await.map_err(network_error)
}

/// Posts the file as multipart form data.
pub async fn upload_file(file: web_sys::File) -> Result<UploadResponse, ImportError> {
    let form = FormData::new().map_err(|_| ImportError::upstream(None))?;
    form.append_with_blob_and_filename("file", &file, &file.name())
        .map_err(|_| ImportError::upstream(None))?;

    let resp = Request::post(&format!("{}/upload", API_PATH))
        .body(form)
        .map_err(network_error)?
        .send()
        .await
        .map_err(network_error)?;
    read_json(resp).await
}

/// Sends pasted text through the organizer.
pub async fn organize_text(text: String) -> Result<UploadResponse, ImportError> {
    let resp = Request::post(&format!("{}/organize", API_PATH))
        .json(&OrganizeRequest { text })
        .map_err(network_error)?
        .send()
        .await
        .map_err(network_error)?;
    let parsed: ResidentsResponse = read_json(resp).await?;
    Ok(UploadResponse {
        residents: parsed.residents,
        columns: Vec::new(),
        interpreted: true,
    })
}

/// Starts a dispatch job and returns its id.
pub async fn start_dispatch(request: DispatchRequest) -> Result<String, ImportError> {
    let resp = Request::post(&format!("{}/dispatch", API_PATH))
        .json(&request)
        .map_err(network_error)?
        .send()
        .await
        .map_err(network_error)?;
    let started: DispatchStarted = read_json(resp).await?;
    Ok(started.job_id)
}

pub async fn job_status(job_id: String) -> Result<JobStatus, ImportError> {
    let resp = Request::get(&format!("{}/dispatch/status/{}", API_PATH, job_id))
        .send()
        .await
        .map_err(network_error)?;
    read_json(resp).await
}

/// Shows `message` at the bottom of the page for three seconds.
pub fn show_toast(message: &str) {
    if let Some(window) = web_sys::window() {
        if let Some(document) = window.document() {
            if let (Ok(toast), Some(body)) = (document.create_element("div"), document.body()) {
                toast.set_text_content(Some(message));
                let html_toast: HtmlElement = toast.unchecked_into();
                let style = html_toast.style();
                style.set_property("position", "fixed").ok();
                style.set_property("bottom", "20px").ok();
                style.set_property("left", "50%").ok();
                style.set_property("transform", "translateX(-50%)").ok();
                style.set_property("background", "rgba(0, 0, 0, 0.8)").ok();
                style.set_property("color", "#fff").ok();
                style.set_property("padding", "10px 20px").ok();
                style.set_property("border-radius", "4px").ok();
                style.set_property("z-index", "10000").ok();

                if body.append_child(&html_toast).is_ok() {
                    wasm_bindgen_futures::spawn_local(async move {
                        gloo_timers::future::TimeoutFuture::new(3000).await;
                        if let Some(parent) = html_toast.parent_node() {
                            parent.remove_child(&html_toast).ok();
                        }
                    });
                }
            }
        }
    }
}

/// `"1 resident"` / `"3 residents"`.
pub fn residents_label(count: usize) -> String {
    if count == 1 {
        "1 resident".to_string()
    } else {
        format!("{} residents", count)
    }
}
