use crate::error::ApiError;
use crate::importer::ImportServices;
use crate::normalizer::normalize_free_text;
use crate::readers::{read_source, SourceKind};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use common::error::ImportError;
use common::model::ingest::IngestOutcome;
use common::requests::UploadResponse;
use futures_util::StreamExt;
use log::info;

/// A file received from the form: client-side name and raw bytes.
struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

pub(crate) async fn process(
    services: web::Data<ImportServices>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let file = receive_file(payload, services.max_upload_bytes).await?;
    let response = ingest_file(&services, file).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Reads the `file` field. The extension is checked before any byte is
/// buffered, and the body is cut off at `limit` bytes.
async fn receive_file(mut payload: Multipart, limit: usize) -> Result<UploadedFile, ApiError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if name.as_deref() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        SourceKind::from_filename(&filename)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ApiError::BadRequest(e.to_string()))?;
            if bytes.len() + chunk.len() > limit {
                return Err(ApiError::BadRequest(format!(
                    "File is larger than {} MB",
                    limit / (1024 * 1024)
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(UploadedFile { filename, bytes });
    }
    Err(ApiError::BadRequest("Missing file".into()))
}

async fn ingest_file(services: &ImportServices, file: UploadedFile) -> Result<UploadResponse, ApiError> {
    let filename = file.filename.clone();
    let outcome = web::block(move || read_source(&file.filename, &file.bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("blocking error: {}", e)))??;

    match outcome {
        IngestOutcome::MappedRows { residents, columns } => {
            info!("{}: mapped {} residents from headers", filename, residents.len());
            if residents.is_empty() {
                return Err(ImportError::EmptyResult.into());
            }
            Ok(UploadResponse {
                residents,
                columns,
                interpreted: false,
            })
        }
        IngestOutcome::NeedsFreeTextInterpretation { raw_text } => {
            info!("{}: headers not recognized, sending to the organizer", filename);
            let residents = normalize_free_text(services.organizer.as_ref(), &raw_text).await?;
            Ok(UploadResponse {
                residents,
                columns: Vec::new(),
                interpreted: true,
            })
        }
    }
}
