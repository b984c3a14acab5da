//! `POST /convert`: multipart PDF upload in, CSV out.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;

use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, post, web};
use futures_util::StreamExt;
use log::{error, info, warn};

use super::AppState;
use super::error::ApiError;
use crate::convert::{Extraction, Extractor};

/// Name of the multipart field carrying the PDF
const FILE_FIELD: &str = "file";
const FALLBACK_FILENAME: &str = "upload.pdf";
const DOWNLOAD_FILENAME: &str = "converted.csv";
const SCRATCH_PREFIX: &str = "pdf2csv-";

#[derive(Debug)]
struct Upload {
    filename: String,
    data: Vec<u8>,
}

#[post("/convert")]
pub async fn convert(state: web::Data<AppState>, mut payload: Multipart) -> Result<HttpResponse, ApiError> {
    let start = Instant::now();
    let Upload { filename, data } = read_upload(&mut payload, state.max_upload_bytes)
        .await?
        .ok_or(ApiError::NoFile)?;
    info!("Received {} ({} bytes)", filename, data.len());

    // The job owns its scratch directory, so a timed-out job keeps it until it ends
    let job = {
        let extractor = state.extractor.clone();
        let temp_root = state.temp_root.clone();
        let filename = filename.clone();
        web::block(move || convert_upload(&extractor, temp_root.as_deref(), &filename, &data))
    };
    let joined = match state.timeout {
        Some(limit) => actix_web::rt::time::timeout(limit, job).await.map_err(|_| {
            warn!("Extraction of {} timed out after {:?}", filename, limit);
            ApiError::Timeout(limit.as_secs())
        })?,
        None => job.await,
    };
    let body = joined.map_err(ApiError::internal)??;

    info!("Converted {} to {} CSV bytes in {:.2?}", filename, body.len(), start.elapsed());

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(DOWNLOAD_FILENAME.to_string())],
        })
        .body(body))
}

/// Extract one upload inside a fresh scratch directory and return the CSV
/// bytes. The directory is removed when this returns, on every path.
fn convert_upload(
    extractor: &Extractor,
    temp_root: Option<&Path>,
    filename: &str,
    data: &[u8],
) -> Result<Vec<u8>, ApiError> {
    let start = Instant::now();
    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX);
    let workdir = match temp_root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
    .map_err(ApiError::internal)?;

    let pdf_path = workdir.path().join(filename);
    fs::write(&pdf_path, data).map_err(ApiError::internal)?;

    let extraction = extractor.extract(&pdf_path).map_err(|e| {
        error!("Extraction of {} failed: {}", filename, e);
        ApiError::internal(e)
    })?;

    let csv_path = match extraction {
        Extraction::Csv { path, .. } => path,
        Extraction::NoTables { lattice, stream } => {
            info!(
                "No tables in {} (lattice: {}, stream: {}) after {:.2?}",
                filename,
                lattice,
                stream,
                start.elapsed()
            );
            return Err(ApiError::NoTables);
        }
    };

    match fs::read(&csv_path) {
        Ok(body) => Ok(body),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ApiError::NoTables),
        Err(e) => Err(ApiError::internal(e)),
    }
}

/// Collect the `file` field; every other field is drained and ignored
async fn read_upload(payload: &mut Multipart, limit: usize) -> Result<Option<Upload>, ApiError> {
    let mut upload: Option<Upload> = None;

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| ApiError::BadUpload(e.to_string()))?;

        let wanted = upload.is_none() && field.name() == Some(FILE_FIELD);
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(sanitize_filename)
            .unwrap_or_else(|| FALLBACK_FILENAME.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ApiError::BadUpload(e.to_string()))?;
            if !wanted {
                continue;
            }
            if data.len() + chunk.len() > limit {
                return Err(ApiError::TooLarge(limit));
            }
            data.extend_from_slice(&chunk);
        }

        if wanted {
            upload = Some(Upload { filename, data });
        }
    }

    Ok(upload)
}

/// Final path component of a client-supplied name
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match base {
        "" | "." | ".." => FALLBACK_FILENAME.to_string(),
        _ => base.to_string(),
    }
}
