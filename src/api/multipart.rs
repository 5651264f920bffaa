use std::collections::HashMap;

use axum::{
    extract::{multipart::MultipartError, Multipart},
    http::StatusCode,
};

use crate::{
    error::{AppError, Result},
    storage::{discard_blobs, image_extension, BlobStore, UploadKind},
};

const IMAGES_FIELD: &str = "images";

/// A multipart form whose `images` parts have already been written to the blob store.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub images: Vec<String>,
}

impl UploadForm {
    /// Reads every part. Text parts become `fields`; each `images` part is
    /// checked and stored. On failure nothing stored so far is kept.
    pub async fn receive(
        multipart: Multipart,
        blobs: &dyn BlobStore,
        kind: UploadKind,
        max_file_size: usize,
    ) -> Result<Self> {
        let mut form = UploadForm::default();
        match form.read(multipart, blobs, kind, max_file_size).await {
            Ok(()) => Ok(form),
            Err(e) => {
                discard_blobs(blobs, &form.images).await;
                Err(e)
            }
        }
    }

    async fn read(
        &mut self,
        mut multipart: Multipart,
        blobs: &dyn BlobStore,
        kind: UploadKind,
        max_file_size: usize,
    ) -> Result<()> {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            if name != IMAGES_FIELD {
                let value = field.text().await.map_err(multipart_error)?;
                self.fields.insert(name, value);
                continue;
            }

            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(multipart_error)?;
            if file_name.is_empty() && data.is_empty() {
                continue;
            }

            if self.images.len() >= kind.max_files() {
                return Err(AppError::invalid(
                    IMAGES_FIELD,
                    format!("At most {} images can be uploaded", kind.max_files()),
                ));
            }
            if data.len() > max_file_size {
                return Err(AppError::PayloadTooLarge(format!(
                    "Each image must be at most {} MB",
                    max_file_size / (1024 * 1024)
                )));
            }

            let extension = image_extension(&file_name, content_type.as_deref())?;
            let path = blobs.save(kind, &extension, &data).await?;
            self.images.push(path);
        }

        Ok(())
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Upload exceeds the maximum request size".to_string())
    } else {
        AppError::BadRequest(err.body_text())
    }
}
