use axum::extract::multipart::{Field, Multipart, MultipartError};
use thiserror::Error;

use crate::blob::{BlobError, BlobStore};

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Invalid multipart body: {0}")]
    Malformed(#[from] MultipartError),
    #[error("Failed to store upload: {0}")]
    Blob(#[from] BlobError),
}

/// Decoded create/update form: the text fields plus the stored blob name of
/// the uploaded image, if one arrived.
#[derive(Debug, Default)]
pub struct ItemForm {
    pub name: Option<String>,
    pub quantity: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
}

/// Walk the multipart body in arrival order, single pass.
///
/// Text fields are collected by name, unknown ones ignored. The first file
/// part named `image` with an `image/*` media type is streamed straight into
/// the blob store; every other file part is drained and discarded without
/// error. Each part is consumed fully before the decoder advances -- the body
/// is never buffered whole and no part is read twice.
///
/// On a malformed or truncated body the in-flight blob is aborted and any
/// blob already stored for this form is reclaimed, so a failed decode leaves
/// nothing behind.
pub async fn read_item_form(
    multipart: &mut Multipart,
    blobs: &BlobStore,
) -> Result<ItemForm, FormError> {
    let mut form = ItemForm::default();
    match collect_parts(multipart, blobs, &mut form).await {
        Ok(()) => Ok(form),
        Err(e) => {
            if let Some(name) = form.image.take() {
                let _ = blobs.delete(&name).await;
            }
            Err(e)
        }
    }
}

async fn collect_parts(
    multipart: &mut Multipart,
    blobs: &BlobStore,
    form: &mut ItemForm,
) -> Result<(), FormError> {
    while let Some(mut field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();

        if field.file_name().is_some() {
            let is_image = field
                .content_type()
                .is_some_and(|ct| ct.starts_with("image/"));

            if field_name == "image" && is_image && form.image.is_none() {
                form.image = Some(store_image(blobs, &mut field).await?);
            } else {
                drain(&mut field).await?;
            }
            continue;
        }

        match field_name.as_str() {
            "name" => form.name = Some(field.text().await?),
            "quantity" => form.quantity = Some(field.text().await?),
            "category" => form.category = Some(field.text().await?),
            _ => {
                // Ignore unknown fields
            }
        }
    }

    Ok(())
}

/// Pipe a file part into a fresh blob, chunk by chunk. On any mid-stream
/// failure the staged blob is removed, so a broken upload never survives
/// under a servable name.
async fn store_image(blobs: &BlobStore, field: &mut Field<'_>) -> Result<String, FormError> {
    let declared = field.file_name().unwrap_or("upload").to_string();
    let mut writer = blobs.create(&declared).await?;

    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                if let Err(e) = writer.write_chunk(chunk).await {
                    writer.abort();
                    return Err(e.into());
                }
            }
            Ok(None) => break,
            Err(e) => {
                writer.abort();
                return Err(e.into());
            }
        }
    }

    Ok(writer.finish().await?)
}

async fn drain(field: &mut Field<'_>) -> Result<(), MultipartError> {
    while field.chunk().await?.is_some() {}
    Ok(())
}
