use std::collections::HashMap;

use axum::extract::Multipart;

use crate::{
    error::{AppError, AppResult},
    services::assets::ImageUpload,
};

/// Name of the repeated multipart field carrying image files.
pub const IMAGE_FIELD: &str = "images";

#[derive(Debug, Default)]
pub struct MultipartForm {
    pub images: Vec<ImageUpload>,
    pub fields: HashMap<String, String>,
}

/// Split a multipart body into image files and plain text fields.
pub async fn read_form(mut multipart: Multipart) -> AppResult<MultipartForm> {
    let mut form = MultipartForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        tracing::warn!(error = %err, "multipart error");
        AppError::Validation("invalid multipart body".into())
    })? {
        let name = field.name().unwrap_or_default().to_string();
        if name == IMAGE_FIELD {
            let file_name = field
                .file_name()
                .filter(|f| !f.is_empty())
                .map(str::to_owned)
                .unwrap_or_else(|| format!("image-{}", form.images.len() + 1));
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::Validation(format!("failed to read {file_name}")))?;
            form.images.push(ImageUpload {
                file_name,
                bytes: bytes.to_vec(),
            });
        } else if !name.is_empty() {
            let value = field
                .text()
                .await
                .map_err(|_| AppError::Validation(format!("failed to read field {name}")))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}
