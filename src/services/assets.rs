//! Remote image hosting.
//!
//! Uploads go to a Cloudinary-compatible API. Batches are pushed with bounded
//! concurrency and report which inputs made it and which did not, since the
//! host offers no transaction spanning several files.

use async_trait::async_trait;
use chrono::Utc;
use futures::{StreamExt, stream};
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::CloudinaryConfig;

/// Uploads in flight per request.
pub const MAX_CONCURRENT_UPLOADS: usize = 4;

pub const BANNER_FOLDER: &str = "banners";
pub const PRODUCT_FOLDER: &str = "products";

/// One file received from a client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
}

/// Result of a batch upload. URL order does not follow input order.
#[derive(Debug, Default)]
pub struct UploadOutcome {
    pub uploaded: Vec<UploadedAsset>,
    pub failed: Vec<String>,
}

impl UploadOutcome {
    pub fn urls(&self) -> Vec<String> {
        self.uploaded.iter().map(|asset| asset.url.clone()).collect()
    }
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(
        &self,
        folder: &str,
        image: &ImageUpload,
        mime_type: &'static str,
    ) -> anyhow::Result<UploadedAsset>;

    async fn destroy(&self, public_id: &str) -> anyhow::Result<()>;
}

/// Upload every image to `folder`, at most [`MAX_CONCURRENT_UPLOADS`] at a time.
pub async fn upload_all(
    store: &dyn AssetStore,
    folder: &str,
    images: Vec<ImageUpload>,
) -> UploadOutcome {
    let results: Vec<(String, anyhow::Result<UploadedAsset>)> = stream::iter(images)
        .map(|image| async move {
            let result = match sniff_image_type(&image.bytes) {
                Some(mime) => store.upload(folder, &image, mime).await,
                None => Err(anyhow::anyhow!("not a supported image")),
            };
            (image.file_name, result)
        })
        .buffer_unordered(MAX_CONCURRENT_UPLOADS)
        .collect()
        .await;

    let mut outcome = UploadOutcome::default();
    for (file_name, result) in results {
        match result {
            Ok(asset) if !asset.url.is_empty() => outcome.uploaded.push(asset),
            Ok(_) => {
                tracing::warn!(file = %file_name, "upload returned no url");
                outcome.failed.push(file_name);
            }
            Err(err) => {
                tracing::warn!(file = %file_name, error = %err, "image upload failed");
                outcome.failed.push(file_name);
            }
        }
    }
    outcome
}

/// Best-effort removal of assets whose owning record was never written.
pub async fn discard(store: &dyn AssetStore, assets: &[UploadedAsset]) {
    for asset in assets {
        if let Err(err) = store.destroy(&asset.public_id).await {
            tracing::error!(public_id = %asset.public_id, error = %err, "orphaned asset cleanup failed");
        }
    }
}

pub fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

pub struct CloudinaryStore {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
}

impl std::fmt::Debug for CloudinaryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryStore")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    secure_url: String,
    public_id: String,
}

impl CloudinaryStore {
    pub fn new(config: &CloudinaryConfig) -> Self {
        Self {
            client: Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{action}",
            self.cloud_name
        )
    }

    fn signed_form(&self, params: &[(&str, String)]) -> Form {
        let signature = sign_params(params, self.api_secret.expose_secret());
        params
            .iter()
            .fold(Form::new(), |form, (key, value)| {
                form.text(key.to_string(), value.clone())
            })
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
    }
}

#[async_trait]
impl AssetStore for CloudinaryStore {
    async fn upload(
        &self,
        folder: &str,
        image: &ImageUpload,
        mime_type: &'static str,
    ) -> anyhow::Result<UploadedAsset> {
        let params = [
            ("folder", folder.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        let file = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(mime_type)?;
        let form = self.signed_form(&params).part("file", file);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("asset host answered {status}: {body}");
        }

        let body: UploadResponse = response.json().await?;
        tracing::debug!(public_id = %body.public_id, "image uploaded");
        Ok(UploadedAsset {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> anyhow::Result<()> {
        let params = [
            ("public_id", public_id.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        let response = self
            .client
            .post(self.endpoint("destroy"))
            .multipart(self.signed_form(&params))
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("asset host answered {}", response.status());
        }
        Ok(())
    }
}

/// Request signature: parameters sorted by name, joined as a query string,
/// followed by the API secret, hashed with SHA-256.
fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    struct FlakyStore {
        reject: &'static str,
        destroyed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AssetStore for FlakyStore {
        async fn upload(
            &self,
            folder: &str,
            image: &ImageUpload,
            _mime_type: &'static str,
        ) -> anyhow::Result<UploadedAsset> {
            if image.file_name == self.reject {
                anyhow::bail!("boom");
            }
            Ok(UploadedAsset {
                url: format!("https://cdn/{folder}/{}", image.file_name),
                public_id: format!("{folder}/{}", image.file_name),
            })
        }

        async fn destroy(&self, public_id: &str) -> anyhow::Result<()> {
            self.destroyed.lock().unwrap().push(public_id.to_string());
            Ok(())
        }
    }

    fn image(name: &str, bytes: &[u8]) -> ImageUpload {
        ImageUpload {
            file_name: name.into(),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn partial_failures_are_reported_per_input() {
        let store = FlakyStore {
            reject: "b.png",
            destroyed: Mutex::new(vec![]),
        };
        let outcome = upload_all(
            &store,
            BANNER_FOLDER,
            vec![
                image("a.png", PNG),
                image("b.png", PNG),
                image("notes.txt", b"hello world"),
            ],
        )
        .await;

        assert_eq!(outcome.urls(), vec!["https://cdn/banners/a.png".to_string()]);
        let mut failed = outcome.failed.clone();
        failed.sort();
        assert_eq!(failed, vec!["b.png".to_string(), "notes.txt".to_string()]);
    }

    #[tokio::test]
    async fn discard_destroys_every_uploaded_asset() {
        let store = FlakyStore {
            reject: "",
            destroyed: Mutex::new(vec![]),
        };
        let outcome = upload_all(
            &store,
            PRODUCT_FOLDER,
            vec![image("a.png", PNG), image("b.png", PNG)],
        )
        .await;
        discard(&store, &outcome.uploaded).await;

        let mut destroyed = store.destroyed.lock().unwrap().clone();
        destroyed.sort();
        assert_eq!(destroyed, vec!["products/a.png", "products/b.png"]);
    }

    #[test]
    fn sniffs_common_image_formats() {
        assert_eq!(sniff_image_type(PNG), Some("image/png"));
        assert_eq!(sniff_image_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_image_type(b"GIF89a"), Some("image/gif"));
        assert_eq!(sniff_image_type(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_image_type(b"%PDF-1.7"), None);
        assert_eq!(sniff_image_type(&[]), None);
    }

    #[test]
    fn signature_sorts_params_and_appends_secret() {
        let unsorted = [
            ("timestamp", "1315060510".to_string()),
            ("folder", "banners".to_string()),
        ];
        let sorted = [
            ("folder", "banners".to_string()),
            ("timestamp", "1315060510".to_string()),
        ];
        let signature = sign_params(&unsorted, "abcd");
        assert_eq!(signature, sign_params(&sorted, "abcd"));

        let expected = hex::encode(Sha256::digest(b"folder=banners&timestamp=1315060510abcd"));
        assert_eq!(signature, expected);
        assert_ne!(signature, sign_params(&sorted, "other"));
    }
}
