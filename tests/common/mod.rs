#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequest, Multipart},
    http::{Request, header},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    EntityTrait, Schema, Set,
};
use secrecy::SecretString;
use storefront_api::{
    config::AuthConfig,
    dto::{addresses::UpsertAddressRequest, auth::CredentialsRequest},
    entity::{addresses, banners, order_lines, orders, products, users},
    middleware::auth::AuthUser,
    services::{
        address_service,
        assets::{AssetStore, ImageUpload, UploadedAsset},
        auth_service,
        session::SessionKeys,
    },
    state::AppState,
};
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "owner@shop.test";
pub const WEBHOOK_SECRET: &str = "whsec-test";
pub const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];

/// In-memory image host. Files whose name starts with `fail` are rejected.
#[derive(Default)]
pub struct FakeAssetStore {
    pub uploaded: Mutex<Vec<String>>,
    pub destroyed: Mutex<Vec<String>>,
    /// When set, the next upload inserts a product with this name first,
    /// so a create that already checked the name fails on insert.
    pub claim_name: Mutex<Option<(DatabaseConnection, String)>>,
}

impl FakeAssetStore {
    pub fn sorted_uploaded(&self) -> Vec<String> {
        let mut ids = self.uploaded.lock().unwrap().clone();
        ids.sort();
        ids
    }

    pub fn sorted_destroyed(&self) -> Vec<String> {
        let mut ids = self.destroyed.lock().unwrap().clone();
        ids.sort();
        ids
    }
}

#[async_trait]
impl AssetStore for FakeAssetStore {
    async fn upload(
        &self,
        folder: &str,
        image: &ImageUpload,
        _mime_type: &'static str,
    ) -> anyhow::Result<UploadedAsset> {
        let claim = self.claim_name.lock().unwrap().take();
        if let Some((orm, name)) = claim {
            product_model(&name, 100, 0).insert(&orm).await?;
        }
        if image.file_name.starts_with("fail") {
            anyhow::bail!("upstream rejected {}", image.file_name);
        }
        let public_id = format!("{folder}/{}", image.file_name);
        self.uploaded.lock().unwrap().push(public_id.clone());
        Ok(UploadedAsset {
            url: format!("https://img.test/{public_id}"),
            public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> anyhow::Result<()> {
        self.destroyed.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        session_secret: SecretString::from("integration-secret".to_string()),
        session_max_age_days: 30,
        google_client_id: String::new(),
    }
}

pub async fn test_state() -> anyhow::Result<(AppState, Arc<FakeAssetStore>)> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let orm = Database::connect(options).await?;

    let schema = Schema::new(DbBackend::Sqlite);
    let backend = orm.get_database_backend();
    for stmt in [
        schema.create_table_from_entity(users::Entity),
        schema.create_table_from_entity(addresses::Entity),
        schema.create_table_from_entity(products::Entity),
        schema.create_table_from_entity(orders::Entity),
        schema.create_table_from_entity(order_lines::Entity),
        schema.create_table_from_entity(banners::Entity),
    ] {
        orm.execute(backend.build(&stmt)).await?;
    }

    let store = Arc::new(FakeAssetStore::default());
    let config = auth_config();
    let state = AppState {
        orm,
        sessions: SessionKeys::new(&config),
        auth: Arc::new(config),
        assets: store.clone(),
        webhook_secret: Arc::new(SecretString::from(WEBHOOK_SECRET.to_string())),
    };
    Ok((state, store))
}

/// Sign up (or in) with a password and return the identity the extractor would build.
pub async fn sign_in(state: &AppState, email: &str) -> anyhow::Result<AuthUser> {
    let user = auth_service::authenticate_with_credentials(
        state,
        CredentialsRequest {
            email: email.to_string(),
            password: "correct horse".to_string(),
            name: email.split('@').next().unwrap_or_default().to_string(),
        },
    )
    .await?;
    let token = state.sessions.mint(&user)?;
    let claims = state.sessions.verify(&token)?;
    Ok(AuthUser {
        user_id: user.id,
        email: claims.email.clone(),
        role: claims.role.clone(),
        claims,
    })
}

pub async fn save_address(state: &AppState, user: &AuthUser) -> anyhow::Result<()> {
    address_service::upsert_my_address(
        state,
        user,
        UpsertAddressRequest {
            recipient_name: "Ana Souza".into(),
            street: "Rua das Flores".into(),
            number: "42".into(),
            complement: None,
            district: "Centro".into(),
            city: "Curitiba".into(),
            state: "PR".into(),
            zip_code: "80000-000".into(),
        },
    )
    .await?;
    Ok(())
}

pub async fn insert_product(
    state: &AppState,
    name: &str,
    price: i64,
    discounted_price: i64,
) -> anyhow::Result<products::Model> {
    Ok(product_model(name, price, discounted_price)
        .insert(&state.orm)
        .await?)
}

fn product_model(name: &str, price: i64, discounted_price: i64) -> products::ActiveModel {
    products::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(format!("{name} description")),
        price: Set(price),
        discounted_price: Set(discounted_price),
        tags: Set("test".to_string()),
        images: Set(serde_json::json!(["https://img.test/products/p.png"])),
        weight_kg: Set(0.3),
        height_cm: Set(1),
        width_cm: Set(1),
        length_cm: Set(1),
        created_at: Set(Utc::now().into()),
    }
}

pub fn image(name: &str) -> ImageUpload {
    ImageUpload {
        file_name: name.to_string(),
        bytes: PNG.to_vec(),
    }
}

/// Build an axum multipart extractor from `(field, file name, bytes)` parts.
pub async fn multipart(parts: &[(&str, Option<&str>, &[u8])]) -> Multipart {
    let mut body = Vec::new();
    for (field, file_name, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match file_name {
            Some(file) => format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file}\"\r\n\r\n"
            ),
            None => format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n"),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    Multipart::from_request(request, &()).await.unwrap()
}

const BOUNDARY: &str = "storefront-test-boundary";

pub async fn count<E: EntityTrait>(state: &AppState, _entity: E) -> anyhow::Result<usize> {
    Ok(E::find().all(&state.orm).await?.len())
}
