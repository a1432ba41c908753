use std::sync::Arc;

use crate::{
    config::AuthConfig,
    db::OrmConn,
    services::{assets::AssetStore, session::SessionKeys},
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub auth: Arc<AuthConfig>,
    pub sessions: SessionKeys,
    pub assets: Arc<dyn AssetStore>,
    pub webhook_secret: Arc<secrecy::SecretString>,
}
