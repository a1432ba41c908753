use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Banner;

#[derive(Debug, Serialize, ToSchema)]
pub struct BannerList {
    pub items: Vec<Banner>,
}

/// A created banner plus the names of the files that could not be hosted.
#[derive(Debug, Serialize, ToSchema)]
pub struct BannerCreated {
    pub banner: Banner,
    pub failed: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BannerDeleted {
    pub id: Uuid,
}
