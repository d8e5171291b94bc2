use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Banner {
    pub id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct BannerImage {
    pub id: Uuid,
    pub banner_id: Uuid,
    pub url: String,
    pub public_id: Option<String>,
    pub alt_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BannerWithImages {
    #[serde(flatten)]
    pub banner: Banner,
    pub banner_images: Vec<BannerImage>,
}

#[derive(Debug, Deserialize)]
pub struct BannerImagePayload {
    pub url: String,
    pub public_id: Option<String>,
    pub alt_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBannerRequest {
    pub description: String,
    pub images: Vec<BannerImagePayload>,
}

impl BannerWithImages {
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let banners = sqlx::query_as::<_, Banner>(
            "SELECT id, description, created_at, updated_at FROM banners ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await?;

        let banner_ids: Vec<Uuid> = banners.iter().map(|b| b.id).collect();
        let images = sqlx::query_as::<_, BannerImage>(
            "SELECT id, banner_id, url, public_id, alt_text FROM banner_images \
             WHERE banner_id = ANY($1)",
        )
        .bind(&banner_ids)
        .fetch_all(pool)
        .await?;

        let mut images_by_banner: HashMap<Uuid, Vec<BannerImage>> = HashMap::new();
        for image in images {
            images_by_banner.entry(image.banner_id).or_default().push(image);
        }

        Ok(banners
            .into_iter()
            .map(|banner| {
                let id = banner.id;
                BannerWithImages {
                    banner,
                    banner_images: images_by_banner.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }

    pub async fn create(pool: &PgPool, req: &CreateBannerRequest) -> Result<Self, sqlx::Error> {
        let banner = sqlx::query_as::<_, Banner>(
            "INSERT INTO banners (description) VALUES ($1) \
             RETURNING id, description, created_at, updated_at",
        )
        .bind(&req.description)
        .fetch_one(pool)
        .await?;

        let mut banner_images = Vec::with_capacity(req.images.len());
        for image in &req.images {
            let stored = sqlx::query_as::<_, BannerImage>(
                "INSERT INTO banner_images (banner_id, url, public_id, alt_text) \
                 VALUES ($1, $2, $3, $4) RETURNING id, banner_id, url, public_id, alt_text",
            )
            .bind(banner.id)
            .bind(&image.url)
            .bind(&image.public_id)
            .bind(&image.alt_text)
            .fetch_one(pool)
            .await?;
            banner_images.push(stored);
        }

        Ok(BannerWithImages { banner, banner_images })
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM banners WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
