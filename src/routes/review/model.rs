use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::routes::product::model::ImagePayload;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct ReviewImage {
    pub id: Uuid,
    pub review_id: Uuid,
    pub url: String,
    pub public_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewWithImages {
    #[serde(flatten)]
    pub review: Review,
    pub images: Vec<ReviewImage>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub comment: String,
    pub rating: i32,
    #[serde(default)]
    pub images: Vec<ImagePayload>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub review_id: Uuid,
    pub comment: String,
    pub rating: i32,
    /// Ids of already-stored images to keep; the rest are pruned.
    #[serde(default)]
    pub existing_images: Vec<Uuid>,
    #[serde(default)]
    pub images: Vec<ImagePayload>,
}

/// Review storage as seen by the rating aggregator.
pub trait RatingStore {
    async fn list_ratings(&self, product_id: Uuid) -> Result<Vec<i32>, sqlx::Error>;
    async fn set_product_rating(&self, product_id: Uuid, rating: f64) -> Result<(), sqlx::Error>;
}

impl RatingStore for PgPool {
    async fn list_ratings(&self, product_id: Uuid) -> Result<Vec<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>("SELECT rating FROM reviews WHERE product_id = $1")
            .bind(product_id)
            .fetch_all(self)
            .await
    }

    async fn set_product_rating(&self, product_id: Uuid, rating: f64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE products SET rating = $1 WHERE id = $2")
            .bind(rating)
            .bind(product_id)
            .execute(self)
            .await?;
        Ok(())
    }
}

/// Arithmetic mean rounded to one decimal; 0 with no reviews.
pub fn average_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i32 = ratings.iter().sum();
    let mean = f64::from(sum) / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

/// Re-derives a product's stored rating from its current reviews. Runs after
/// every review mutation.
pub async fn recompute_rating<S: RatingStore>(
    store: &S,
    product_id: Uuid,
) -> Result<f64, sqlx::Error> {
    let ratings = store.list_ratings(product_id).await?;
    let rating = average_rating(&ratings);
    store.set_product_rating(product_id, rating).await?;
    Ok(rating)
}

/// A recompute failure after a committed review mutation leaves the stored
/// rating stale. That is non-fatal: the next mutation self-heals it, so the
/// failure is logged and swallowed.
pub async fn recompute_rating_logged(pool: &PgPool, product_id: Uuid) {
    match recompute_rating(pool, product_id).await {
        Ok(rating) => {
            tracing::debug!("Product {} rating updated to {:.1}", product_id, rating);
        }
        Err(err) => {
            tracing::warn!(
                "Rating recompute failed for product {}; stored value is stale until the next review mutation: {}",
                product_id,
                err
            );
        }
    }
}

impl ReviewWithImages {
    pub async fn list_for_products(
        pool: &PgPool,
        product_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT id, product_id, rating, comment, created_at FROM reviews \
             WHERE product_id = ANY($1) ORDER BY created_at DESC",
        )
        .bind(product_ids)
        .fetch_all(pool)
        .await?;

        let review_ids: Vec<Uuid> = reviews.iter().map(|r| r.id).collect();
        let images = sqlx::query_as::<_, ReviewImage>(
            "SELECT id, review_id, url, public_id FROM review_images WHERE review_id = ANY($1)",
        )
        .bind(&review_ids)
        .fetch_all(pool)
        .await?;

        let mut images_by_review: HashMap<Uuid, Vec<ReviewImage>> = HashMap::new();
        for image in images {
            images_by_review.entry(image.review_id).or_default().push(image);
        }

        Ok(reviews
            .into_iter()
            .map(|review| {
                let id = review.id;
                ReviewWithImages {
                    review,
                    images: images_by_review.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }

    async fn load(pool: &PgPool, review: Review) -> Result<Self, sqlx::Error> {
        let images = sqlx::query_as::<_, ReviewImage>(
            "SELECT id, review_id, url, public_id FROM review_images WHERE review_id = $1",
        )
        .bind(review.id)
        .fetch_all(pool)
        .await?;
        Ok(ReviewWithImages { review, images })
    }

    pub async fn create(
        pool: &PgPool,
        product_id: Uuid,
        req: &CreateReviewRequest,
    ) -> Result<Self, sqlx::Error> {
        let review = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (product_id, rating, comment) VALUES ($1, $2, $3) \
             RETURNING id, product_id, rating, comment, created_at",
        )
        .bind(product_id)
        .bind(req.rating)
        .bind(&req.comment)
        .fetch_one(pool)
        .await?;

        insert_images(pool, review.id, &req.images).await?;
        Self::load(pool, review).await
    }

    pub async fn update(
        pool: &PgPool,
        req: &UpdateReviewRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        let review = sqlx::query_as::<_, Review>(
            "UPDATE reviews SET comment = $1, rating = $2 WHERE id = $3 \
             RETURNING id, product_id, rating, comment, created_at",
        )
        .bind(&req.comment)
        .bind(req.rating)
        .bind(req.review_id)
        .fetch_optional(pool)
        .await?;

        let Some(review) = review else {
            return Ok(None);
        };

        // Prune stored images the client no longer references, then add new ones.
        sqlx::query("DELETE FROM review_images WHERE review_id = $1 AND NOT (id = ANY($2))")
            .bind(review.id)
            .bind(&req.existing_images)
            .execute(pool)
            .await?;
        insert_images(pool, review.id, &req.images).await?;

        Ok(Some(Self::load(pool, review).await?))
    }

    /// Deletes a review, returning the owning product id for the recompute.
    pub async fn delete(pool: &PgPool, review_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM reviews WHERE id = $1 RETURNING product_id",
        )
        .bind(review_id)
        .fetch_optional(pool)
        .await
    }
}

async fn insert_images(
    pool: &PgPool,
    review_id: Uuid,
    images: &[ImagePayload],
) -> Result<(), sqlx::Error> {
    for image in images {
        sqlx::query("INSERT INTO review_images (review_id, url, public_id) VALUES ($1, $2, $3)")
            .bind(review_id)
            .bind(&image.url)
            .bind(&image.public_id)
            .execute(pool)
            .await?;
    }
    Ok(())
}
