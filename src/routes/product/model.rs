use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::routes::review::model::ReviewWithImages;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub discount_price: Option<f64>,
    /// Denormalized 1-decimal mean of this product's review ratings.
    pub rating: f64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub url: String,
    pub public_id: Option<String>,
    pub ord: i32,
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
    pub reviews: Vec<ReviewWithImages>,
    pub favorited_by: Vec<Uuid>,
}

/// An already-hosted image; the backend stores metadata only.
#[derive(Debug, Deserialize)]
pub struct ImagePayload {
    pub url: String,
    pub public_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub images: Vec<ImagePayload>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub images: Vec<ImagePayload>,
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub is_published: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub limit: Option<i64>,
    pub order_by: Option<String>,
    pub order_direction: Option<String>,
    pub search: Option<String>,
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, discount_price, rating, is_published, created_at, updated_at";

fn order_clause(order_by: Option<&str>, direction: Option<&str>) -> String {
    // Whitelisted fragments only; anything else falls back to newest first.
    let column = match order_by {
        Some("price") => "price",
        Some("name") => "name",
        Some("rating") => "rating",
        _ => "created_at",
    };
    let direction = match direction {
        Some("asc") => "ASC",
        _ => "DESC",
    };
    format!("{column} {direction}")
}

impl Product {
    pub async fn list_published(
        pool: &PgPool,
        query: &ListProductsQuery,
    ) -> Result<Vec<ProductDetail>, sqlx::Error> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_published = TRUE \
               AND ($1::text IS NULL OR name ILIKE '%' || $1 || '%' \
                    OR description ILIKE '%' || $1 || '%') \
             ORDER BY {} LIMIT $2",
            order_clause(query.order_by.as_deref(), query.order_direction.as_deref())
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(query.search.as_deref())
            .bind(query.limit)
            .fetch_all(pool)
            .await?;

        attach_details(pool, products).await
    }

    pub async fn find_detail(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<ProductDetail>, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match product {
            Some(product) => Ok(attach_details(pool, vec![product]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn create(
        pool: &PgPool,
        req: &CreateProductRequest,
    ) -> Result<ProductDetail, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (name, description, price, discount_price, rating, is_published) \
             VALUES ($1, $2, $3, $4, 0, TRUE) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.price)
        .bind(req.discount_price)
        .fetch_one(pool)
        .await?;

        insert_images(pool, product.id, &req.images).await?;

        attach_details(pool, vec![product])
            .await?
            .pop()
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateProductRequest,
    ) -> Result<Option<ProductDetail>, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET name = $1, description = $2, price = $3, \
             discount_price = $4, updated_at = NOW() WHERE id = $5 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.price)
        .bind(req.discount_price)
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let Some(product) = product else {
            return Ok(None);
        };

        // The request carries the full image set; replace what is stored.
        sqlx::query("DELETE FROM product_images WHERE product_id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        insert_images(pool, id, &req.images).await?;

        Ok(attach_details(pool, vec![product]).await?.pop())
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_published(
        pool: &PgPool,
        id: Uuid,
        is_published: bool,
    ) -> Result<Option<ProductDetail>, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET is_published = $1, updated_at = NOW() \
             WHERE id = $2 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(is_published)
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match product {
            Some(product) => Ok(attach_details(pool, vec![product]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn list_favorited_by(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ProductDetail>, sqlx::Error> {
        // Columns are qualified here; favorites carries a created_at too.
        let products = sqlx::query_as::<_, Product>(
            "SELECT p.id, p.name, p.description, p.price, p.discount_price, p.rating, \
             p.is_published, p.created_at, p.updated_at FROM products p \
             JOIN favorites f ON f.product_id = p.id \
             WHERE f.user_id = $1 ORDER BY f.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        attach_details(pool, products).await
    }
}

async fn insert_images(
    pool: &PgPool,
    product_id: Uuid,
    images: &[ImagePayload],
) -> Result<(), sqlx::Error> {
    for (ord, image) in images.iter().enumerate() {
        sqlx::query(
            "INSERT INTO product_images (product_id, url, public_id, ord) VALUES ($1, $2, $3, $4)",
        )
        .bind(product_id)
        .bind(&image.url)
        .bind(&image.public_id)
        .bind(ord as i32)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn attach_details(
    pool: &PgPool,
    products: Vec<Product>,
) -> Result<Vec<ProductDetail>, sqlx::Error> {
    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();

    let images = sqlx::query_as::<_, ProductImage>(
        "SELECT id, product_id, url, public_id, ord FROM product_images \
         WHERE product_id = ANY($1) ORDER BY ord",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let reviews = ReviewWithImages::list_for_products(pool, &ids).await?;

    let favorites = sqlx::query_as::<_, (Uuid, Uuid)>(
        "SELECT product_id, user_id FROM favorites WHERE product_id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut images_by_product: HashMap<Uuid, Vec<ProductImage>> = HashMap::new();
    for image in images {
        images_by_product.entry(image.product_id).or_default().push(image);
    }

    let mut reviews_by_product: HashMap<Uuid, Vec<ReviewWithImages>> = HashMap::new();
    for review in reviews {
        reviews_by_product
            .entry(review.review.product_id)
            .or_default()
            .push(review);
    }

    let mut favorites_by_product: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (product_id, user_id) in favorites {
        favorites_by_product.entry(product_id).or_default().push(user_id);
    }

    Ok(products
        .into_iter()
        .map(|product| {
            let id = product.id;
            ProductDetail {
                product,
                images: images_by_product.remove(&id).unwrap_or_default(),
                reviews: reviews_by_product.remove(&id).unwrap_or_default(),
                favorited_by: favorites_by_product.remove(&id).unwrap_or_default(),
            }
        })
        .collect())
}
