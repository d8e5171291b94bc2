use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Favorites storage: the existence of a (user, product) edge is the only
/// state.
pub trait FavoriteStore {
    async fn has_favorite(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, sqlx::Error>;
    async fn add_favorite(&self, user_id: Uuid, product_id: Uuid) -> Result<(), sqlx::Error>;
    async fn remove_favorite(&self, user_id: Uuid, product_id: Uuid) -> Result<(), sqlx::Error>;
}

impl FavoriteStore for PgPool {
    async fn has_favorite(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = $1 AND product_id = $2)",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self)
        .await
    }

    async fn add_favorite(&self, user_id: Uuid, product_id: Uuid) -> Result<(), sqlx::Error> {
        // The composite primary key keeps the edge unique; a concurrent insert
        // is absorbed rather than raised.
        sqlx::query(
            "INSERT INTO favorites (user_id, product_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self)
        .await?;
        Ok(())
    }

    async fn remove_favorite(&self, user_id: Uuid, product_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Added,
    Removed,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub added: bool,
    pub message: String,
}

/// Flips the favorite edge for (user, product). Toggling twice restores the
/// original state; concurrent toggles race and the last write wins.
pub async fn toggle<S: FavoriteStore>(
    store: &S,
    user_id: Uuid,
    product_id: Uuid,
) -> Result<ToggleOutcome, sqlx::Error> {
    if store.has_favorite(user_id, product_id).await? {
        store.remove_favorite(user_id, product_id).await?;
        Ok(ToggleOutcome::Removed)
    } else {
        store.add_favorite(user_id, product_id).await?;
        Ok(ToggleOutcome::Added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemFavorites {
        edges: Mutex<HashSet<(Uuid, Uuid)>>,
    }

    impl MemFavorites {
        fn edge_count(&self, user_id: Uuid, product_id: Uuid) -> usize {
            self.edges
                .lock()
                .unwrap()
                .iter()
                .filter(|&&(u, p)| u == user_id && p == product_id)
                .count()
        }
    }

    impl FavoriteStore for MemFavorites {
        async fn has_favorite(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, sqlx::Error> {
            Ok(self.edges.lock().unwrap().contains(&(user_id, product_id)))
        }

        async fn add_favorite(&self, user_id: Uuid, product_id: Uuid) -> Result<(), sqlx::Error> {
            self.edges.lock().unwrap().insert((user_id, product_id));
            Ok(())
        }

        async fn remove_favorite(
            &self,
            user_id: Uuid,
            product_id: Uuid,
        ) -> Result<(), sqlx::Error> {
            self.edges.lock().unwrap().remove(&(user_id, product_id));
            Ok(())
        }
    }

    #[tokio::test]
    async fn double_toggle_restores_original_state() {
        let store = MemFavorites::default();
        let user = Uuid::new_v4();
        let product = Uuid::new_v4();

        assert_eq!(toggle(&store, user, product).await.unwrap(), ToggleOutcome::Added);
        assert!(store.has_favorite(user, product).await.unwrap());

        assert_eq!(toggle(&store, user, product).await.unwrap(), ToggleOutcome::Removed);
        assert!(!store.has_favorite(user, product).await.unwrap());
    }

    #[tokio::test]
    async fn toggle_never_duplicates_the_edge() {
        let store = MemFavorites::default();
        let user = Uuid::new_v4();
        let product = Uuid::new_v4();

        for _ in 0..5 {
            toggle(&store, user, product).await.unwrap();
            assert!(store.edge_count(user, product) <= 1);
        }
        // Adding on top of an existing edge is absorbed, not duplicated.
        store.add_favorite(user, product).await.unwrap();
        store.add_favorite(user, product).await.unwrap();
        assert_eq!(store.edge_count(user, product), 1);
    }

    #[tokio::test]
    async fn toggle_is_scoped_to_the_user() {
        let store = MemFavorites::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let product = Uuid::new_v4();

        toggle(&store, alice, product).await.unwrap();
        assert!(store.has_favorite(alice, product).await.unwrap());
        assert!(!store.has_favorite(bob, product).await.unwrap());
    }
}
