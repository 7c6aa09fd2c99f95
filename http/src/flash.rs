//! # Flash: one-request data and error bags
//!
//! Flash storage belongs to the session layer; Kinetic only needs to read all
//! of it and write it back. Validation errors are staged under
//! `errors.<bag>` so independent forms on one page keep separate error sets.

use async_trait::async_trait;
use kinetic_core::BoxError;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Flash key holding the staged error bags.
pub const ERRORS_KEY: &str = "errors";

pub type FlashData = Map<String, Value>;

#[derive(Debug, Error)]
pub enum FlashError {
    #[error("flash storage failed: {0}")]
    Backend(#[source] BoxError),
}

/// Session-scoped flash storage, provided by the application.
#[async_trait]
pub trait FlashStore: Send + Sync {
    async fn get_all(&self) -> Result<FlashData, FlashError>;
    async fn set(&self, data: FlashData) -> Result<(), FlashError>;
}

/// In-process flash store, handy for tests and single-node demos.
#[derive(Debug, Default)]
pub struct MemoryFlash {
    data: Mutex<FlashData>,
}

impl MemoryFlash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> FlashData {
        self.data.lock().clone()
    }
}

#[async_trait]
impl FlashStore for MemoryFlash {
    async fn get_all(&self) -> Result<FlashData, FlashError> {
        Ok(self.data.lock().clone())
    }

    async fn set(&self, data: FlashData) -> Result<(), FlashError> {
        *self.data.lock() = data;
        Ok(())
    }
}

/// Stages `errors` under `bag` for the next render, keeping other bags.
pub async fn stage_errors(
    store: &dyn FlashStore,
    bag: &str,
    errors: Map<String, Value>,
) -> Result<(), FlashError> {
    let mut data = store.get_all().await?;
    let bags = data
        .entry(ERRORS_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    if !bags.is_object() {
        *bags = Value::Object(Map::new());
    }
    if let Value::Object(bags) = bags {
        bags.insert(bag.to_string(), Value::Object(errors));
    }
    store.set(data).await
}

/// Staged error bags, left in place.
pub async fn staged_errors(store: &dyn FlashStore) -> Result<Map<String, Value>, FlashError> {
    match store.get_all().await?.remove(ERRORS_KEY) {
        Some(Value::Object(bags)) => Ok(bags),
        Some(_) | None => Ok(Map::new()),
    }
}

/// Drops the staged error bags, keeping the rest of the flash data.
pub async fn clear_errors(store: &dyn FlashStore) -> Result<(), FlashError> {
    let mut data = store.get_all().await?;
    if data.remove(ERRORS_KEY).is_some() {
        store.set(data).await?;
    }
    Ok(())
}

/// Shapes staged bags for the `errors` prop.
///
/// With a requested bag only that bag is returned, still keyed by its name;
/// without one every staged bag is returned.
pub fn scope_errors(mut bags: Map<String, Value>, requested: Option<&str>) -> Value {
    match requested {
        Some(bag) => {
            let mut scoped = Map::new();
            if let Some(errors) = bags.remove(bag) {
                scoped.insert(bag.to_string(), errors);
            }
            Value::Object(scoped)
        }
        None => Value::Object(bags),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_stage_keeps_other_bags_and_flash() {
        let flash = MemoryFlash::new();
        flash
            .set(object(json!({"message": "Saved"})))
            .await
            .unwrap();

        stage_errors(&flash, "login", object(json!({"email": "required"})))
            .await
            .unwrap();
        stage_errors(&flash, "signup", object(json!({"name": "too short"})))
            .await
            .unwrap();

        assert_eq!(
            Value::Object(flash.snapshot()),
            json!({
                "message": "Saved",
                "errors": {
                    "login": {"email": "required"},
                    "signup": {"name": "too short"}
                }
            })
        );
    }

    #[tokio::test]
    async fn test_staged_errors_stay_until_cleared() {
        let flash = MemoryFlash::new();
        flash
            .set(object(json!({"message": "Saved"})))
            .await
            .unwrap();
        stage_errors(&flash, "default", object(json!({"title": "required"})))
            .await
            .unwrap();

        let errors = staged_errors(&flash).await.unwrap();
        assert_eq!(Value::Object(errors), json!({"default": {"title": "required"}}));
        assert!(!staged_errors(&flash).await.unwrap().is_empty());

        clear_errors(&flash).await.unwrap();
        assert!(staged_errors(&flash).await.unwrap().is_empty());
        assert_eq!(Value::Object(flash.snapshot()), json!({"message": "Saved"}));
    }

    #[test]
    fn test_scope_errors() {
        let bags = object(json!({
            "login": {"email": "required"},
            "signup": {"name": "too short"}
        }));

        assert_eq!(
            scope_errors(bags.clone(), Some("login")),
            json!({"login": {"email": "required"}})
        );
        assert_eq!(scope_errors(bags.clone(), Some("missing")), json!({}));
        assert_eq!(scope_errors(bags.clone(), None), Value::Object(bags));
    }
}
