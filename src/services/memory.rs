//! In-process backend. Records live in an ordered map keyed by a monotonic
//! sequence number, which doubles as the record id.

use crate::{
    models::camera::{CREATED_BY_ID, Camera, CameraFields, Page, sanitize},
    services::model::{ModelError, ModelResult, decode_page_token, encode_page_token},
};
use std::{collections::BTreeMap, ops::Bound, sync::Arc};
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    last_seq: i64,
    records: BTreeMap<i64, CameraFields>,
}

#[derive(Clone, Default)]
pub struct MemoryModel {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(
        &self,
        owner_id: Option<&str>,
        limit: usize,
        page_token: Option<&str>,
    ) -> ModelResult<Page> {
        let limit = limit.max(1);
        let after = page_token.map(decode_page_token).transpose()?;
        let lower = after.map_or(Bound::Unbounded, Bound::Excluded);

        let inner = self.inner.read().await;
        let mut rows: Vec<(i64, Camera)> = inner
            .records
            .range((lower, Bound::Unbounded))
            .filter(|(_, fields)| match owner_id {
                Some(owner) => fields.get(CREATED_BY_ID).map(String::as_str) == Some(owner),
                None => true,
            })
            .take(limit + 1)
            .map(|(seq, fields)| (*seq, Camera::new(seq.to_string(), fields.clone())))
            .collect();

        let mut next_page_token = None;
        if rows.len() > limit {
            rows.truncate(limit);
            next_page_token = rows.last().map(|(seq, _)| encode_page_token(*seq));
        }

        Ok(Page {
            cameras: rows.into_iter().map(|(_, camera)| camera).collect(),
            next_page_token,
        })
    }

    pub async fn create(&self, data: CameraFields) -> ModelResult<Camera> {
        let fields = sanitize(data);
        let mut inner = self.inner.write().await;
        inner.last_seq += 1;
        let seq = inner.last_seq;
        inner.records.insert(seq, fields.clone());
        Ok(Camera::new(seq.to_string(), fields))
    }

    pub async fn read(&self, id: &str) -> ModelResult<Camera> {
        let seq = parse_id(id)?;
        let inner = self.inner.read().await;
        inner
            .records
            .get(&seq)
            .map(|fields| Camera::new(seq.to_string(), fields.clone()))
            .ok_or_else(|| ModelError::NotFound(id.to_string()))
    }

    pub async fn update(&self, id: &str, data: CameraFields) -> ModelResult<Camera> {
        let seq = parse_id(id)?;
        let mut inner = self.inner.write().await;
        let fields = inner
            .records
            .get_mut(&seq)
            .ok_or_else(|| ModelError::NotFound(id.to_string()))?;
        fields.extend(sanitize(data));
        Ok(Camera::new(seq.to_string(), fields.clone()))
    }

    pub async fn delete(&self, id: &str) -> ModelResult<()> {
        let seq = parse_id(id)?;
        let mut inner = self.inner.write().await;
        inner
            .records
            .remove(&seq)
            .map(|_| ())
            .ok_or_else(|| ModelError::NotFound(id.to_string()))
    }
}

/// Only the canonical decimal form of a sequence number names a record, so
/// `01` or `+1` never alias `1`.
fn parse_id(id: &str) -> ModelResult<i64> {
    id.parse::<i64>()
        .ok()
        .filter(|seq| seq.to_string() == id)
        .ok_or_else(|| ModelError::NotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::camera::CREATED_BY;
    use std::collections::HashSet;

    fn fields(pairs: &[(&str, &str)]) -> CameraFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn create_assigns_fresh_ids_and_ignores_client_id() {
        let model = MemoryModel::new();
        let a = model
            .create(fields(&[("make", "Canon"), ("id", "bogus")]))
            .await
            .unwrap();
        let b = model.create(fields(&[("make", "Nikon")])).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_ne!(a.id, "bogus");
        assert_eq!(a.get("id"), None);
        assert_eq!(model.read(&a.id).await.unwrap(), a);
    }

    #[tokio::test]
    async fn paging_is_exhaustive_without_duplicates() {
        let model = MemoryModel::new();
        for i in 0..23 {
            let name = format!("m{}", i);
            model
                .create(fields(&[("model", name.as_str())]))
                .await
                .unwrap();
        }

        let mut seen = HashSet::new();
        let mut token: Option<String> = None;
        let mut pages = 0;
        loop {
            let page = model.list(None, 10, token.as_deref()).await.unwrap();
            assert!(page.cameras.len() <= 10);
            for camera in page.cameras {
                assert!(seen.insert(camera.id));
            }
            pages += 1;
            match page.next_page_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        assert_eq!(seen.len(), 23);
        assert_eq!(pages, 3);
    }

    #[tokio::test]
    async fn exact_page_boundary_has_no_next_token() {
        let model = MemoryModel::new();
        for _ in 0..10 {
            model.create(CameraFields::new()).await.unwrap();
        }
        let page = model.list(None, 10, None).await.unwrap();
        assert_eq!(page.cameras.len(), 10);
        assert_eq!(page.next_page_token, None);
    }

    #[tokio::test]
    async fn empty_listing_is_not_an_error() {
        let page = MemoryModel::new().list(None, 10, None).await.unwrap();
        assert!(page.cameras.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn list_by_filters_on_owner() {
        let model = MemoryModel::new();
        model
            .create(fields(&[(CREATED_BY, "alice"), (CREATED_BY_ID, "u1")]))
            .await
            .unwrap();
        model
            .create(fields(&[(CREATED_BY, "Anonymous")]))
            .await
            .unwrap();
        model
            .create(fields(&[(CREATED_BY, "bob"), (CREATED_BY_ID, "u2")]))
            .await
            .unwrap();

        let page = model.list(Some("u1"), 10, None).await.unwrap();
        assert_eq!(page.cameras.len(), 1);
        assert_eq!(page.cameras[0].get(CREATED_BY), Some("alice"));
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let model = MemoryModel::new();
        let camera = model
            .create(fields(&[("make", "Canon"), (CREATED_BY, "Anonymous")]))
            .await
            .unwrap();

        let updated = model
            .update(&camera.id, fields(&[("make", "Leica"), ("model", "M6")]))
            .await
            .unwrap();
        assert_eq!(updated.id, camera.id);
        assert_eq!(updated.get("make"), Some("Leica"));
        assert_eq!(updated.get("model"), Some("M6"));
        assert_eq!(updated.get(CREATED_BY), Some("Anonymous"));
    }

    #[tokio::test]
    async fn non_canonical_ids_do_not_alias_records() {
        let model = MemoryModel::new();
        let camera = model.create(fields(&[("make", "Canon")])).await.unwrap();
        assert_eq!(camera.id, "1");

        for alias in ["01", "001", "+1", " 1"] {
            assert!(
                matches!(model.read(alias).await, Err(ModelError::NotFound(_))),
                "{} resolved",
                alias
            );
            assert!(matches!(
                model.update(alias, CameraFields::new()).await,
                Err(ModelError::NotFound(_))
            ));
            assert!(matches!(
                model.delete(alias).await,
                Err(ModelError::NotFound(_))
            ));
        }
        assert_eq!(model.read("1").await.unwrap(), camera);
    }

    #[tokio::test]
    async fn list_by_pages_through_only_the_owners_records() {
        let model = MemoryModel::new();
        for i in 0..25 {
            let owner = if i % 2 == 0 { "u1" } else { "u2" };
            model
                .create(fields(&[(CREATED_BY_ID, owner)]))
                .await
                .unwrap();
        }

        let mut seen = HashSet::new();
        let mut token: Option<String> = None;
        let mut pages = 0;
        loop {
            let page = model.list(Some("u1"), 5, token.as_deref()).await.unwrap();
            for camera in page.cameras {
                assert_eq!(camera.created_by_id(), Some("u1"));
                assert!(seen.insert(camera.id));
            }
            pages += 1;
            match page.next_page_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        assert_eq!(seen.len(), 13);
        assert_eq!(pages, 3);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let model = MemoryModel::new();
        assert!(matches!(model.read("42").await, Err(ModelError::NotFound(_))));
        assert!(matches!(model.read("abc").await, Err(ModelError::NotFound(_))));
        assert!(matches!(
            model.update("42", CameraFields::new()).await,
            Err(ModelError::NotFound(_))
        ));

        let camera = model.create(CameraFields::new()).await.unwrap();
        model.delete(&camera.id).await.unwrap();
        assert!(matches!(
            model.delete(&camera.id).await,
            Err(ModelError::NotFound(_))
        ));
        assert!(matches!(
            model.read(&camera.id).await,
            Err(ModelError::NotFound(_))
        ));
    }
}
