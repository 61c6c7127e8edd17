use super::document::{DocumentStore, StoreError};
use super::models::{Item, ItemUpdate, Patch, UpdateOutcome};

impl DocumentStore {
    // ========================================================================
    // Record operations
    // ========================================================================

    /// Append a freshly created record to the end of the collection.
    pub async fn append(&self, item: Item) -> Result<(), StoreError> {
        debug_assert!(!item.id.is_empty(), "item id must not be empty");

        let _guard = self.write_lock.lock().await;
        let mut items = self.load().await?;
        items.push(item);
        self.replace(&items).await
    }

    /// Merge `update` over the record with the given id and commit.
    ///
    /// Returns `None` when the id is unknown; the collection is left
    /// untouched in that case. The outcome carries the image reference a new
    /// upload displaced -- the caller deletes that blob only after this
    /// commit has succeeded.
    pub async fn update(
        &self,
        id: &str,
        update: ItemUpdate,
    ) -> Result<Option<UpdateOutcome>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.load().await?;

        let (item, superseded_image) = {
            let Some(existing) = items.iter_mut().find(|item| item.id == id) else {
                return Ok(None);
            };

            if let Some(name) = update.name {
                existing.name = name;
            }
            if let Some(quantity) = update.quantity {
                existing.quantity = quantity;
            }
            match update.category {
                Patch::Absent => {}
                Patch::Null => existing.category = None,
                Patch::Value(category) => existing.category = Some(category),
            }
            let superseded = match update.image {
                Some(image) => existing.image.replace(image),
                None => None,
            };

            (existing.clone(), superseded)
        };

        self.replace(&items).await?;
        Ok(Some(UpdateOutcome {
            item,
            superseded_image,
        }))
    }

    /// Remove the record with the given id and commit.
    ///
    /// Returns the removed record so the caller can reclaim its blob after
    /// the commit, or `None` when the id is unknown.
    pub async fn remove(&self, id: &str) -> Result<Option<Item>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.load().await?;

        let Some(index) = items.iter().position(|item| item.id == id) else {
            return Ok(None);
        };
        let item = items.remove(index);

        self.replace(&items).await?;
        Ok(Some(item))
    }
}
