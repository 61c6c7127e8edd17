use serde::{Deserialize, Serialize};

/// Three-state patch value for partial updates.
/// Unlike `Option<Option<T>>`, each variant reads unambiguously at the call site.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    /// Field was not included in the request (no change).
    #[default]
    Absent,
    /// Field was explicitly set to null (clear it).
    Null,
    /// Field was set to a new value.
    Value(T),
}

impl<T> From<Option<Option<T>>> for Patch<T> {
    fn from(v: Option<Option<T>>) -> Self {
        match v {
            None => Patch::Absent,
            Some(None) => Patch::Null,
            Some(Some(v)) => Patch::Value(v),
        }
    }
}

/// Item quantity as it appears on the wire. Multipart forms always carry
/// strings; JSON bodies may carry bare numbers. Both round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Number(serde_json::Number),
    Text(String),
}

impl From<String> for Quantity {
    fn from(s: String) -> Self {
        Quantity::Text(s)
    }
}

/// One entry of the shopping list collection.
///
/// `category` was introduced in a later protocol revision, so older records
/// omit it; it is skipped on output to keep them byte-stable. `image` names a
/// blob in the upload directory and is serialized as explicit `null` when
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub quantity: Quantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Field changes merged over an existing record. `None`/`Absent` leaves the
/// stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub quantity: Option<Quantity>,
    pub category: Patch<String>,
    /// Freshly stored blob name replacing the current image, if any.
    pub image: Option<String>,
}

/// Result of a committed update.
#[derive(Debug)]
pub struct UpdateOutcome {
    pub item: Item,
    /// Image reference the update displaced. The caller reclaims it only
    /// after the commit, never before.
    pub superseded_image: Option<String>,
}
