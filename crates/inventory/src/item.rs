use serde::{Deserialize, Serialize};

use workstream_core::{
    validate, DomainResult, Entity, InventoryItemId, SoftDeletable, TenantId, TenantOwned,
};

/// Sellable item of a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in the smallest currency unit (e.g. cents).
    pub price_cents: i64,
    pub tenant_id: TenantId,
    #[serde(skip_serializing, default)]
    pub is_deleted: bool,
}

impl InventoryItem {
    /// Case-insensitive substring match on the name.
    pub fn name_matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}

impl Entity for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> InventoryItemId {
        self.id
    }
}

impl TenantOwned for InventoryItem {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

impl SoftDeletable for InventoryItem {
    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InventoryItemDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
}

impl InventoryItemDraft {
    pub fn validated(&self) -> DomainResult<InventoryItemDraft> {
        Ok(InventoryItemDraft {
            name: validate::non_empty("name", &self.name)?,
            description: normalize_description(self.description.as_deref()),
            price_cents: validate::non_negative("price", self.price_cents)?,
        })
    }
}

/// Partial update; unset fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InventoryItemPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
}

impl InventoryItemPatch {
    pub fn validated(&self) -> DomainResult<InventoryItemPatch> {
        Ok(InventoryItemPatch {
            name: self
                .name
                .as_deref()
                .map(|v| validate::non_empty("name", v))
                .transpose()?,
            description: self.description.as_ref().map(|d| d.trim().to_string()),
            price_cents: self
                .price_cents
                .map(|p| validate::non_negative("price", p))
                .transpose()?,
        })
    }

    pub fn apply(&self, item: &mut InventoryItem) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = normalize_description(Some(description));
        }
        if let Some(price) = self.price_cents {
            item.price_cents = price;
        }
    }
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}
