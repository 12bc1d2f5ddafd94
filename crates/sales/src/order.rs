use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use workstream_core::{
    validate, CustomerId, DomainResult, Entity, InventoryItemId, OrderId, OrderItemId, TenantId,
    TenantOwned,
};

/// Order status lifecycle. Any status may be set explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = workstream_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(workstream_core::DomainError::validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

/// Order placed by a customer of the same tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub tenant_id: TenantId,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }
}

impl TenantOwned for Order {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Order line. The unit price is copied from the item when the line is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub inventory_item_id: InventoryItemId,
    pub quantity: i64,
    pub price_cents: i64,
}

impl OrderItem {
    pub fn line_total_cents(&self) -> i64 {
        self.price_cents.saturating_mul(self.quantity)
    }
}

impl Entity for OrderItem {
    type Id = OrderItemId;

    fn id(&self) -> OrderItemId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderDraft {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

impl OrderDraft {
    pub fn order_date_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.order_date.unwrap_or(now)
    }

    pub fn status(&self) -> OrderStatus {
        self.status.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderItemDraft {
    pub inventory_item_id: InventoryItemId,
    pub quantity: i64,
}

impl OrderItemDraft {
    pub fn validated(&self) -> DomainResult<OrderItemDraft> {
        Ok(OrderItemDraft {
            inventory_item_id: self.inventory_item_id,
            quantity: validate::positive("quantity", self.quantity)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn status_wire_form_is_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"shipped\"");
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn draft_defaults() {
        let now = Utc::now();
        let draft: OrderDraft = serde_json::from_str(r#"{"customer_id": 4}"#).unwrap();
        assert_eq!(draft.status(), OrderStatus::Pending);
        assert_eq!(draft.order_date_or(now), now);
    }

    #[test]
    fn line_quantity_must_be_positive() {
        let draft = OrderItemDraft {
            inventory_item_id: InventoryItemId::new(1),
            quantity: 0,
        };
        assert!(draft.validated().is_err());
    }

    proptest! {
        #[test]
        fn status_display_parses_back(idx in 0usize..5) {
            let all = [
                OrderStatus::Pending,
                OrderStatus::Processing,
                OrderStatus::Shipped,
                OrderStatus::Completed,
                OrderStatus::Cancelled,
            ];
            let status = all[idx];
            prop_assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
    }
}
