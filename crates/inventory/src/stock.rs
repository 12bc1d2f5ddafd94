//! Stock batches.
//!
//! Stock carries no tenant column of its own: it belongs to the tenant of its
//! inventory item, and every stock access is scoped through that item. Stock
//! is the one business entity that is hard-deleted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use workstream_core::{validate, DomainError, DomainResult, Entity, InventoryItemId, StockId};

pub const BATCH_NUMBER_MAX_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: StockId,
    pub inventory_item_id: InventoryItemId,
    pub quantity: i64,
    pub manufacturing_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub batch_number: String,
}

impl Entity for Stock {
    type Id = StockId;

    fn id(&self) -> StockId {
        self.id
    }
}

/// Stock joined with the name of its item, as listed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockView {
    #[serde(flatten)]
    pub stock: Stock,
    pub inventory_item_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StockDraft {
    pub inventory_item_id: InventoryItemId,
    pub quantity: i64,
    pub manufacturing_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub batch_number: String,
}

impl StockDraft {
    pub fn validated(&self) -> DomainResult<StockDraft> {
        check_dates(self.manufacturing_date, self.expiration_date)?;
        Ok(StockDraft {
            inventory_item_id: self.inventory_item_id,
            quantity: validate::non_negative("quantity", self.quantity)?,
            manufacturing_date: self.manufacturing_date,
            expiration_date: self.expiration_date,
            batch_number: validate_batch_number(&self.batch_number)?,
        })
    }
}

/// Partial update. Moving a batch to another item is not supported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StockPatch {
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub manufacturing_date: Option<NaiveDate>,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub batch_number: Option<String>,
}

impl StockPatch {
    /// Validate the patch against the row it will be applied to, so the date
    /// ordering holds for the merged result.
    pub fn validated_for(&self, current: &Stock) -> DomainResult<StockPatch> {
        check_dates(
            self.manufacturing_date.unwrap_or(current.manufacturing_date),
            self.expiration_date.unwrap_or(current.expiration_date),
        )?;
        Ok(StockPatch {
            quantity: self
                .quantity
                .map(|q| validate::non_negative("quantity", q))
                .transpose()?,
            manufacturing_date: self.manufacturing_date,
            expiration_date: self.expiration_date,
            batch_number: self
                .batch_number
                .as_deref()
                .map(validate_batch_number)
                .transpose()?,
        })
    }

    pub fn apply(&self, stock: &mut Stock) {
        if let Some(q) = self.quantity {
            stock.quantity = q;
        }
        if let Some(d) = self.manufacturing_date {
            stock.manufacturing_date = d;
        }
        if let Some(d) = self.expiration_date {
            stock.expiration_date = d;
        }
        if let Some(b) = &self.batch_number {
            stock.batch_number = b.clone();
        }
    }
}

fn check_dates(manufactured: NaiveDate, expires: NaiveDate) -> DomainResult<()> {
    if expires < manufactured {
        return Err(DomainError::validation(
            "expiration date must not be before manufacturing date",
        ));
    }
    Ok(())
}

fn validate_batch_number(batch: &str) -> DomainResult<String> {
    let batch = validate::non_empty("batch number", batch)?;
    if batch.chars().count() > BATCH_NUMBER_MAX_LEN {
        return Err(DomainError::validation(format!(
            "batch number must be at most {BATCH_NUMBER_MAX_LEN} characters"
        )));
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft() -> StockDraft {
        StockDraft {
            inventory_item_id: InventoryItemId::new(1),
            quantity: 40,
            manufacturing_date: date(2025, 1, 10),
            expiration_date: date(2026, 1, 10),
            batch_number: "B-001".into(),
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert_eq!(draft().validated().unwrap(), draft());
    }

    #[test]
    fn inverted_dates_are_rejected() {
        let mut d = draft();
        d.expiration_date = date(2024, 12, 31);
        assert!(d.validated().is_err());
    }

    #[test]
    fn long_batch_number_is_rejected() {
        let mut d = draft();
        d.batch_number = "x".repeat(BATCH_NUMBER_MAX_LEN + 1);
        assert!(d.validated().is_err());
    }

    #[test]
    fn patch_dates_are_checked_against_current_row() {
        let stock = Stock {
            id: StockId::new(5),
            inventory_item_id: InventoryItemId::new(1),
            quantity: 40,
            manufacturing_date: date(2025, 1, 10),
            expiration_date: date(2026, 1, 10),
            batch_number: "B-001".into(),
        };
        let patch = StockPatch {
            manufacturing_date: Some(date(2026, 6, 1)),
            ..Default::default()
        };
        assert!(patch.validated_for(&stock).is_err());

        let mut s = stock.clone();
        StockPatch {
            quantity: Some(12),
            ..Default::default()
        }
        .validated_for(&stock)
        .unwrap()
        .apply(&mut s);
        assert_eq!(s.quantity, 12);
        assert_eq!(s.batch_number, "B-001");
    }
}
