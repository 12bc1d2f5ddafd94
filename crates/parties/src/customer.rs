use serde::{Deserialize, Serialize};

use workstream_core::{validate, CustomerId, DomainResult, Entity, SoftDeletable, TenantId, TenantOwned};

/// Customer of a tenant. Soft-deleted rows are never returned by reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub tenant_id: TenantId,
    #[serde(skip_serializing, default)]
    pub is_deleted: bool,
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> CustomerId {
        self.id
    }
}

impl TenantOwned for Customer {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

impl SoftDeletable for Customer {
    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }
}

/// Input for a new customer. The tenant comes from the caller's scope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CustomerDraft {
    pub name: String,
    pub email: String,
}

impl CustomerDraft {
    pub fn validated(&self) -> DomainResult<CustomerDraft> {
        Ok(CustomerDraft {
            name: validate::non_empty("name", &self.name)?,
            email: validate::email("email", &self.email)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomerPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl CustomerPatch {
    pub fn validated(&self) -> DomainResult<CustomerPatch> {
        Ok(CustomerPatch {
            name: self
                .name
                .as_deref()
                .map(|v| validate::non_empty("name", v))
                .transpose()?,
            email: self
                .email
                .as_deref()
                .map(|v| validate::email("email", v))
                .transpose()?,
        })
    }

    pub fn apply(&self, customer: &mut Customer) {
        if let Some(name) = &self.name {
            customer.name = name.clone();
        }
        if let Some(email) = &self.email {
            customer.email = email.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn customer() -> Customer {
        Customer {
            id: CustomerId::new(1),
            name: "Globex".into(),
            email: "buy@globex.io".into(),
            tenant_id: TenantId::new(7),
            is_deleted: false,
        }
    }

    #[test]
    fn draft_is_trimmed_and_checked() {
        let draft = CustomerDraft {
            name: "  Globex ".into(),
            email: "buy@globex.io".into(),
        }
        .validated()
        .unwrap();
        assert_eq!(draft.name, "Globex");

        let bad = CustomerDraft {
            name: "Globex".into(),
            email: "buy-at-globex".into(),
        };
        assert!(bad.validated().is_err());
    }

    #[test]
    fn patch_keeps_unset_fields() {
        let mut c = customer();
        CustomerPatch {
            email: Some("sales@globex.io".into()),
            ..Default::default()
        }
        .validated()
        .unwrap()
        .apply(&mut c);
        assert_eq!(c.name, "Globex");
        assert_eq!(c.email, "sales@globex.io");
    }

    #[test]
    fn soft_delete_flag_is_not_serialized() {
        let mut c = customer();
        c.mark_deleted();
        assert!(c.is_deleted());
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("is_deleted").is_none());
    }

    proptest! {
        #[test]
        fn blank_names_are_rejected(name in "[ \t]{0,8}") {
            let draft = CustomerDraft { name, email: "a@b.io".into() };
            prop_assert!(draft.validated().is_err());
        }
    }
}
