use serde::{Deserialize, Serialize};

use workstream_core::{validate, DomainResult, TenantId};

/// Root of isolation. Owns users and roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub company_name: String,
    pub contact_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TenantDraft {
    pub company_name: String,
    pub contact_email: String,
}

impl TenantDraft {
    pub fn validated(&self) -> DomainResult<TenantDraft> {
        Ok(TenantDraft {
            company_name: validate::non_empty("company name", &self.company_name)?,
            contact_email: validate::email("contact email", &self.contact_email)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TenantPatch {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl TenantPatch {
    pub fn validated(&self) -> DomainResult<TenantPatch> {
        Ok(TenantPatch {
            company_name: self
                .company_name
                .as_deref()
                .map(|v| validate::non_empty("company name", v))
                .transpose()?,
            contact_email: self
                .contact_email
                .as_deref()
                .map(|v| validate::email("contact email", v))
                .transpose()?,
        })
    }

    pub fn apply(&self, tenant: &mut Tenant) {
        if let Some(name) = &self.company_name {
            tenant.company_name = name.clone();
        }
        if let Some(email) = &self.contact_email {
            tenant.contact_email = email.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_validation() {
        let ok = TenantDraft {
            company_name: " Acme ".into(),
            contact_email: "ops@acme.io".into(),
        };
        assert_eq!(ok.validated().unwrap().company_name, "Acme");

        let bad = TenantDraft {
            company_name: "Acme".into(),
            contact_email: "nope".into(),
        };
        assert!(bad.validated().is_err());
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let mut tenant = Tenant {
            id: TenantId::new(1),
            company_name: "Acme".into(),
            contact_email: "ops@acme.io".into(),
        };
        let patch = TenantPatch {
            contact_email: Some("billing@acme.io".into()),
            ..Default::default()
        }
        .validated()
        .unwrap();
        patch.apply(&mut tenant);
        assert_eq!(tenant.company_name, "Acme");
        assert_eq!(tenant.contact_email, "billing@acme.io");
    }
}
