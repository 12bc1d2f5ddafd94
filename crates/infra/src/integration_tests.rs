//! Integration tests for the authorization core over the in-memory backend.
//!
//! Covers:
//! - permission checks and grant writes through `PermissionResolver`
//! - tenant provisioning, including failure at every step
//! - login through `Authenticator` and the token service

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use proptest::prelude::*;

    use workstream_auth::{
        permissions::{CUSTOMER_MANAGEMENT, ORDER_MANAGEMENT, ROLE_MANAGEMENT, USER_MANAGEMENT},
        roles::{GUEST, OWNER},
        Atomicity, AuthError, Authenticator, CredentialStore, NewUser, OwnerDraft, PasswordHasher,
        PermissionResolver, ProvisionRequest, ProvisioningCause, ProvisioningError,
        ProvisioningStep, ProvisioningSteps, ProvisioningStore, Provisioner, RbacError, RbacStore,
        Role, RolePermission, Tenant, TenantDraft, TokenConfig, TokenService, User,
        DEFAULT_CATALOG, DEFAULT_ROLES,
    };
    use workstream_core::{PermissionId, StoreError, StoreResult, TenantId};

    use crate::conformance::{fixture, Fixture};
    use crate::memory::MemoryStore;
    use crate::repository::{TenantDirectory, UserRepository};

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_cost(4)
    }

    fn tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new(TokenConfig::new(
            b"integration-secret".to_vec(),
            "workstream",
            "workstream-api",
        )))
    }

    fn seeded_store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.seed_permissions(&DEFAULT_CATALOG).unwrap();
        Arc::new(store)
    }

    fn request(company: &str, username: &str) -> ProvisionRequest {
        ProvisionRequest {
            tenant: TenantDraft {
                company_name: company.into(),
                contact_email: "ops@example.com".into(),
            },
            owner: OwnerDraft {
                username: username.into(),
                password: "hunter2".into(),
            },
        }
    }

    async fn two_tenants() -> Fixture<MemoryStore> {
        fixture(seeded_store()).await
    }

    /// A fresh role in tenant A with no grants.
    async fn blank_role(fx: &Fixture<MemoryStore>, name: &str) -> Role {
        let resolver = PermissionResolver::new(fx.store.clone());
        let created = resolver
            .create_role(&fx.a.scope, name, &[] as &[&str])
            .await
            .unwrap();
        fx.store.role(fx.a.tenant_id(), created.id).await.unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Permission resolver
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn owner_holds_the_full_catalog_and_other_roles_nothing() {
        let fx = two_tenants().await;
        let resolver = PermissionResolver::new(fx.store.clone());

        let roles = resolver.roles_with_permissions(&fx.a.scope).await.unwrap();
        assert_eq!(roles.len(), DEFAULT_ROLES.len());
        for role in roles {
            if role.name == OWNER {
                assert_eq!(role.permission_names.len(), DEFAULT_CATALOG.len());
            } else {
                assert!(role.permission_names.is_empty(), "{} has grants", role.name);
            }
        }

        for permission in DEFAULT_CATALOG.iter() {
            resolver.require(&fx.a, permission).await.unwrap();
        }
    }

    #[tokio::test]
    async fn granting_twice_adds_no_rows() {
        let fx = two_tenants().await;
        let resolver = PermissionResolver::new(fx.store.clone());
        let role = blank_role(&fx, "Clerk").await;

        let (customers, orders) = (CUSTOMER_MANAGEMENT, ORDER_MANAGEMENT);
        let names = [customers.as_str(), orders.as_str()];
        resolver.assign_permissions(&fx.a.scope, role.id, &names).await.unwrap();
        let rows = fx.store.grant_rows(role.id).unwrap();
        let again = resolver.assign_permissions(&fx.a.scope, role.id, &names).await.unwrap();

        assert_eq!(rows, 2);
        assert_eq!(fx.store.grant_rows(role.id).unwrap(), rows);
        assert_eq!(again.permission_names.len(), 2);
    }

    #[tokio::test]
    async fn grants_cannot_reach_a_role_of_another_tenant() {
        let fx = two_tenants().await;
        let resolver = PermissionResolver::new(fx.store.clone());
        let b_guest = fx
            .store
            .roles(fx.b.tenant_id())
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.name == GUEST)
            .unwrap();

        let err = resolver
            .assign_permissions(&fx.a.scope, b_guest.id, &[USER_MANAGEMENT.as_str()])
            .await
            .unwrap_err();
        assert_eq!(err, RbacError::NotFound);
        assert_eq!(fx.store.grant_rows(b_guest.id).unwrap(), 0);
        assert!(
            !resolver
                .has_permission(b_guest.id, fx.b.tenant_id(), USER_MANAGEMENT.as_str())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn grant_recorded_under_another_tenant_is_ignored() {
        let fx = two_tenants().await;
        let resolver = PermissionResolver::new(fx.store.clone());
        let role = blank_role(&fx, "Drifter").await;
        let permission = resolver
            .permission_by_name(USER_MANAGEMENT.as_str())
            .await
            .unwrap();

        // A grant row whose tenant differs from the role's tenant.
        fx.store
            .insert_raw_grant(RolePermission {
                role_id: role.id,
                permission_id: permission.id,
                tenant_id: fx.b.tenant_id(),
            })
            .unwrap();

        for tenant in [fx.a.tenant_id(), fx.b.tenant_id()] {
            assert!(
                !resolver
                    .has_permission(role.id, tenant, USER_MANAGEMENT.as_str())
                    .await
                    .unwrap()
            );
        }
    }

    #[tokio::test]
    async fn unknown_permission_name_writes_nothing() {
        let fx = two_tenants().await;
        let resolver = PermissionResolver::new(fx.store.clone());
        let role = blank_role(&fx, "Auditor").await;

        let err = resolver
            .assign_permissions(&fx.a.scope, role.id, &[CUSTOMER_MANAGEMENT.as_str(), "Teleportation"])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RbacError::PermissionNotFound {
                missing: vec!["Teleportation".to_string()]
            }
        );
        assert_eq!(fx.store.grant_rows(role.id).unwrap(), 0);
    }

    #[tokio::test]
    async fn create_role_with_unknown_permission_creates_no_role() {
        let fx = two_tenants().await;
        let resolver = PermissionResolver::new(fx.store.clone());
        let before = fx.store.role_rows(fx.a.tenant_id()).unwrap();

        let err = resolver
            .create_role(&fx.a.scope, "Ghost", &["NoSuchThing"])
            .await
            .unwrap_err();
        assert!(matches!(err, RbacError::PermissionNotFound { .. }));
        assert_eq!(fx.store.role_rows(fx.a.tenant_id()).unwrap(), before);
    }

    #[tokio::test]
    async fn duplicate_role_name_in_a_tenant_conflicts() {
        let fx = two_tenants().await;
        let resolver = PermissionResolver::new(fx.store.clone());

        let err = resolver
            .create_role(&fx.a.scope, OWNER, &[] as &[&str])
            .await
            .unwrap_err();
        assert!(matches!(err, RbacError::Store(StoreError::Conflict(_))));

        // The same name in another tenant is fine.
        resolver
            .create_role(&fx.b.scope, "Clerk", &[] as &[&str])
            .await
            .unwrap();
        resolver
            .create_role(&fx.a.scope, "Clerk", &[] as &[&str])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_role_replaces_the_grant_set() {
        let fx = two_tenants().await;
        let resolver = PermissionResolver::new(fx.store.clone());
        let role = blank_role(&fx, "Shifter").await;
        resolver
            .assign_permissions(&fx.a.scope, role.id, &[CUSTOMER_MANAGEMENT.as_str(), ORDER_MANAGEMENT.as_str()])
            .await
            .unwrap();

        let updated = resolver
            .update_role(&fx.a.scope, role.id, Some("Lead"), &[ROLE_MANAGEMENT.as_str()])
            .await
            .unwrap();
        assert_eq!(updated.name, "Lead");
        assert_eq!(updated.permission_names, vec![ROLE_MANAGEMENT.as_str().to_string()]);
        assert!(
            !resolver
                .has_permission(role.id, fx.a.tenant_id(), CUSTOMER_MANAGEMENT.as_str())
                .await
                .unwrap()
        );

        // A failed replace keeps the previous set.
        resolver
            .replace_permissions(&fx.a.scope, role.id, &["Nope"])
            .await
            .unwrap_err();
        assert_eq!(fx.store.grant_rows(role.id).unwrap(), 1);
    }

    #[tokio::test]
    async fn catalog_entries_added_later_are_found() {
        let fx = two_tenants().await;
        let resolver = PermissionResolver::new(fx.store.clone());
        let role = blank_role(&fx, "Analyst").await;

        resolver.list_permissions().await.unwrap();
        fx.store.seed_permissions(&["ReportManagement"]).unwrap();

        let with = resolver
            .assign_permissions(&fx.a.scope, role.id, &["ReportManagement"])
            .await
            .unwrap();
        assert_eq!(with.permission_names, vec!["ReportManagement".to_string()]);
    }

    #[tokio::test]
    async fn guest_is_denied_everything() {
        let fx = two_tenants().await;
        let resolver = PermissionResolver::new(fx.store.clone());
        let username = format!("guest-{}", fx.a.user_id);
        fx.store
            .create_user(
                &fx.a.scope,
                &NewUser {
                    username: username.clone(),
                    credential_hash: hasher().hash("pw").unwrap(),
                    role_id: None,
                },
            )
            .await
            .unwrap();

        let login = Authenticator::new(fx.store.clone(), fx.tokens.clone(), hasher());
        let issued = login.login(&username, "pw").await.unwrap();
        let session = fx.tokens.authenticate(&issued.token).unwrap();
        assert!(session.is_guest());
        assert_eq!(session.role_name, GUEST);

        for permission in DEFAULT_CATALOG.iter() {
            let err = resolver.require(&session, permission).await.unwrap_err();
            assert_eq!(err, AuthError::AuthorizationDenied(permission.to_string()));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        /// Granting more never revokes: after each step exactly the granted
        /// names answer true.
        #[test]
        fn checks_follow_the_grant_set(picks in proptest::collection::vec(0usize..DEFAULT_CATALOG.len(), 1..8)) {
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            rt.block_on(async {
                let fx = two_tenants().await;
                let resolver = PermissionResolver::new(fx.store.clone());
                let role = blank_role(&fx, "Prop").await;
                let catalog = DEFAULT_CATALOG;
                let mut granted = std::collections::BTreeSet::new();

                for pick in picks {
                    let name = catalog[pick].as_str();
                    resolver.assign_permissions(&fx.a.scope, role.id, &[name]).await.unwrap();
                    granted.insert(name);

                    for candidate in catalog.iter() {
                        let held = resolver
                            .has_permission(role.id, fx.a.tenant_id(), candidate.as_str())
                            .await
                            .unwrap();
                        assert_eq!(held, granted.contains(candidate.as_str()));
                        assert!(!resolver
                            .has_permission(role.id, fx.b.tenant_id(), candidate.as_str())
                            .await
                            .unwrap());
                    }
                }
            });
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Provisioning
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn provisioning_creates_the_tenant_roles_and_owner() {
        let store = seeded_store();
        let provisioner = Provisioner::new(store.clone(), hasher());

        let provisioned = provisioner
            .provision(&request("Acme", "wile"))
            .await
            .unwrap();

        let names: Vec<&str> = provisioned.roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, DEFAULT_ROLES.to_vec());
        let owner_role = provisioned.roles.iter().find(|r| r.name == OWNER).unwrap();
        assert_eq!(provisioned.owner.role_id, Some(owner_role.id));
        assert_eq!(provisioned.owner.tenant_id, provisioned.tenant.id);
        assert_ne!(provisioned.owner.credential_hash, "hunter2");
        assert_eq!(
            store.find_tenant(provisioned.tenant.id).await.unwrap().company_name,
            "Acme"
        );
    }

    #[tokio::test]
    async fn empty_catalog_fails_and_leaves_nothing() {
        let store = Arc::new(MemoryStore::new());
        let provisioner = Provisioner::new(store.clone(), hasher());

        let err = provisioner
            .provision(&request("Acme", "wile"))
            .await
            .unwrap_err();

        assert!(err.is_catalog_empty());
        assert!(matches!(
            err,
            ProvisioningError::Failed {
                step: ProvisioningStep::ProvisionGrants,
                cause: ProvisioningCause::CatalogEmpty,
                compensated: true,
            }
        ));
        let first = TenantId::new(1);
        assert_eq!(store.find_tenant(first).await.unwrap_err(), StoreError::NotFound);
        assert_eq!(store.role_rows(first).unwrap(), 0);
        assert_eq!(
            store.user_by_username("wile").await.unwrap_err(),
            StoreError::NotFound
        );
    }

    #[tokio::test]
    async fn duplicate_owner_username_rolls_the_tenant_back() {
        let store = seeded_store();
        let provisioner = Provisioner::new(store.clone(), hasher());
        let first = provisioner.provision(&request("Acme", "wile")).await.unwrap();

        let err = provisioner
            .provision(&request("Roadrunner Inc", "wile"))
            .await
            .unwrap_err();
        match err {
            ProvisioningError::Failed { step, cause, compensated } => {
                assert_eq!(step, ProvisioningStep::CreateOwner);
                assert!(matches!(cause, ProvisioningCause::Store(StoreError::Conflict(_))));
                assert!(compensated);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let second = TenantId::new(first.tenant.id.get() + 1);
        assert_eq!(store.find_tenant(second).await.unwrap_err(), StoreError::NotFound);
        assert_eq!(store.role_rows(second).unwrap(), 0);
        // The first tenant is untouched.
        assert!(store.find_tenant(first.tenant.id).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_requests_fail_before_touching_the_store() {
        let store = seeded_store();
        let provisioner = Provisioner::new(store.clone(), hasher());

        let mut bad_email = request("Acme", "wile");
        bad_email.tenant.contact_email = "not-an-email".into();
        let blank_owner = request("Acme", "   ");
        let mut no_password = request("Acme", "wile");
        no_password.owner.password = String::new();

        for req in [bad_email, blank_owner, no_password] {
            let err = provisioner.provision(&req).await.unwrap_err();
            assert!(matches!(err, ProvisioningError::InvalidRequest(_)), "{err:?}");
        }
        assert_eq!(store.find_tenant(TenantId::new(1)).await.unwrap_err(), StoreError::NotFound);
    }

    /// Where a `FaultyStore` fails. The catalog read has no step of its own;
    /// the saga reports it under `ProvisionGrants`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Fault {
        Step(ProvisioningStep),
        CatalogFetch,
    }

    /// Wraps the memory backend and fails at one chosen point.
    struct FaultyStore {
        inner: MemoryStore,
        fail_at: Fault,
    }

    struct FaultySteps<'a> {
        inner: Box<dyn ProvisioningSteps + 'a>,
        fail_at: Fault,
    }

    impl FaultySteps<'_> {
        fn trip(&self, at: Fault) -> StoreResult<()> {
            if self.fail_at == at {
                return Err(StoreError::backend(format!("injected failure at {at:?}")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ProvisioningSteps for FaultySteps<'_> {
        async fn insert_tenant(&mut self, draft: &TenantDraft) -> StoreResult<Tenant> {
            self.trip(Fault::Step(ProvisioningStep::CreateTenant))?;
            self.inner.insert_tenant(draft).await
        }

        async fn insert_roles(&mut self, tenant_id: TenantId, names: &[&str]) -> StoreResult<Vec<Role>> {
            self.trip(Fault::Step(ProvisioningStep::ProvisionRoles))?;
            self.inner.insert_roles(tenant_id, names).await
        }

        async fn permission_catalog(&mut self) -> StoreResult<Vec<workstream_auth::Permission>> {
            self.trip(Fault::CatalogFetch)?;
            self.inner.permission_catalog().await
        }

        async fn insert_grants(&mut self, role: &Role, ids: &[PermissionId]) -> StoreResult<()> {
            self.trip(Fault::Step(ProvisioningStep::ProvisionGrants))?;
            self.inner.insert_grants(role, ids).await
        }

        async fn insert_user(&mut self, tenant_id: TenantId, user: &NewUser) -> StoreResult<User> {
            self.trip(Fault::Step(ProvisioningStep::CreateOwner))?;
            self.inner.insert_user(tenant_id, user).await
        }

        async fn commit(self: Box<Self>) -> StoreResult<()> {
            self.trip(Fault::Step(ProvisioningStep::Commit))?;
            self.inner.commit().await
        }

        async fn rollback(self: Box<Self>) -> StoreResult<()> {
            self.inner.rollback().await
        }
    }

    #[async_trait]
    impl ProvisioningStore for FaultyStore {
        fn atomicity(&self) -> Atomicity {
            self.inner.atomicity()
        }

        async fn begin<'a>(&'a self) -> StoreResult<Box<dyn ProvisioningSteps + 'a>> {
            Ok(Box::new(FaultySteps {
                inner: self.inner.begin().await?,
                fail_at: self.fail_at,
            }))
        }

        async fn delete_tenant_cascade(&self, tenant_id: TenantId) -> StoreResult<()> {
            self.inner.delete_tenant_cascade(tenant_id).await
        }
    }

    #[tokio::test]
    async fn failure_at_any_step_leaves_nothing_behind() {
        for fail_at in [
            ProvisioningStep::CreateTenant,
            ProvisioningStep::ProvisionRoles,
            ProvisioningStep::ProvisionGrants,
            ProvisioningStep::CreateOwner,
            ProvisioningStep::Commit,
        ] {
            let inner = MemoryStore::new();
            inner.seed_permissions(&DEFAULT_CATALOG).unwrap();
            let store = Arc::new(FaultyStore {
                inner,
                fail_at: Fault::Step(fail_at),
            });
            let provisioner = Provisioner::new(store.clone(), hasher());

            let err = provisioner
                .provision(&request("Acme", "wile"))
                .await
                .unwrap_err();
            match err {
                ProvisioningError::Failed { step, compensated, .. } => {
                    assert_eq!(step, fail_at);
                    assert!(compensated, "not compensated at {fail_at}");
                }
                other => panic!("unexpected error at {fail_at}: {other:?}"),
            }

            let first = TenantId::new(1);
            assert!(store.inner.find_tenant(first).await.is_err(), "tenant left at {fail_at}");
            assert_eq!(store.inner.role_rows(first).unwrap(), 0, "roles left at {fail_at}");
            assert!(store.inner.user_by_username("wile").await.is_err(), "owner left at {fail_at}");
        }
    }

    #[tokio::test]
    async fn failed_catalog_read_is_compensated() {
        let inner = MemoryStore::new();
        inner.seed_permissions(&DEFAULT_CATALOG).unwrap();
        let store = Arc::new(FaultyStore {
            inner,
            fail_at: Fault::CatalogFetch,
        });
        let provisioner = Provisioner::new(store.clone(), hasher());

        let err = provisioner
            .provision(&request("Acme", "wile"))
            .await
            .unwrap_err();
        match err {
            ProvisioningError::Failed { step, compensated, .. } => {
                assert_eq!(step, ProvisioningStep::ProvisionGrants);
                assert!(compensated);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let first = TenantId::new(1);
        assert_eq!(store.inner.find_tenant(first).await.unwrap_err(), StoreError::NotFound);
        assert_eq!(store.inner.role_rows(first).unwrap(), 0);
        assert!(store.inner.user_by_username("wile").await.is_err());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Login
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn login_issues_a_token_for_the_owner() {
        let store = seeded_store();
        let tokens = tokens();
        let provisioned = Provisioner::new(store.clone(), hasher())
            .provision(&request("Acme", "wile"))
            .await
            .unwrap();

        let login = Authenticator::new(store.clone(), tokens.clone(), hasher());
        let issued = login.login(" wile ", "hunter2").await.unwrap();
        let session = tokens.authenticate(&issued.token).unwrap();

        assert_eq!(session.user_id, provisioned.owner.id);
        assert_eq!(session.tenant_id(), provisioned.tenant.id);
        assert_eq!(session.role_id, provisioned.owner.role_id);
        assert_eq!(session.role_name, OWNER);
        assert_eq!(session.expires_at, issued.expires_at);
    }

    #[tokio::test]
    async fn bad_credentials_are_indistinguishable() {
        let store = seeded_store();
        Provisioner::new(store.clone(), hasher())
            .provision(&request("Acme", "wile"))
            .await
            .unwrap();
        let login = Authenticator::new(store, tokens(), hasher());

        let wrong_password = login.login("wile", "hunter3").await.unwrap_err();
        let unknown_user = login.login("coyote", "hunter2").await.unwrap_err();
        assert_eq!(wrong_password, AuthError::Authentication);
        assert_eq!(unknown_user, AuthError::Authentication);
    }

    #[tokio::test]
    async fn tokens_from_another_issuer_do_not_authenticate() {
        let fx = two_tenants().await;
        let other = TokenService::new(TokenConfig::new(
            b"integration-secret".to_vec(),
            "someone-else",
            "workstream-api",
        ));
        let login = Authenticator::new(fx.store.clone(), Arc::new(other), hasher());
        let issued = login.login(&fx.a.username, "correct horse battery staple").await.unwrap();

        assert_eq!(
            fx.tokens.authenticate(&issued.token).unwrap_err(),
            AuthError::Authentication
        );
    }
}
