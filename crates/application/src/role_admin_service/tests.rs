use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use laurel_core::{AppError, AppResult, UserIdentity};
use laurel_domain::{Permission, PermissionDefinition, PermissionId, RoleDefinition, RoleId};

use crate::{AuthorizationService, PermissionCache, RolePermissionRepository};

use super::{RoleAdminService, RolePermissions};

struct FakeRoleRepository {
    role: RoleDefinition,
    catalog: Vec<PermissionDefinition>,
    grants: Mutex<HashMap<RoleId, Vec<PermissionId>>>,
    created: Mutex<Vec<RoleDefinition>>,
}

impl FakeRoleRepository {
    fn new() -> Self {
        let catalog = [Permission::ACHIEVEMENTS_VERIFY, Permission::ACHIEVEMENTS_REJECT]
            .into_iter()
            .map(|permission| PermissionDefinition {
                id: PermissionId::new(),
                resource: permission.resource().to_owned(),
                action: permission
                    .as_str()
                    .split_once('.')
                    .map(|(_, action)| action.to_owned())
                    .unwrap_or_default(),
                description: String::new(),
                name: permission,
            })
            .collect();

        Self {
            role: RoleDefinition {
                id: RoleId::new(),
                name: "Dosen Wali".to_owned(),
                description: "academic advisor".to_owned(),
            },
            catalog,
            grants: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RolePermissionRepository for FakeRoleRepository {
    async fn list_permissions_for_role(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        let grants = self.grants.lock().await;
        Ok(grants
            .get(&role_id)
            .map(|ids| {
                self.catalog
                    .iter()
                    .filter(|definition| ids.contains(&definition.id))
                    .map(|definition| definition.name.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<RoleDefinition>> {
        Ok((role_id == self.role.id).then(|| self.role.clone()))
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<RoleDefinition>> {
        if self.role.name == name {
            return Ok(Some(self.role.clone()));
        }
        Ok(self
            .created
            .lock()
            .await
            .iter()
            .find(|role| role.name == name)
            .cloned())
    }

    async fn create_role(&self, role: &RoleDefinition) -> AppResult<()> {
        self.created.lock().await.push(role.clone());
        Ok(())
    }

    async fn find_permission(
        &self,
        permission: &Permission,
    ) -> AppResult<Option<PermissionDefinition>> {
        Ok(self
            .catalog
            .iter()
            .find(|definition| &definition.name == permission)
            .cloned())
    }

    async fn grant_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        let mut grants = self.grants.lock().await;
        let granted = grants.entry(role_id).or_default();
        if granted.contains(&permission_id) {
            return Ok(false);
        }
        granted.push(permission_id);
        Ok(true)
    }

    async fn revoke_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        let mut grants = self.grants.lock().await;
        let Some(granted) = grants.get_mut(&role_id) else {
            return Ok(false);
        };
        let before = granted.len();
        granted.retain(|value| value != &permission_id);
        Ok(granted.len() != before)
    }
}

#[derive(Default)]
struct RecordingCache {
    entries: Mutex<HashMap<RoleId, BTreeSet<Permission>>>,
    invalidated: Mutex<Vec<RoleId>>,
}

#[async_trait]
impl PermissionCache for RecordingCache {
    async fn get(&self, role_id: RoleId) -> AppResult<Option<BTreeSet<Permission>>> {
        Ok(self.entries.lock().await.get(&role_id).cloned())
    }

    async fn set(&self, role_id: RoleId, permissions: BTreeSet<Permission>) -> AppResult<()> {
        self.entries.lock().await.insert(role_id, permissions);
        Ok(())
    }

    async fn invalidate(&self, role_id: RoleId) -> AppResult<()> {
        self.entries.lock().await.remove(&role_id);
        self.invalidated.lock().await.push(role_id);
        Ok(())
    }
}

fn administrator() -> UserIdentity {
    UserIdentity::new(
        "3d1b0c0e-93a5-4d1b-9a57-0f5dfe1a7b11",
        "admin",
        None,
        Some(vec![
            Permission::ROLES_VIEW.as_str().to_owned(),
            Permission::ROLES_MANAGE.as_str().to_owned(),
            Permission::ROLES_CREATE.as_str().to_owned(),
        ]),
    )
}

fn build() -> (RoleAdminService, Arc<FakeRoleRepository>, Arc<RecordingCache>) {
    let repository = Arc::new(FakeRoleRepository::new());
    let cache = Arc::new(RecordingCache::default());
    let authorization = AuthorizationService::new(repository.clone(), cache.clone());
    (
        RoleAdminService::new(authorization, repository.clone()),
        repository,
        cache,
    )
}

#[tokio::test]
async fn grant_invalidates_cached_role_permissions() {
    let (service, repository, cache) = build();
    let role_id = repository.role.id;
    let lecturer = UserIdentity::new("lecturer", "lecturer", Some(role_id.to_string()), None);
    let authorization = AuthorizationService::new(repository.clone(), cache.clone());

    let before = authorization
        .require_permission(&lecturer, &Permission::ACHIEVEMENTS_VERIFY)
        .await;
    assert!(matches!(before, Err(AppError::Forbidden(_))));
    assert!(cache.entries.lock().await.contains_key(&role_id));

    let granted = service
        .grant_permission(&administrator(), role_id, &Permission::ACHIEVEMENTS_VERIFY)
        .await;
    assert!(granted.is_ok());
    assert_eq!(cache.invalidated.lock().await.as_slice(), &[role_id]);

    let after = authorization
        .require_permission(&lecturer, &Permission::ACHIEVEMENTS_VERIFY)
        .await;
    assert!(after.is_ok());
}

#[tokio::test]
async fn revoke_removes_grant() {
    let (service, repository, _cache) = build();
    let role_id = repository.role.id;

    let granted = service
        .grant_permission(&administrator(), role_id, &Permission::ACHIEVEMENTS_REJECT)
        .await;
    assert!(granted.is_ok());

    let revoked = service
        .revoke_permission(&administrator(), role_id, &Permission::ACHIEVEMENTS_REJECT)
        .await;
    assert!(revoked.is_ok());

    let listed = service
        .list_role_permissions(&administrator(), role_id)
        .await;
    assert_eq!(
        listed.map(|role| role.permissions).ok(),
        Some(Vec::<Permission>::new())
    );
}

#[tokio::test]
async fn unknown_role_or_permission_is_not_found() {
    let (service, repository, _cache) = build();

    let unknown_role = service
        .grant_permission(&administrator(), RoleId::new(), &Permission::ACHIEVEMENTS_VERIFY)
        .await;
    assert!(matches!(unknown_role, Err(AppError::NotFound(_))));

    let unknown_permission = service
        .grant_permission(
            &administrator(),
            repository.role.id,
            &Permission::ROLES_MANAGE,
        )
        .await;
    assert!(matches!(unknown_permission, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn changes_require_manage_permission() {
    let (service, repository, _cache) = build();
    let viewer = UserIdentity::new(
        "viewer",
        "viewer",
        None,
        Some(vec![Permission::ROLES_VIEW.as_str().to_owned()]),
    );

    let granted = service
        .grant_permission(&viewer, repository.role.id, &Permission::ACHIEVEMENTS_VERIFY)
        .await;
    assert!(matches!(granted, Err(AppError::Forbidden(_))));
    assert!(repository.grants.lock().await.is_empty());
}

#[tokio::test]
async fn created_role_is_found_by_name_with_empty_grants() {
    let (service, repository, _cache) = build();

    let created = service
        .create_role(&administrator(), "  Kaprodi ", "head of study program")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(created.name, "Kaprodi");
    assert_eq!(repository.created.lock().await.len(), 1);

    let found = service.get_role_by_name(&administrator(), "Kaprodi").await;
    assert_eq!(
        found.ok(),
        Some(RolePermissions {
            role: created,
            permissions: Vec::new(),
        })
    );

    let missing = service.get_role_by_name(&administrator(), "Dekan").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn duplicate_role_name_conflicts() {
    let (service, repository, _cache) = build();

    let duplicate = service
        .create_role(&administrator(), "Dosen Wali", "")
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    assert!(repository.created.lock().await.is_empty());

    let viewer = UserIdentity::new(
        "viewer",
        "viewer",
        None,
        Some(vec![Permission::ROLES_VIEW.as_str().to_owned()]),
    );
    let denied = service.create_role(&viewer, "Dekan", "").await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
}
