//! Reconciliation engine
//!
//! Runs once per session bootstrap: migrates any legacy locally-cached
//! records into the server store, de-duplicating against existing rows,
//! then replaces the in-memory snapshot with the authoritative server
//! state. Safe to call on every start; a missing legacy cache makes the
//! merge a no-op.
//!
//! Matching across the two id spaces is heuristic: users join on
//! lower-cased email, assets on the lower-cased `serial|name` pair, and
//! assignments de-duplicate on the mapped `(userId, assetId)` pair.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use common::models::{
    Asset, Assignment, AssignmentRow, CreateAssetRequest, CreateAssignmentRequest,
    CreateUserRequest, LegacyStore, User,
};

use crate::api::Directory;
use crate::cache::LegacyCache;
use crate::error::ClientResult;
use crate::store::{SnapshotCell, Store};

/// Placeholder password for accounts created from legacy records
pub const TEMP_PASSWORD: &str = "Temp123!";

fn asset_key(serial: &str, name: &str) -> String {
    format!("{}|{}", serial.to_lowercase(), name.to_lowercase())
}

/// Counters describing what a merge did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub users_created: usize,
    pub assets_created: usize,
    pub assignments_created: usize,
    pub dangling_skipped: usize,
    pub duplicates_skipped: usize,
}

/// Merge the legacy cache into the server store and return the fresh
/// snapshot, installed into `store` with a bumped generation.
///
/// The legacy blob is consumed exactly once: it is removed even when
/// the merge fails part-way, in which case the error is propagated
/// after the removal and unprocessed records are dropped.
pub async fn reconcile<D, C>(api: &D, cache: &C, store: &SnapshotCell) -> ClientResult<Arc<Store>>
where
    D: Directory,
    C: LegacyCache,
{
    let (users, assets, assignments) = tokio::try_join!(
        api.list_users(),
        api.list_assets(),
        api.list_assignments()
    )?;

    if let Some(raw) = cache.load()? {
        let outcome = merge_raw(api, &raw, &users, &assets, &assignments).await;
        cache.remove()?;
        let stats = outcome?;
        info!(
            users = stats.users_created,
            assets = stats.assets_created,
            assignments = stats.assignments_created,
            dangling = stats.dangling_skipped,
            duplicates = stats.duplicates_skipped,
            "Legacy cache merged"
        );
    }

    let (users, assets, assignments) = tokio::try_join!(
        api.list_users(),
        api.list_assets(),
        api.list_assignments()
    )?;
    let assignments = assignments.into_iter().map(Assignment::from).collect();

    Ok(store.replace(users, assets, assignments))
}

async fn merge_raw<D: Directory>(
    api: &D,
    raw: &str,
    users: &[User],
    assets: &[Asset],
    assignments: &[AssignmentRow],
) -> ClientResult<MergeStats> {
    let legacy: LegacyStore = serde_json::from_str(raw)?;
    merge_legacy(api, legacy, users, assets, assignments).await
}

/// Apply the legacy records against the current server state.
///
/// Creates run sequentially, one record at a time, so the id mapping is
/// deterministic and a record cannot race a duplicate of itself.
async fn merge_legacy<D: Directory>(
    api: &D,
    legacy: LegacyStore,
    users: &[User],
    assets: &[Asset],
    assignments: &[AssignmentRow],
) -> ClientResult<MergeStats> {
    let mut stats = MergeStats::default();

    let mut users_by_email: HashMap<String, Uuid> = users
        .iter()
        .map(|u| (u.email.to_lowercase(), u.id))
        .collect();
    let mut assets_by_key: HashMap<String, Uuid> = assets
        .iter()
        .map(|a| (asset_key(&a.serial, &a.name), a.id))
        .collect();
    let mut assignment_keys: HashSet<(Uuid, Uuid)> = assignments
        .iter()
        .map(|a| (a.user_id, a.asset_id))
        .collect();

    let mut user_ids: HashMap<String, Uuid> = HashMap::new();
    for legacy_user in legacy.users {
        let email_key = legacy_user.email.to_lowercase();
        if let Some(&id) = users_by_email.get(&email_key) {
            user_ids.insert(legacy_user.id, id);
        } else {
            let created = api
                .create_user(CreateUserRequest {
                    name: legacy_user.name,
                    email: legacy_user.email,
                    department: legacy_user.department,
                    password: Some(TEMP_PASSWORD.to_string()),
                    role: legacy_user.role,
                })
                .await?;
            // Register the fresh email so a later legacy duplicate
            // matches this session's creation instead of re-creating.
            users_by_email.insert(created.email.to_lowercase(), created.id);
            user_ids.insert(legacy_user.id, created.id);
            stats.users_created += 1;
        }
    }

    let mut asset_ids: HashMap<String, Uuid> = HashMap::new();
    for legacy_asset in legacy.assets {
        let key = asset_key(
            legacy_asset.serial.as_deref().unwrap_or_default(),
            &legacy_asset.name,
        );
        if let Some(&id) = assets_by_key.get(&key) {
            asset_ids.insert(legacy_asset.id, id);
        } else {
            let created = api
                .create_asset(CreateAssetRequest {
                    name: legacy_asset.name,
                    model: legacy_asset.model.unwrap_or_default(),
                    serial: legacy_asset.serial.unwrap_or_default(),
                    category: legacy_asset.category.unwrap_or_default(),
                })
                .await?;
            assets_by_key.insert(asset_key(&created.serial, &created.name), created.id);
            asset_ids.insert(legacy_asset.id, created.id);
            stats.assets_created += 1;
        }
    }

    for legacy_assignment in legacy.assignments {
        let (Some(&user_id), Some(&asset_id)) = (
            user_ids.get(&legacy_assignment.user_id),
            asset_ids.get(&legacy_assignment.asset_id),
        ) else {
            // Dangling reference in the legacy data; drop it silently.
            stats.dangling_skipped += 1;
            continue;
        };

        let pair = (user_id, asset_id);
        if assignment_keys.contains(&pair) {
            stats.duplicates_skipped += 1;
            continue;
        }

        api.create_assignment(CreateAssignmentRequest {
            user_id,
            asset_id,
            note: legacy_assignment.note,
            assigned_at: legacy_assignment.assigned_at,
        })
        .await?;
        assignment_keys.insert(pair);
        stats.assignments_created += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    use common::models::Role;

    use crate::cache::MemoryLegacyCache;
    use crate::error::ClientError;

    /// In-memory stand-in for the API service
    #[derive(Default)]
    struct FakeDirectory {
        users: Mutex<Vec<User>>,
        assets: Mutex<Vec<Asset>>,
        assignments: Mutex<Vec<Assignment>>,
        fail_assignment_creates: bool,
    }

    impl FakeDirectory {
        fn with_user(self, name: &str, email: &str) -> Self {
            self.users.lock().unwrap().push(User {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
                department: None,
                role: Role::User,
            });
            self
        }

        fn with_asset(self, name: &str, serial: &str) -> Self {
            self.assets.lock().unwrap().push(Asset {
                id: Uuid::new_v4(),
                name: name.to_string(),
                model: "generic".to_string(),
                serial: serial.to_string(),
                category: "Bilgisayar".to_string(),
            });
            self
        }

        fn users(&self) -> Vec<User> {
            self.users.lock().unwrap().clone()
        }

        fn assets(&self) -> Vec<Asset> {
            self.assets.lock().unwrap().clone()
        }

        fn assignments(&self) -> Vec<Assignment> {
            self.assignments.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Directory for FakeDirectory {
        async fn list_users(&self) -> ClientResult<Vec<User>> {
            Ok(self.users())
        }

        async fn list_assets(&self) -> ClientResult<Vec<Asset>> {
            Ok(self.assets())
        }

        async fn list_assignments(&self) -> ClientResult<Vec<AssignmentRow>> {
            let users = self.users();
            let assets = self.assets();
            let rows = self
                .assignments()
                .into_iter()
                .filter_map(|a| {
                    let user = users.iter().find(|u| u.id == a.user_id)?;
                    let asset = assets.iter().find(|s| s.id == a.asset_id)?;
                    Some(AssignmentRow {
                        id: a.id,
                        user_id: a.user_id,
                        asset_id: a.asset_id,
                        assigned_at: a.assigned_at,
                        note: a.note,
                        user_name: user.name.clone(),
                        user_email: user.email.clone(),
                        asset_name: asset.name.clone(),
                        asset_model: asset.model.clone(),
                        asset_serial: asset.serial.clone(),
                        asset_category: asset.category.clone(),
                    })
                })
                .collect();
            Ok(rows)
        }

        async fn create_user(&self, payload: CreateUserRequest) -> ClientResult<User> {
            let user = User {
                id: Uuid::new_v4(),
                name: payload.name,
                email: payload.email,
                department: payload.department,
                role: payload.role.unwrap_or(Role::User),
            };
            self.users.lock().unwrap().push(user.clone());
            Ok(user)
        }

        async fn create_asset(&self, payload: CreateAssetRequest) -> ClientResult<Asset> {
            let asset = Asset {
                id: Uuid::new_v4(),
                name: payload.name,
                model: payload.model,
                serial: payload.serial,
                category: payload.category,
            };
            self.assets.lock().unwrap().push(asset.clone());
            Ok(asset)
        }

        async fn create_assignment(
            &self,
            payload: CreateAssignmentRequest,
        ) -> ClientResult<Assignment> {
            if self.fail_assignment_creates {
                return Err(ClientError::Api {
                    status: 500,
                    code: "assignment_create_failed".to_string(),
                });
            }
            let assignment = Assignment {
                id: Uuid::new_v4(),
                user_id: payload.user_id,
                asset_id: payload.asset_id,
                assigned_at: payload.assigned_at.unwrap_or_else(Utc::now),
                note: payload.note,
            };
            self.assignments.lock().unwrap().push(assignment.clone());
            Ok(assignment)
        }
    }

    const END_TO_END_BLOB: &str = r#"{
        "users": [{"id": "L1", "name": "Ann", "email": "Ann@x.com"}],
        "assets": [{"id": "A1", "name": "Dell", "serial": "S1", "category": "Bilgisayar"}],
        "assignments": [{"userId": "L1", "assetId": "A1", "note": "init"}]
    }"#;

    #[tokio::test]
    async fn end_to_end_migration_of_legacy_blob() {
        let api = FakeDirectory::default();
        let cache = MemoryLegacyCache::with_blob(END_TO_END_BLOB);
        let store = SnapshotCell::new();

        let snapshot = reconcile(&api, &cache, &store).await.unwrap();

        let users = api.users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "Ann@x.com");

        let assets = api.assets();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].name, "Dell");
        assert_eq!(assets[0].serial, "S1");

        let assignments = api.assignments();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].user_id, users[0].id);
        assert_eq!(assignments[0].asset_id, assets[0].id);
        assert_eq!(assignments[0].note.as_deref(), Some("init"));

        // The blob key is gone and the snapshot is the server state.
        assert!(cache.load().unwrap().is_none());
        assert_eq!(snapshot.users, users);
        assert_eq!(snapshot.assignments.len(), 1);
    }

    #[tokio::test]
    async fn missing_cache_is_a_noop_merge_and_repeat_runs_are_idempotent() {
        let api = FakeDirectory::default()
            .with_user("Ann", "ann@x.com")
            .with_asset("Laptop", "SN1");
        let cache = MemoryLegacyCache::empty();
        let store = SnapshotCell::new();

        let first = reconcile(&api, &cache, &store).await.unwrap();
        let second = reconcile(&api, &cache, &store).await.unwrap();

        assert_eq!(api.users().len(), 1);
        assert_eq!(api.assets().len(), 1);
        assert_eq!(first.users, second.users);
        assert_eq!(first.assets, second.assets);
        assert_eq!(first.assignments, second.assignments);
        // Each replacement still bumps the generation.
        assert_eq!(first.generation, 1);
        assert_eq!(second.generation, 2);
    }

    #[tokio::test]
    async fn second_run_after_migration_creates_nothing_new() {
        let api = FakeDirectory::default();
        let cache = MemoryLegacyCache::with_blob(END_TO_END_BLOB);
        let store = SnapshotCell::new();

        let first = reconcile(&api, &cache, &store).await.unwrap();
        let second = reconcile(&api, &cache, &store).await.unwrap();

        assert_eq!(api.users().len(), 1);
        assert_eq!(api.assets().len(), 1);
        assert_eq!(api.assignments().len(), 1);
        assert_eq!(first.users, second.users);
        assert_eq!(first.assets, second.assets);
        assert_eq!(first.assignments, second.assignments);
    }

    #[tokio::test]
    async fn email_matching_is_case_insensitive() {
        let api = FakeDirectory::default().with_user("Ann", "a@x.com");
        let existing_id = api.users()[0].id;
        let blob = r#"{
            "users": [{"id": "L1", "name": "Ann", "email": "A@x.com"}],
            "assets": [],
            "assignments": []
        }"#;
        let cache = MemoryLegacyCache::with_blob(blob);
        let store = SnapshotCell::new();

        reconcile(&api, &cache, &store).await.unwrap();

        let users = api.users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, existing_id);
    }

    #[tokio::test]
    async fn asset_matching_key_is_serial_and_name_case_insensitive() {
        let api = FakeDirectory::default().with_asset("laptop", "sn1");
        let existing_id = api.assets()[0].id;
        let blob = r#"{
            "users": [],
            "assets": [{"id": "A1", "name": "Laptop", "serial": "SN1", "category": "Bilgisayar"}],
            "assignments": []
        }"#;
        let cache = MemoryLegacyCache::with_blob(blob);
        let store = SnapshotCell::new();

        reconcile(&api, &cache, &store).await.unwrap();

        let assets = api.assets();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, existing_id);
    }

    #[tokio::test]
    async fn intra_batch_duplicate_email_matches_this_sessions_creation() {
        let api = FakeDirectory::default();
        let blob = r#"{
            "users": [
                {"id": "L1", "name": "Ann", "email": "ann@x.com"},
                {"id": "L2", "name": "Ann Again", "email": "ANN@x.com"}
            ],
            "assets": [],
            "assignments": []
        }"#;
        let cache = MemoryLegacyCache::with_blob(blob);
        let store = SnapshotCell::new();

        reconcile(&api, &cache, &store).await.unwrap();

        // One creation; the second legacy record mapped onto it.
        assert_eq!(api.users().len(), 1);
        assert_eq!(api.users()[0].name, "Ann");
    }

    #[tokio::test]
    async fn dangling_legacy_assignment_is_dropped_silently() {
        let api = FakeDirectory::default();
        let blob = r#"{
            "users": [{"id": "L1", "name": "Ann", "email": "ann@x.com"}],
            "assets": [],
            "assignments": [
                {"userId": "L1", "assetId": "A-missing"},
                {"userId": "U-missing", "assetId": "A-missing"}
            ]
        }"#;
        let cache = MemoryLegacyCache::with_blob(blob);
        let store = SnapshotCell::new();

        let snapshot = reconcile(&api, &cache, &store).await.unwrap();

        assert!(api.assignments().is_empty());
        assert!(snapshot.assignments.is_empty());
        assert!(cache.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_assignments_collapse_to_one_row() {
        let api = FakeDirectory::default();
        let blob = r#"{
            "users": [{"id": "L1", "name": "Ann", "email": "ann@x.com"}],
            "assets": [{"id": "A1", "name": "Dell", "serial": "S1", "category": "Bilgisayar"}],
            "assignments": [
                {"userId": "L1", "assetId": "A1", "note": "first"},
                {"userId": "L1", "assetId": "A1", "note": "second"}
            ]
        }"#;
        let cache = MemoryLegacyCache::with_blob(blob);
        let store = SnapshotCell::new();

        reconcile(&api, &cache, &store).await.unwrap();

        let assignments = api.assignments();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].note.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn assignment_already_on_server_is_not_recreated() {
        let api = FakeDirectory::default()
            .with_user("Ann", "ann@x.com")
            .with_asset("Dell", "S1");
        let user_id = api.users()[0].id;
        let asset_id = api.assets()[0].id;
        api.assignments.lock().unwrap().push(Assignment {
            id: Uuid::new_v4(),
            user_id,
            asset_id,
            assigned_at: Utc::now(),
            note: None,
        });

        let blob = r#"{
            "users": [{"id": "L1", "name": "Ann", "email": "ann@x.com"}],
            "assets": [{"id": "A1", "name": "Dell", "serial": "S1", "category": "Bilgisayar"}],
            "assignments": [{"userId": "L1", "assetId": "A1"}]
        }"#;
        let cache = MemoryLegacyCache::with_blob(blob);
        let store = SnapshotCell::new();

        reconcile(&api, &cache, &store).await.unwrap();

        assert_eq!(api.assignments().len(), 1);
    }

    #[tokio::test]
    async fn legacy_blob_is_removed_even_when_the_merge_fails() {
        let api = FakeDirectory {
            fail_assignment_creates: true,
            ..FakeDirectory::default()
        };
        let cache = MemoryLegacyCache::with_blob(END_TO_END_BLOB);
        let store = SnapshotCell::new();

        let result = reconcile(&api, &cache, &store).await;

        assert!(result.is_err());
        // Users and assets created before the failure are persisted;
        // the blob is consumed regardless of the outcome.
        assert_eq!(api.users().len(), 1);
        assert_eq!(api.assets().len(), 1);
        assert!(api.assignments().is_empty());
        assert!(cache.load().unwrap().is_none());
        // The caller keeps the default empty snapshot.
        assert_eq!(store.current().generation, 0);
    }

    #[tokio::test]
    async fn legacy_timestamps_and_notes_are_carried_over() {
        let api = FakeDirectory::default();
        let blob = r#"{
            "users": [{"id": "L1", "name": "Ann", "email": "ann@x.com"}],
            "assets": [{"id": "A1", "name": "Dell", "serial": "S1", "category": "Bilgisayar"}],
            "assignments": [
                {"userId": "L1", "assetId": "A1", "note": "init", "assignedAt": "2023-05-01T10:00:00Z"}
            ]
        }"#;
        let cache = MemoryLegacyCache::with_blob(blob);
        let store = SnapshotCell::new();

        let snapshot = reconcile(&api, &cache, &store).await.unwrap();

        assert_eq!(snapshot.assignments.len(), 1);
        assert_eq!(snapshot.assignments[0].note.as_deref(), Some("init"));
        assert_eq!(
            snapshot.assignments[0].assigned_at.to_rfc3339(),
            "2023-05-01T10:00:00+00:00"
        );
    }
}
