use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use stratus_db::Database;
use stratus_types::models::Folder;

use crate::access;
use crate::error::CoreError;

/// Folder tree built on materialized paths.
///
/// A folder's `path` is its parent's path plus `/` plus the parent's id; root
/// folders carry the empty path. The path is written once at creation and
/// never rewritten, so it records where the folder was created, not where its
/// ancestors are now.
pub struct HierarchyEngine {
    db: Arc<Database>,
}

impl HierarchyEngine {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Creates a folder, at the root when `parent_id` is `None`. The parent
    /// must exist and belong to `owner`; the new folder inherits nothing
    /// else from it.
    pub fn create_folder(
        &self,
        owner: Uuid,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Folder, CoreError> {
        let path = match parent_id {
            Some(pid) => {
                let parent = self
                    .db
                    .get_folder(pid)?
                    .ok_or(CoreError::NotFound("parent folder"))?;
                access::require_owner(&parent, owner)?;
                format!("{}/{}", parent.path, parent.id)
            }
            None => String::new(),
        };

        let folder = Folder {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: name.to_string(),
            parent_id,
            path,
            created_at: Utc::now(),
        };
        self.db.insert_folder(&folder)?;
        Ok(folder)
    }

    /// Lists one level of the tree: `None` is the root level, `Some(id)` the
    /// direct children of that folder. There is no "all folders" listing.
    ///
    /// The parent reference is not validated; an unknown or foreign parent
    /// simply yields an empty list because nothing of the caller's lives
    /// under it.
    pub fn list_folders(
        &self,
        owner: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Vec<Folder>, CoreError> {
        Ok(self.db.list_folders(owner, parent_id)?)
    }

    /// Renames a folder. A missing or empty new name keeps the current one,
    /// so a bare rename request is a no-op rather than an error.
    pub fn rename_folder(
        &self,
        actor: Uuid,
        folder_id: Uuid,
        new_name: Option<&str>,
    ) -> Result<Folder, CoreError> {
        let folder = self
            .db
            .get_folder(folder_id)?
            .ok_or(CoreError::NotFound("folder"))?;
        access::require_owner(&folder, actor)?;

        let name = match new_name {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => folder.name.clone(),
        };
        self.db.rename_folder(folder_id, &name)?;

        Ok(Folder { name, ..folder })
    }

    /// Deletes the folder record and nothing else. Child folders and files
    /// keep their references to the removed id; they become unreachable
    /// through tree walks but stay addressable by id.
    pub fn delete_folder(&self, actor: Uuid, folder_id: Uuid) -> Result<(), CoreError> {
        let folder = self
            .db
            .get_folder(folder_id)?
            .ok_or(CoreError::NotFound("folder"))?;
        access::require_owner(&folder, actor)?;

        self.db.delete_folder(folder_id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use stratus_types::models::UserStatus;

    #[test]
    fn paths_chain_parent_ids() {
        let db = testutil::memory_db();
        let user = testutil::seed_user(&db, "p@example.com", UserStatus::Active);
        let folders = HierarchyEngine::new(db);

        let top = folders.create_folder(user.id, "projects", None).unwrap();
        let mid = folders
            .create_folder(user.id, "2026", Some(top.id))
            .unwrap();
        let leaf = folders
            .create_folder(user.id, "q3", Some(mid.id))
            .unwrap();

        assert_eq!(top.path, "");
        assert_eq!(mid.path, format!("/{}", top.id));
        assert_eq!(leaf.path, format!("/{}/{}", top.id, mid.id));
    }

    #[test]
    fn parent_must_exist_before_ownership_is_considered() {
        let db = testutil::memory_db();
        let user = testutil::seed_user(&db, "o@example.com", UserStatus::Active);
        let folders = HierarchyEngine::new(db);

        let err = folders
            .create_folder(user.id, "orphan", Some(Uuid::new_v4()))
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound("parent folder")));
    }

    #[test]
    fn cannot_create_under_a_foreign_parent() {
        let db = testutil::memory_db();
        let alice = testutil::seed_user(&db, "alice@example.com", UserStatus::Active);
        let bob = testutil::seed_user(&db, "bob@example.com", UserStatus::Active);
        let folders = HierarchyEngine::new(db);

        let theirs = folders.create_folder(alice.id, "private", None).unwrap();
        let err = folders
            .create_folder(bob.id, "intruder", Some(theirs.id))
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden));
    }

    #[test]
    fn listing_is_level_scoped_and_owner_scoped() {
        let db = testutil::memory_db();
        let alice = testutil::seed_user(&db, "a@example.com", UserStatus::Active);
        let bob = testutil::seed_user(&db, "b@example.com", UserStatus::Active);
        let folders = HierarchyEngine::new(db);

        let root = folders.create_folder(alice.id, "docs", None).unwrap();
        let child = folders
            .create_folder(alice.id, "inner", Some(root.id))
            .unwrap();
        folders.create_folder(bob.id, "bobs", None).unwrap();

        let roots = folders.list_folders(alice.id, None).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id, root.id);

        let children = folders.list_folders(alice.id, Some(root.id)).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, child.id);

        // Unknown parent: nothing lives under it, so the list is empty.
        assert!(
            folders
                .list_folders(alice.id, Some(Uuid::new_v4()))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn rename_falls_back_to_the_current_name() {
        let db = testutil::memory_db();
        let user = testutil::seed_user(&db, "r@example.com", UserStatus::Active);
        let folders = HierarchyEngine::new(db.clone());

        let folder = folders.create_folder(user.id, "drafts", None).unwrap();

        let kept = folders
            .rename_folder(user.id, folder.id, Some(""))
            .unwrap();
        assert_eq!(kept.name, "drafts");

        let kept = folders.rename_folder(user.id, folder.id, None).unwrap();
        assert_eq!(kept.name, "drafts");

        let renamed = folders
            .rename_folder(user.id, folder.id, Some("final"))
            .unwrap();
        assert_eq!(renamed.name, "final");
        assert_eq!(db.get_folder(folder.id).unwrap().unwrap().name, "final");
    }

    #[test]
    fn missing_beats_forbidden_on_mutations() {
        let db = testutil::memory_db();
        let alice = testutil::seed_user(&db, "al@example.com", UserStatus::Active);
        let bob = testutil::seed_user(&db, "bo@example.com", UserStatus::Active);
        let folders = HierarchyEngine::new(db);

        let theirs = folders.create_folder(alice.id, "locked", None).unwrap();

        // Existing but foreign: ownership is the failure.
        assert!(matches!(
            folders.rename_folder(bob.id, theirs.id, Some("x")),
            Err(CoreError::Forbidden)
        ));
        assert!(matches!(
            folders.delete_folder(bob.id, theirs.id),
            Err(CoreError::Forbidden)
        ));

        // Nonexistent: not-found wins no matter who asks.
        assert!(matches!(
            folders.rename_folder(bob.id, Uuid::new_v4(), Some("x")),
            Err(CoreError::NotFound("folder"))
        ));
        assert!(matches!(
            folders.delete_folder(bob.id, Uuid::new_v4()),
            Err(CoreError::NotFound("folder"))
        ));
    }

    #[test]
    fn delete_leaves_descendants_in_place() {
        let db = testutil::memory_db();
        let user = testutil::seed_user(&db, "d@example.com", UserStatus::Active);
        let folders = HierarchyEngine::new(db.clone());

        let parent = folders.create_folder(user.id, "outer", None).unwrap();
        let child = folders
            .create_folder(user.id, "inner", Some(parent.id))
            .unwrap();

        folders.delete_folder(user.id, parent.id).unwrap();

        // The child row survives, still pointing at the vanished parent.
        let orphan = db.get_folder(child.id).unwrap().unwrap();
        assert_eq!(orphan.parent_id, Some(parent.id));

        // And it is still listed under the old parent id.
        let listed = folders.list_folders(user.id, Some(parent.id)).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, child.id);
    }
}
