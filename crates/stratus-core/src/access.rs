use uuid::Uuid;

use stratus_types::models::{FileEntry, Folder};

use crate::error::CoreError;

/// Anything with a single owning account.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Folder {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for FileEntry {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

/// Owner-or-nothing: there are no shares, roles, or grants. Callers resolve
/// existence first, so a missing resource surfaces as `NotFound` before this
/// ever runs.
pub fn require_owner<T: Owned>(resource: &T, actor: Uuid) -> Result<(), CoreError> {
    if resource.owner_id() == actor {
        Ok(())
    } else {
        Err(CoreError::Forbidden)
    }
}
