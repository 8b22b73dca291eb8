//! Scoped group registration.

use super::GroupBarrier;

/// Keeps a group registered for as long as it is alive.
///
/// Dropping the guard unregisters the group, also when the owner unwinds, so
/// waiters are never left hanging on an aborted group.
#[derive(Debug)]
#[must_use = "the group is unregistered as soon as the registration is dropped"]
pub struct GroupRegistration<'a> {
    barrier: &'a GroupBarrier,
    name: String,
}

impl<'a> GroupRegistration<'a> {
    pub(super) fn new(barrier: &'a GroupBarrier, name: String) -> Self {
        barrier.register(&name);
        Self { barrier, name }
    }

    /// Name of the registered group.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for GroupRegistration<'_> {
    fn drop(&mut self) {
        self.barrier.unregister(&self.name);
    }
}
