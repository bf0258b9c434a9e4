//! Handles for registered commands and subsystems.
//!
//! Commands and subsystems are identified by the handle the scheduler
//! returned at registration, never by value. Handles are plain indices:
//! cheap to copy into trigger bindings and closures.

use std::fmt;

use static_assertions::{assert_impl_all, const_assert};
use trobotix_common::consts::MAX_SUBSYSTEMS;

/// Handle of a command registered with a [`CommandScheduler`](crate::scheduler::CommandScheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(u32);

impl CommandId {
    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd#{}", self.0)
    }
}

/// Handle of a subsystem registered with a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubsystemId(u8);

impl SubsystemId {
    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u8)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    const fn bit(self) -> u64 {
        1u64 << self.0
    }
}

impl fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subsystem#{}", self.0)
    }
}

/// Set of subsystems a command requires, one bit per [`SubsystemId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RequirementSet(u64);

impl RequirementSet {
    pub const EMPTY: Self = Self(0);

    #[inline]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Builder-style insert.
    #[inline]
    #[must_use]
    pub const fn with(self, subsystem: SubsystemId) -> Self {
        Self(self.0 | subsystem.bit())
    }

    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub fn insert(&mut self, subsystem: SubsystemId) {
        self.0 |= subsystem.bit();
    }

    #[inline]
    pub const fn contains(&self, subsystem: SubsystemId) -> bool {
        self.0 & subsystem.bit() != 0
    }

    #[inline]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Subsystems in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = SubsystemId> + use<> {
        let bits = self.0;
        (0..MAX_SUBSYSTEMS)
            .filter(move |i| bits & (1u64 << i) != 0)
            .map(SubsystemId::from_index)
    }
}

impl FromIterator<SubsystemId> for RequirementSet {
    fn from_iter<I: IntoIterator<Item = SubsystemId>>(iter: I) -> Self {
        let mut set = Self::new();
        for subsystem in iter {
            set.insert(subsystem);
        }
        set
    }
}

impl From<SubsystemId> for RequirementSet {
    fn from(subsystem: SubsystemId) -> Self {
        Self::new().with(subsystem)
    }
}

assert_impl_all!(CommandId: Copy, Send, Sync, std::hash::Hash);
assert_impl_all!(SubsystemId: Copy, Send, Sync, std::hash::Hash);
const_assert!(MAX_SUBSYSTEMS <= u8::MAX as usize + 1);
