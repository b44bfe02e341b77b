//! Named, ordered buckets of packages.
//!
//! A group ties a set of packages to a shared policy: whether the user may
//! disable members and whether the user may reorder them. Within a group,
//! index 0 is the highest precedence; the manager concatenates groups in
//! configuration order to form the overall precedence list.

/// A named bucket of packages sharing activation and reorder policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Group name, unique across the manager.
    pub name: String,

    /// Whether members may be disabled by the user.
    pub user_can_disable: bool,

    /// Whether members may be reordered by the user.
    pub user_can_reorder: bool,

    /// Member package names, index 0 = highest precedence.
    members: Vec<String>,
}

impl Group {
    /// Create an empty group with the given policy.
    pub fn new(name: impl Into<String>, user_can_disable: bool, user_can_reorder: bool) -> Self {
        Self {
            name: name.into(),
            user_can_disable,
            user_can_reorder,
            members: Vec::new(),
        }
    }

    /// Member names in precedence order.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Position of a member, if present.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m == name)
    }

    /// Append a member at the lowest precedence position.
    pub fn push(&mut self, name: impl Into<String>) {
        self.members.push(name.into());
    }

    /// Remove a member. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.members.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Replace the member list wholesale, used when applying persisted order.
    pub fn set_members(&mut self, members: Vec<String>) {
        self.members = members;
    }

    /// Move a member one position toward the front. Returns whether
    /// anything changed.
    pub fn move_up(&mut self, name: &str) -> bool {
        if !self.user_can_reorder {
            return false;
        }
        match self.position(name) {
            Some(idx) if idx > 0 => {
                self.members.swap(idx, idx - 1);
                true
            }
            _ => false,
        }
    }

    /// Move a member one position toward the back. Returns whether
    /// anything changed.
    pub fn move_down(&mut self, name: &str) -> bool {
        if !self.user_can_reorder {
            return false;
        }
        match self.position(name) {
            Some(idx) if idx + 1 < self.members.len() => {
                self.members.swap(idx, idx + 1);
                true
            }
            _ => false,
        }
    }

    /// Move a member to the front (highest precedence). Returns whether
    /// anything changed.
    pub fn move_to_top(&mut self, name: &str) -> bool {
        if !self.user_can_reorder {
            return false;
        }
        match self.position(name) {
            Some(0) | None => false,
            Some(idx) => {
                let member = self.members.remove(idx);
                self.members.insert(0, member);
                true
            }
        }
    }

    /// Move a member to the back (lowest precedence). Returns whether
    /// anything changed.
    pub fn move_to_bottom(&mut self, name: &str) -> bool {
        if !self.user_can_reorder {
            return false;
        }
        match self.position(name) {
            Some(idx) if idx + 1 < self.members.len() => {
                let member = self.members.remove(idx);
                self.members.push(member);
                true
            }
            _ => false,
        }
    }
}
