use clap::ValueEnum;

use crate::auth::UserID;

/// Controls which expenses a logged in user can see and change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExpenseScope {
    /// Every user sees and edits every expense.
    #[default]
    Shared,
    /// Users only see and edit the expenses they recorded.
    PerUser,
}

impl ExpenseScope {
    /// The owner to restrict queries to for a request made by `user_id`.
    pub fn owner_filter(self, user_id: UserID) -> Option<UserID> {
        match self {
            ExpenseScope::Shared => None,
            ExpenseScope::PerUser => Some(user_id),
        }
    }

    /// Whether `user_id` may view or change an expense owned by `owner`.
    pub fn can_access(self, user_id: UserID, owner: Option<UserID>) -> bool {
        match self {
            ExpenseScope::Shared => true,
            ExpenseScope::PerUser => owner == Some(user_id),
        }
    }
}

#[cfg(test)]
mod scope_tests {
    use crate::auth::UserID;

    use super::ExpenseScope;

    #[test]
    fn shared_scope_does_not_filter() {
        let user_id = UserID::new(1);

        assert_eq!(ExpenseScope::Shared.owner_filter(user_id), None);
        assert!(ExpenseScope::Shared.can_access(user_id, Some(UserID::new(2))));
        assert!(ExpenseScope::Shared.can_access(user_id, None));
    }

    #[test]
    fn per_user_scope_restricts_to_owner() {
        let user_id = UserID::new(1);

        assert_eq!(ExpenseScope::PerUser.owner_filter(user_id), Some(user_id));
        assert!(ExpenseScope::PerUser.can_access(user_id, Some(user_id)));
        assert!(!ExpenseScope::PerUser.can_access(user_id, Some(UserID::new(2))));
        assert!(!ExpenseScope::PerUser.can_access(user_id, None));
    }

    #[test]
    fn defaults_to_shared() {
        assert_eq!(ExpenseScope::default(), ExpenseScope::Shared);
    }
}
