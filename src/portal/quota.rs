//! Plan limits for owners without an active subscription.

/// Files a free-plan project may hold.
pub const FREE_FILE_LIMIT: i64 = 3;
/// Projects a free-plan owner may create.
pub const FREE_PROJECT_LIMIT: i64 = 2;

/// Gate evaluated at the moment of a mutation. Subscribed owners are unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub max_free_files: i64,
    pub max_free_projects: i64,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            max_free_files: FREE_FILE_LIMIT,
            max_free_projects: FREE_PROJECT_LIMIT,
        }
    }
}

impl QuotaPolicy {
    /// Folders are exempt; only file links count.
    pub fn can_create_file(&self, subscription_active: bool, current_file_count: i64) -> bool {
        subscription_active || current_file_count < self.max_free_files
    }

    pub fn can_create_project(&self, subscription_active: bool, current_project_count: i64) -> bool {
        subscription_active || current_project_count < self.max_free_projects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_quota_boundary() {
        let policy = QuotaPolicy::default();
        assert!(policy.can_create_file(false, 0));
        assert!(policy.can_create_file(false, 2));
        assert!(!policy.can_create_file(false, 3));
        assert!(!policy.can_create_file(false, 10));
    }

    #[test]
    fn test_subscription_is_unlimited() {
        let policy = QuotaPolicy::default();
        for count in [0, 2, 3, 4, 1_000] {
            assert!(policy.can_create_file(true, count));
            assert!(policy.can_create_project(true, count));
        }
    }

    #[test]
    fn test_project_quota_boundary() {
        let policy = QuotaPolicy::default();
        assert!(policy.can_create_project(false, 1));
        assert!(!policy.can_create_project(false, 2));
    }

    #[test]
    fn test_limits_are_configurable() {
        let policy = QuotaPolicy {
            max_free_files: 5,
            max_free_projects: 1,
        };
        assert!(policy.can_create_file(false, 4));
        assert!(!policy.can_create_file(false, 5));
        assert!(!policy.can_create_project(false, 1));
    }
}
