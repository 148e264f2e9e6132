//! Role-scoped task visibility resolution.
//!
//! Visibility is a pure function of the task and the filter: no side
//! effects and no data access. The in-memory adapter applies
//! [`is_task_visible`] directly; the `PostgreSQL` adapter renders the same
//! rules as a role-branched SQL predicate, and the shared tests pin both
//! to the same behaviour.

use super::{Role, Task, TaskLifecycle, TeamId, UserId};

/// Identity and authority of the user requesting tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    /// Requesting user.
    pub user_id: UserId,
    /// Normalized role; unknown role strings must be normalized to
    /// [`Role::Participant`] before reaching here.
    pub role: Role,
    /// Teams the user belongs to. Consulted for directors, who see the
    /// task lists of every team they are a member of.
    pub memberships: Vec<TeamId>,
}

impl Requester {
    /// Creates a requester without team memberships.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            memberships: Vec::new(),
        }
    }

    /// Sets the requester's team memberships.
    #[must_use]
    pub fn with_memberships(mut self, memberships: impl IntoIterator<Item = TeamId>) -> Self {
        self.memberships = memberships.into_iter().collect();
        self
    }
}

/// Filter inputs for a task query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    /// Who is asking.
    pub requester: Requester,
    /// Restrict results to one team's scope (that team plus global tasks).
    pub team: Option<TeamId>,
    /// Restrict results to one task-level lifecycle.
    pub lifecycle: Option<TaskLifecycle>,
}

impl TaskFilter {
    /// Creates a filter with no team or lifecycle restriction.
    #[must_use]
    pub const fn for_requester(requester: Requester) -> Self {
        Self {
            requester,
            team: None,
            lifecycle: None,
        }
    }

    /// Restricts the filter to one team's scope.
    #[must_use]
    pub const fn with_team(mut self, team_id: TeamId) -> Self {
        self.team = Some(team_id);
        self
    }

    /// Restricts the filter to one task lifecycle.
    #[must_use]
    pub const fn with_lifecycle(mut self, lifecycle: TaskLifecycle) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }
}

/// Decides whether the task is visible under the filter.
///
/// Each role sees exactly its permitted subset:
///
/// - **Administrator**: own, admin-flagged, or involved tasks; a team
///   filter additionally restricts to that team's scope.
/// - **Director**: tasks of every membership team, own tasks, and involved
///   tasks; a team filter restricts to that team's scope and requires
///   membership of that team or authorship.
/// - **Coordinator**: every task in the requested team's scope, plus
///   involved tasks anywhere; without a team filter, global tasks plus
///   involved tasks.
/// - **Participant**: whole-team tasks in the requested team's scope, plus
///   personally involved tasks; never the full team list.
#[must_use]
pub fn is_task_visible(task: &Task, filter: &TaskFilter) -> bool {
    if let Some(lifecycle) = filter.lifecycle
        && task.lifecycle() != lifecycle
    {
        return false;
    }

    let requester = &filter.requester;
    let user_id = requester.user_id;
    let involved = task.involves(user_id);

    match requester.role {
        Role::Administrator => {
            let permitted = involved || task.visible_to_admin();
            match filter.team {
                Some(team_id) => permitted && task.scope().matches_team(team_id),
                None => permitted,
            }
        }
        Role::Director => match filter.team {
            Some(team_id) => {
                task.scope().matches_team(team_id)
                    && (requester.memberships.contains(&team_id)
                        || task.creator_id() == user_id)
            }
            None => {
                let in_membership_team = task
                    .scope()
                    .team_id()
                    .is_some_and(|team_id| requester.memberships.contains(&team_id));
                in_membership_team || involved
            }
        },
        Role::Coordinator => match filter.team {
            Some(team_id) => task.scope().matches_team(team_id) || involved,
            None => task.scope().team_id().is_none() || involved,
        },
        Role::Participant => match filter.team {
            Some(team_id) => {
                (task.scope().matches_team(team_id) && task.assignment().is_whole_team())
                    || involved
            }
            None => involved,
        },
    }
}
