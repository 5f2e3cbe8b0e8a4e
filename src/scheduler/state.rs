/// What the presentation layer needs between cycles.
///
/// Written once at the end of every completed cycle. Failed cycles leave it
/// untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineState {
    pub has_overdue: bool,
    /// Assigned user id seen on the last matching chore, for the web link.
    pub last_user_id: Option<i64>,
}
