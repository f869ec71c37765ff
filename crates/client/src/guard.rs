//! Navigation routes and the route guard.
//!
//! Before each navigation the guard reads a session snapshot synchronously
//! and decides whether to proceed:
//!
//! | Target | Condition | Outcome |
//! |---|---|---|
//! | requires auth | signed out | redirect to login |
//! | requires admin | not admin | deny |
//! | login | signed in | redirect to home |

use core::fmt;

use literacy_census_core::SchoolId;

use crate::error::AppError;
use crate::session::SessionSnapshot;

/// A navigable screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
    AddSchool,
    EditSchool(SchoolId),
    ReportIssue,
    AdminIssues,
    AdminActivity,
}

impl Route {
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_owned(),
            Self::Home => "/".to_owned(),
            Self::AddSchool => "/add".to_owned(),
            Self::EditSchool(id) => format!("/edit/{id}"),
            Self::ReportIssue => "/issues/new".to_owned(),
            Self::AdminIssues => "/admin/issues".to_owned(),
            Self::AdminActivity => "/admin/activity".to_owned(),
        }
    }

    /// Parse a path such as `/edit/abc123`. Trailing slashes are ignored.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Some(Self::Home),
            ["login"] => Some(Self::Login),
            ["add"] => Some(Self::AddSchool),
            ["edit", id] => Some(Self::EditSchool(SchoolId::new(*id))),
            ["issues", "new"] => Some(Self::ReportIssue),
            ["admin", "issues"] => Some(Self::AdminIssues),
            ["admin", "activity"] => Some(Self::AdminActivity),
            _ => None,
        }
    }

    #[must_use]
    pub const fn requires_auth(&self) -> bool {
        !matches!(self, Self::Login)
    }

    #[must_use]
    pub const fn requires_admin(&self) -> bool {
        matches!(self, Self::AdminIssues | Self::AdminActivity)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Guard decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(Route),
    Deny,
}

/// Decide whether navigating to `target` may proceed.
#[must_use]
pub fn check(target: &Route, session: &SessionSnapshot) -> Navigation {
    if target.requires_auth() && !session.is_signed_in() {
        return Navigation::Redirect(Route::Login);
    }
    if target.requires_admin() && !session.is_admin {
        return Navigation::Deny;
    }
    if *target == Route::Login && session.is_signed_in() {
        return Navigation::Redirect(Route::Home);
    }
    Navigation::Proceed
}

/// [`check`], turning anything but `Proceed` into an error.
///
/// A redirect to home (already signed in) is treated as proceeding, since
/// there is nothing for the caller to do.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` when sign-in is required and
/// `AppError::Forbidden` when the admin role is required.
pub fn require(target: &Route, session: &SessionSnapshot) -> Result<(), AppError> {
    match check(target, session) {
        Navigation::Proceed | Navigation::Redirect(Route::Home) => Ok(()),
        Navigation::Redirect(_) => Err(AppError::Unauthorized(target.path())),
        Navigation::Deny => {
            tracing::warn!(route = %target, "Admin route denied");
            Err(AppError::Forbidden(target.path()))
        }
    }
}
