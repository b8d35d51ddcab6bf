use std::fmt;

/// Machine-readable error codes for scripting and agent-friendly output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotLoggedIn,
    AdminRequired,
    ConfigParseError,
    IssueNotFound,
    InvalidEnumValue,
    ActionInProgress,
    ConfirmationRequired,
    FetchFailed,
    MutationFailed,
    RequestTimedOut,
    LoginFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotLoggedIn => "E1001",
            Self::AdminRequired => "E1002",
            Self::ConfigParseError => "E1003",
            Self::LoginFailed => "E1004",
            Self::IssueNotFound => "E2001",
            Self::InvalidEnumValue => "E2002",
            Self::ActionInProgress => "E2003",
            Self::ConfirmationRequired => "E2004",
            Self::FetchFailed => "E3001",
            Self::MutationFailed => "E3002",
            Self::RequestTimedOut => "E3003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotLoggedIn => "Not logged in",
            Self::AdminRequired => "Admin role required",
            Self::ConfigParseError => "Config file parse error",
            Self::LoginFailed => "Login failed",
            Self::IssueNotFound => "Issue not found",
            Self::InvalidEnumValue => "Invalid status/category/role value",
            Self::ActionInProgress => "Another action is in progress",
            Self::ConfirmationRequired => "Confirmation required",
            Self::FetchFailed => "Failed to fetch issues",
            Self::MutationFailed => "Issue update failed",
            Self::RequestTimedOut => "Request timed out",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotLoggedIn => Some("Run `civic login` to start a session."),
            Self::AdminRequired => Some("Log in with an account that has the ADMIN role."),
            Self::ConfigParseError => Some("Fix syntax in ~/.config/civic/config.toml and retry."),
            Self::LoginFailed => Some("Check the username and password, then retry."),
            Self::IssueNotFound => None,
            Self::InvalidEnumValue => Some(
                "Statuses: PENDING, IN_PROGRESS, RESOLVED. Categories: Infrastructure, \
                 Transportation, Environment, Safety, Other.",
            ),
            Self::ActionInProgress => Some("Wait for the pending action to finish, then retry."),
            Self::ConfirmationRequired => Some("Answer the prompt with 'y' or pass --yes."),
            Self::FetchFailed => Some("Check the API URL and your network, then reload."),
            Self::MutationFailed => Some("The issue list was reloaded; verify the current state."),
            Self::RequestTimedOut => Some("Raise api.timeout_secs or check the server."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
