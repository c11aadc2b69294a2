// ABOUTME: Lifecycle status codes for a deployment stage and their legal transitions.
// ABOUTME: The transition table is explicit; predicates are plain set membership.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle code of a deployment stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    #[default]
    Empty,
    Pending,
    RunningPreStep,
    RunningMainStep,
    RunningPostStep,
    Failure,
    Ok,
    TestPending,
    RunningTestStep,
    TestFailure,
    DestroyPending,
    DestroyAndDeletePending,
    RunningPreDestroyStep,
    RunningMainDestroyStep,
    RunningPostDestroyStep,
    DestroyFailure,
}

/// States from which a new deploy, test or destroy may be started.
const RESTARTABLE: &[StatusCode] = &[
    StatusCode::Pending,
    StatusCode::RunningPreStep,
    StatusCode::TestPending,
    StatusCode::RunningTestStep,
    StatusCode::DestroyPending,
    StatusCode::DestroyAndDeletePending,
    StatusCode::RunningPreDestroyStep,
];

impl StatusCode {
    pub const ALL: [StatusCode; 16] = [
        StatusCode::Empty,
        StatusCode::Pending,
        StatusCode::RunningPreStep,
        StatusCode::RunningMainStep,
        StatusCode::RunningPostStep,
        StatusCode::Failure,
        StatusCode::Ok,
        StatusCode::TestPending,
        StatusCode::RunningTestStep,
        StatusCode::TestFailure,
        StatusCode::DestroyPending,
        StatusCode::DestroyAndDeletePending,
        StatusCode::RunningPreDestroyStep,
        StatusCode::RunningMainDestroyStep,
        StatusCode::RunningPostDestroyStep,
        StatusCode::DestroyFailure,
    ];

    /// Codes reachable from this one in a single step.
    pub fn allowed_next(self) -> &'static [StatusCode] {
        use StatusCode::*;

        match self {
            Empty => &[Pending, RunningPreStep],
            Pending => &[RunningPreStep],
            RunningPreStep => &[RunningMainStep, Failure],
            RunningMainStep => &[RunningPostStep, Failure],
            RunningPostStep => &[Ok, Failure],
            Failure | Ok | TestFailure => RESTARTABLE,
            TestPending => &[RunningTestStep],
            RunningTestStep => &[Ok, TestFailure],
            DestroyPending | DestroyAndDeletePending => &[RunningPreDestroyStep],
            RunningPreDestroyStep => &[RunningMainDestroyStep, DestroyFailure],
            RunningMainDestroyStep => &[RunningPostDestroyStep, DestroyFailure],
            RunningPostDestroyStep => &[Empty, DestroyFailure],
            DestroyFailure => &[
                Pending,
                RunningPreStep,
                DestroyPending,
                DestroyAndDeletePending,
                RunningPreDestroyStep,
            ],
        }
    }

    pub fn is_error(self) -> bool {
        use StatusCode::*;

        matches!(self, Failure | TestFailure | DestroyFailure)
    }

    pub fn is_ok(self) -> bool {
        use StatusCode::*;

        matches!(self, Ok)
    }

    pub fn is_running(self) -> bool {
        use StatusCode::*;

        matches!(
            self,
            RunningPreStep
                | RunningMainStep
                | RunningPostStep
                | RunningTestStep
                | RunningPreDestroyStep
                | RunningMainDestroyStep
                | RunningPostDestroyStep
        )
    }

    pub fn is_pending(self) -> bool {
        use StatusCode::*;

        matches!(
            self,
            Pending | TestPending | DestroyPending | DestroyAndDeletePending
        )
    }

    pub fn as_str(self) -> &'static str {
        use StatusCode::*;

        match self {
            Empty => "empty",
            Pending => "pending",
            RunningPreStep => "running_pre_step",
            RunningMainStep => "running_main_step",
            RunningPostStep => "running_post_step",
            Failure => "failure",
            Ok => "ok",
            TestPending => "test_pending",
            RunningTestStep => "running_test_step",
            TestFailure => "test_failure",
            DestroyPending => "destroy_pending",
            DestroyAndDeletePending => "destroy_and_delete_pending",
            RunningPreDestroyStep => "running_pre_destroy_step",
            RunningMainDestroyStep => "running_main_destroy_step",
            RunningPostDestroyStep => "running_post_destroy_step",
            DestroyFailure => "destroy_failure",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatusCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| format!("unknown status code: {s}"))
    }
}

/// Whether `current` may move to `proposed` in one step.
pub fn status_transition_allowed(current: StatusCode, proposed: StatusCode) -> bool {
    current.allowed_next().contains(&proposed)
}

/// Status of a deployment stage, with bookkeeping for retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(rename = "status")]
    pub code: StatusCode,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated_by: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub try_again_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub tried: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl Status {
    /// A status stamped with the current time and host name.
    pub fn new(code: StatusCode) -> Self {
        Self {
            code,
            updated_at: Utc::now(),
            updated_by: gethostname::gethostname().to_string_lossy().into_owned(),
            data: String::new(),
            try_again_at: None,
            tried: 0,
        }
    }

    /// Attach free-form data, e.g. an error message for a failure status.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    /// Schedule another attempt, counting this one.
    pub fn retry_at(mut self, when: DateTime<Utc>) -> Self {
        self.try_again_at = Some(when);
        self.tried += 1;
        self
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::new(StatusCode::Empty)
    }
}
