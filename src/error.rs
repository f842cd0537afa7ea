use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;
use crate::state::machine::MachineError;

/// Errors that can occur in service layer operations.
///
/// Every variant is a definitive rejection of the attempted action: clients
/// must never retry these, only transport-level ack timeouts are retried by
/// the reliable delivery layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[from] StorageError),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current session state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// A NEXT advance was requested on the last question.
    #[error("no more questions to advance to")]
    NoMoreQuestions,
    /// A PREV advance was requested on the first question.
    #[error("no previous question to go back to")]
    NoPreviousQuestion,
    /// The team already answered this question.
    #[error("team `{team_id}` already submitted an answer for question `{question_id}`")]
    DuplicateSubmission {
        /// Team that attempted the second submission.
        team_id: Uuid,
        /// Question that was already answered.
        question_id: Uuid,
    },
    /// The question is not open for submissions.
    #[error("question is closed for submissions: {0}")]
    QuestionClosed(String),
    /// The chosen pool value is not available to this team.
    #[error("point value {value} is not available in the team's remaining pool")]
    InvalidPointSelection {
        /// The value the team tried to spend.
        value: i64,
    },
    /// The wager is negative or exceeds the team's current score.
    #[error("invalid wager {wager}: must be between 0 and the current score ({max})")]
    InvalidWager {
        /// The attempted wager.
        wager: i64,
        /// The team's score at submission time.
        max: i64,
    },
    /// Requested session/round/question/team/answer is missing.
    #[error("not found: {0}")]
    NotFound(String),
    /// Acting connection lacks the required role.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl ServiceError {
    /// Stable machine-readable code surfaced in WebSocket ack rejections.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Unavailable(_) => "storage_unavailable",
            ServiceError::InvalidInput(_) => "invalid_input",
            ServiceError::InvalidState(_) => "invalid_state",
            ServiceError::NoMoreQuestions => "no_more_questions",
            ServiceError::NoPreviousQuestion => "no_previous_question",
            ServiceError::DuplicateSubmission { .. } => "duplicate_submission",
            ServiceError::QuestionClosed(_) => "question_closed",
            ServiceError::InvalidPointSelection { .. } => "invalid_point_selection",
            ServiceError::InvalidWager { .. } => "invalid_wager",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Unauthorized(_) => "unauthorized",
        }
    }
}

impl From<MachineError> for ServiceError {
    fn from(err: MachineError) -> Self {
        match err {
            MachineError::NoMoreQuestions => ServiceError::NoMoreQuestions,
            MachineError::NoPreviousQuestion => ServiceError::NoPreviousQuestion,
            err @ (MachineError::NotStartable { .. }
            | MachineError::EmptySchedule
            | MachineError::NotInProgress
            | MachineError::DanglingPointer(_)
            | MachineError::NotAtEnd) => ServiceError::InvalidState(err.to_string()),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {err}"))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            err @ (ServiceError::InvalidState(_)
            | ServiceError::NoMoreQuestions
            | ServiceError::NoPreviousQuestion
            | ServiceError::DuplicateSubmission { .. }
            | ServiceError::QuestionClosed(_)
            | ServiceError::InvalidPointSelection { .. }
            | ServiceError::InvalidWager { .. }) => AppError::Conflict(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
