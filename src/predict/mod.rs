//! On-demand track predictions.
//!
//! One submission runs through
//! `Idle → Validating → Dispatching → Awaiting → Resolved`:
//!
//! 1. **Validating**: [`TrackQuery::validate`]; a malformed duration never
//!    leaves the machine.
//! 2. **Dispatching**: the query is normalized once into a
//!    [`PredictionPayload`] and both requests go out concurrently with it.
//! 3. **Awaiting**: both requests are joined regardless of completion order.
//! 4. **Resolved**: the two slots are reduced into a [`Resolution`]:
//!    success, partial (one slot failed, the other still shown), or failure
//!    (validation failed or both requests failed).
//!
//! See [`orchestrator::Orchestrator`] for last-submission-wins handling.

pub mod orchestrator;
pub mod query;

use serde::Serialize;
use thiserror::Error;

use crate::api::RequestError;

pub use orchestrator::{Displayed, Orchestrator, Phase, Settlement};
pub use query::{PredictionPayload, TrackQuery};

// ---------------------------------------------------------------------------
// Service seam
// ---------------------------------------------------------------------------

/// The two independent prediction models.
///
/// Implemented by [`crate::api::BackendClient`]; tests plug in doubles.
/// `Sync` because both methods run at the same time from different threads.
pub trait PredictionService: Sync {
    /// Probability in `[0, 1]` that the track gets skipped.
    fn predict_skip(&self, payload: &PredictionPayload) -> Result<f64, RequestError>;

    /// Expected listening-session length in minutes.
    fn predict_session_duration(&self, payload: &PredictionPayload) -> Result<f64, RequestError>;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Local input problems. Raised before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Duration must be in MM:SS format (e.g., 3:30), got '{0}'")]
    Duration(String),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Timestamp '{0}' is not a valid local date and time")]
    Timestamp(String),
}

/// Aggregate failure of a whole submission.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Both predictions failed. Skip: {skip}. Session duration: {duration}")]
    AllRequestsFailed {
        skip: RequestError,
        duration: RequestError,
    },
}

impl PredictionError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::AllRequestsFailed { .. } => "transport",
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Reduced outcome of one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Success {
        skip_probability: f64,
        session_duration_minutes: f64,
    },
    /// Exactly one of the two slots is an `Err`.
    Partial {
        skip: Result<f64, RequestError>,
        duration: Result<f64, RequestError>,
    },
    Failure(PredictionError),
}

impl Resolution {
    /// Reduce the two settled slots.
    pub fn from_slots(skip: Result<f64, RequestError>, duration: Result<f64, RequestError>) -> Self {
        match (skip, duration) {
            (Ok(skip_probability), Ok(session_duration_minutes)) => Self::Success {
                skip_probability,
                session_duration_minutes,
            },
            (Err(skip), Err(duration)) => {
                Self::Failure(PredictionError::AllRequestsFailed { skip, duration })
            }
            (skip, duration) => Self::Partial { skip, duration },
        }
    }

    pub fn skip_probability(&self) -> Option<f64> {
        match self {
            Self::Success {
                skip_probability, ..
            } => Some(*skip_probability),
            Self::Partial { skip, .. } => skip.as_ref().ok().copied(),
            Self::Failure(_) => None,
        }
    }

    pub fn session_duration_minutes(&self) -> Option<f64> {
        match self {
            Self::Success {
                session_duration_minutes,
                ..
            } => Some(*session_duration_minutes),
            Self::Partial { duration, .. } => duration.as_ref().ok().copied(),
            Self::Failure(_) => None,
        }
    }

    /// Failure of the skip request alone (partial outcomes only).
    pub fn skip_error(&self) -> Option<&RequestError> {
        match self {
            Self::Partial { skip, .. } => skip.as_ref().err(),
            _ => None,
        }
    }

    /// Failure of the duration request alone (partial outcomes only).
    pub fn duration_error(&self) -> Option<&RequestError> {
        match self {
            Self::Partial { duration, .. } => duration.as_ref().err(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PredictionError> {
        match self {
            Self::Failure(err) => Some(err),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Partial { .. } => "partial",
            Self::Failure(_) => "failure",
        }
    }

    /// Flat, serializable view for JSON output.
    pub fn view(&self) -> PredictionView {
        PredictionView {
            status: self.status(),
            skip_probability: self.skip_probability(),
            skip_likelihood: self.skip_probability().map(SkipLikelihood::from_probability),
            session_duration_minutes: self.session_duration_minutes(),
            skip_error: self.skip_error().map(SlotError::from),
            duration_error: self.duration_error().map(SlotError::from),
            error: self.error().map(|e| SlotError {
                kind: e.kind(),
                message: e.to_string(),
            }),
        }
    }
}

/// Interpretation shown next to the skip percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipLikelihood {
    High,
    Moderate,
    Low,
}

impl SkipLikelihood {
    pub fn from_probability(p: f64) -> Self {
        if p > 0.7 {
            Self::High
        } else if p > 0.4 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::High => "High skip likelihood",
            Self::Moderate => "Moderate skip chance",
            Self::Low => "Low skip probability",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotError {
    pub kind: &'static str,
    pub message: String,
}

impl From<&RequestError> for SlotError {
    fn from(err: &RequestError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// JSON shape of a resolved prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionView {
    pub status: &'static str,
    pub skip_probability: Option<f64>,
    pub skip_likelihood: Option<SkipLikelihood>,
    pub session_duration_minutes: Option<f64>,
    pub skip_error: Option<SlotError>,
    pub duration_error: Option<SlotError>,
    pub error: Option<SlotError>,
}

/// `0.8123` → `"81.23%"`.
pub fn format_probability(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
