//! Prediction orchestration with last-submission-wins display state.
//!
//! Every [`Orchestrator::submit`] call takes a token from a monotonically
//! increasing counter. When the submission resolves, its result is committed
//! to the displayed state only if its token is still the newest one issued;
//! otherwise it is reported as [`Settlement::Discarded`] and the display is
//! left untouched. A slow earlier submission therefore can never overwrite
//! the result of a later one, whatever order the responses arrive in.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{PredictionError, PredictionPayload, PredictionService, Resolution, TrackQuery};
use crate::api::RequestError;
use crate::diagnostics::{Diagnostics, LogLevel};

const SOURCE: &str = "predict";

/// Where the newest submission currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    Dispatching,
    Awaiting,
    /// Idle with a result on display.
    Resolved,
}

impl Phase {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Validating | Self::Dispatching | Self::Awaiting)
    }
}

/// The result currently shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Displayed {
    pub token: u64,
    pub resolution: Resolution,
    /// Normalized payload both requests were sent with, if validation passed.
    pub payload: Option<PredictionPayload>,
    pub resolved_at: DateTime<Utc>,
}

/// What happened to a submission's result.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// Committed to the display.
    Displayed(Displayed),
    /// Superseded by a newer submission before it resolved.
    Discarded { token: u64, resolution: Resolution },
}

impl Settlement {
    pub fn resolution(&self) -> &Resolution {
        match self {
            Self::Displayed(d) => &d.resolution,
            Self::Discarded { resolution, .. } => resolution,
        }
    }

    pub fn is_displayed(&self) -> bool {
        matches!(self, Self::Displayed(_))
    }
}

#[derive(Debug, Default)]
struct DisplayState {
    phase: Phase,
    latest: Option<Displayed>,
}

/// Runs submissions against a [`PredictionService`] and owns the display state.
pub struct Orchestrator<S> {
    service: S,
    newest_token: AtomicU64,
    state: Mutex<DisplayState>,
    diagnostics: Diagnostics,
}

impl<S: PredictionService> Orchestrator<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            newest_token: AtomicU64::new(0),
            state: Mutex::new(DisplayState::default()),
            diagnostics: Diagnostics::disabled(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Phase of the newest submission.
    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// The result on display, if any submission has been committed yet.
    pub fn latest(&self) -> Option<Displayed> {
        self.lock().latest.clone()
    }

    /// Run one full cycle for `query` and settle its result.
    ///
    /// Validation failures never reach the service. Otherwise both requests
    /// run concurrently on the same normalized payload and are both joined
    /// before the outcome is reduced.
    pub fn submit(&self, query: &TrackQuery) -> Settlement {
        let token = self.newest_token.fetch_add(1, Ordering::SeqCst) + 1;
        self.enter(token, Phase::Validating);

        let prepared = query.validate().and_then(|()| query.normalize());
        let (resolution, payload) = match prepared {
            Err(err) => {
                self.diagnostics.info(SOURCE, &format!("submission {token} rejected: {err}"));
                (Resolution::Failure(PredictionError::Validation(err)), None)
            }
            Ok(payload) => {
                self.enter(token, Phase::Dispatching);
                self.diagnostics.debug(
                    SOURCE,
                    &format!("submission {token} dispatched at {}", payload.timestamp),
                );
                let (skip, duration) = self.dispatch(token, &payload);
                (Resolution::from_slots(skip, duration), Some(payload))
            }
        };

        self.settle(token, resolution, payload)
    }

    /// Fire both requests, then wait for both.
    fn dispatch(
        &self,
        token: u64,
        payload: &PredictionPayload,
    ) -> (Result<f64, RequestError>, Result<f64, RequestError>) {
        let service = &self.service;

        let (skip, duration) = thread::scope(|scope| {
            let skip = scope.spawn(move || service.predict_skip(payload));
            let duration = scope.spawn(move || service.predict_session_duration(payload));
            self.enter(token, Phase::Awaiting);

            let skip = skip.join().unwrap_or_else(|_| Err(worker_panicked("skip")));
            let duration = duration
                .join()
                .unwrap_or_else(|_| Err(worker_panicked("session duration")));
            (skip, duration)
        });

        let skip = skip.and_then(check_probability);
        let duration = duration.and_then(check_minutes);

        for (name, slot) in [("skip", &skip), ("session duration", &duration)] {
            if let Err(err) = slot {
                self.diagnostics.record(
                    LogLevel::Warn,
                    SOURCE,
                    &format!("{name} prediction failed for submission {token}: {err}"),
                    Some(serde_json::json!({ "kind": err.kind() })),
                );
            }
        }

        (skip, duration)
    }

    fn settle(
        &self,
        token: u64,
        resolution: Resolution,
        payload: Option<PredictionPayload>,
    ) -> Settlement {
        let mut state = self.lock();

        if token != self.newest_token.load(Ordering::SeqCst) {
            drop(state);
            self.diagnostics.info(
                SOURCE,
                &format!("discarded stale result of submission {token}"),
            );
            return Settlement::Discarded { token, resolution };
        }

        let displayed = Displayed {
            token,
            resolution,
            payload,
            resolved_at: Utc::now(),
        };
        state.phase = Phase::Resolved;
        state.latest = Some(displayed.clone());
        Settlement::Displayed(displayed)
    }

    /// Advance the phase, but only on behalf of the newest submission.
    fn enter(&self, token: u64, phase: Phase) {
        let mut state = self.lock();
        if token == self.newest_token.load(Ordering::SeqCst) {
            state.phase = phase;
        }
    }

    fn lock(&self) -> MutexGuard<'_, DisplayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn worker_panicked(name: &str) -> RequestError {
    RequestError::Transport(format!("{name} request worker panicked"))
}

fn check_probability(p: f64) -> Result<f64, RequestError> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(RequestError::DataShape(format!(
            "skip probability {p} is outside [0, 1]"
        )))
    }
}

fn check_minutes(m: f64) -> Result<f64, RequestError> {
    if m.is_finite() && m >= 0.0 {
        Ok(m)
    } else {
        Err(RequestError::DataShape(format!(
            "session duration {m} is not a non-negative number of minutes"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
