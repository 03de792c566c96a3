//! Two-armed result type used to short-circuit chains of fallible steps.
//!
//! [`Outcome`] behaves like [`Result`] but makes the "once failed, nothing else runs" rule
//! part of its API: every combinator on a [`Outcome::Failure`] returns the same failure
//! without touching the supplied closure.

/// Either a successful value or the error that stopped the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T, E> {
    Success(T),
    Failure(E),
}

impl<T, E> Outcome<T, E> {
    pub fn success(value: T) -> Self {
        Self::Success(value)
    }

    pub fn failure(error: E) -> Self {
        Self::Failure(error)
    }

    /// Runs `operation` and captures a returned error as a failure.
    pub fn try_run<F>(operation: F) -> Self
    where
        F: FnOnce() -> Result<T, E>,
    {
        operation().into()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn success_ref(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn failure_ref(&self) -> Option<&E> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }

    /// Applies an infallible transformation to the success value.
    pub fn map<U, F>(self, transform: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success(value) => Outcome::Success(transform(value)),
            Self::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Applies a fallible transformation; an `Err` becomes a failure.
    pub fn try_map<U, F>(self, transform: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> Result<U, E>,
    {
        match self {
            Self::Success(value) => transform(value).into(),
            Self::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Chains a step that itself yields an outcome.
    pub fn flat_map<U, F>(self, next: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> Outcome<U, E>,
    {
        match self {
            Self::Success(value) => next(value),
            Self::Failure(error) => Outcome::Failure(error),
        }
    }

    pub fn map_failure<G, F>(self, transform: F) -> Outcome<T, G>
    where
        F: FnOnce(E) -> G,
    {
        match self {
            Self::Success(value) => Outcome::Success(value),
            Self::Failure(error) => Outcome::Failure(transform(error)),
        }
    }

    /// Returns the success value, or hands the stored error back to the caller.
    pub fn get(self) -> Result<T, E> {
        self.into()
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::Failure(error),
        }
    }
}

impl<T, E> From<Outcome<T, E>> for Result<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        match outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(error) => Err(error),
        }
    }
}
