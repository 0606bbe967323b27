#![deny(missing_docs)]
//! Lifecycle tags for remotely-loaded values.
//!
//! A [`State`] records where a cached remote value is in its life: never
//! requested, in flight, usable but due for refresh, fresh, or failed. Slots
//! of this type live inside the host's model; the `promise` crate reads and
//! rewrites them, and the view layer picks a CSS class off [`State::code`].

pub mod codec;

pub use codec::{CodecError, CodecResult};

/// Lifecycle of a single remotely-loaded value.
///
/// `Pending` optionally carries the last known good value so the view can keep
/// showing it while a refresh is in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum State<A, E> {
    /// Never requested. The initial value of every slot.
    Empty,
    /// Request in flight, with the previous value when one existed.
    Pending(Option<A>),
    /// Usable value that has been flagged for refresh.
    Stale(A),
    /// Fresh, authoritative value.
    Done(A),
    /// The request failed with a classified error payload.
    Error(E),
}

impl<A, E> Default for State<A, E> {
    fn default() -> Self {
        State::Empty
    }
}

impl<A, E> State<A, E> {
    /// Lifts a `Result` into a terminal state.
    pub fn from_result(result: Result<A, E>) -> Self {
        match result {
            Ok(value) => State::Done(value),
            Err(err) => State::Error(err),
        }
    }

    /// Lifts an `Option` into a state: `Some` is fresh, `None` was never
    /// requested.
    pub fn from_option(option: Option<A>) -> Self {
        match option {
            Some(value) => State::Done(value),
            None => State::Empty,
        }
    }

    /// Returns the usable value, if any.
    ///
    /// `Pending(Some(_))`, `Stale`, and `Done` all carry a value the caller
    /// may display; the other variants do not.
    pub fn to_option(self) -> Option<A> {
        match self {
            State::Pending(Some(value)) | State::Stale(value) | State::Done(value) => Some(value),
            State::Empty | State::Pending(None) | State::Error(_) => None,
        }
    }

    /// Borrowing form of [`State::to_option`].
    pub fn as_option(&self) -> Option<&A> {
        match self {
            State::Pending(Some(value)) | State::Stale(value) | State::Done(value) => Some(value),
            State::Empty | State::Pending(None) | State::Error(_) => None,
        }
    }

    /// Returns the error payload when the state is `Error`.
    pub fn into_error(self) -> Option<E> {
        match self {
            State::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Borrowing form of [`State::into_error`].
    pub fn as_error(&self) -> Option<&E> {
        match self {
            State::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Collapses the state into a `Result`, substituting `default` when no
    /// value has arrived yet.
    pub fn to_result(self, default: A) -> Result<A, E> {
        match self {
            State::Empty | State::Pending(None) => Ok(default),
            State::Pending(Some(value)) | State::Stale(value) | State::Done(value) => Ok(value),
            State::Error(err) => Err(err),
        }
    }

    /// Applies `f` under every variant's value payload.
    pub fn map<B>(self, f: impl FnOnce(A) -> B) -> State<B, E> {
        match self {
            State::Empty => State::Empty,
            State::Pending(prev) => State::Pending(prev.map(f)),
            State::Stale(value) => State::Stale(f(value)),
            State::Done(value) => State::Done(f(value)),
            State::Error(err) => State::Error(err),
        }
    }

    /// Applies `f` to the error payload only.
    pub fn map_error<F>(self, f: impl FnOnce(E) -> F) -> State<A, F> {
        match self {
            State::Empty => State::Empty,
            State::Pending(prev) => State::Pending(prev),
            State::Stale(value) => State::Stale(value),
            State::Done(value) => State::Done(value),
            State::Error(err) => State::Error(f(err)),
        }
    }

    /// Combines two states with `f`.
    ///
    /// The leftmost `Error` wins so chains short-circuit predictably. `Empty`
    /// absorbs like `Pending(None)` and `Stale` counts as `Done`-strength, so
    /// the result is `Done` only when both sides have settled, `Pending(Some)`
    /// when both sides carry a value but one is still moving, and
    /// `Pending(None)` as soon as either side has nothing to offer. `merge`
    /// never produces `Empty` or `Stale`.
    pub fn merge<B, C>(self, other: State<B, E>, f: impl FnOnce(A, B) -> C) -> State<C, E> {
        match (self, other) {
            (State::Error(err), _) => State::Error(err),
            (_, State::Error(err)) => State::Error(err),
            (State::Empty | State::Pending(None), _) => State::Pending(None),
            (_, State::Empty | State::Pending(None)) => State::Pending(None),
            (State::Pending(Some(a)), State::Pending(Some(b)))
            | (State::Pending(Some(a)), State::Stale(b) | State::Done(b))
            | (State::Stale(a) | State::Done(a), State::Pending(Some(b))) => {
                State::Pending(Some(f(a, b)))
            }
            (State::Stale(a) | State::Done(a), State::Stale(b) | State::Done(b)) => {
                State::Done(f(a, b))
            }
        }
    }

    /// Applicative product: applies a state-wrapped function to a
    /// state-wrapped argument, combining tags via [`State::merge`].
    pub fn and_map<B, C>(self, other: State<B, E>) -> State<C, E>
    where
        A: FnOnce(B) -> C,
    {
        self.merge(other, |f, b| f(b))
    }

    /// Marks the slot as in flight, keeping the previous value when one
    /// exists.
    ///
    /// `Empty` and `Error` forget everything (`Pending(None)`); `Stale` and
    /// `Done` carry their value along; an already-pending slot is unchanged.
    pub fn set_pending(self) -> Self {
        match self {
            State::Empty | State::Error(_) => State::Pending(None),
            State::Pending(prev) => State::Pending(prev),
            State::Stale(value) | State::Done(value) => State::Pending(Some(value)),
        }
    }

    /// Flags a fresh value for refresh. Every other variant is unchanged.
    pub fn mark_stale(self) -> Self {
        match self {
            State::Done(value) => State::Stale(value),
            other => other,
        }
    }

    /// True only for `Empty`.
    pub fn is_empty(&self) -> bool {
        matches!(self, State::Empty)
    }

    /// True for both pending forms.
    pub fn is_pending(&self) -> bool {
        matches!(self, State::Pending(_))
    }

    /// True only for `Stale`.
    pub fn is_stale(&self) -> bool {
        matches!(self, State::Stale(_))
    }

    /// True only for `Done`.
    pub fn is_done(&self) -> bool {
        matches!(self, State::Done(_))
    }

    /// True only for `Error`.
    pub fn is_error(&self) -> bool {
        matches!(self, State::Error(_))
    }

    /// Stable CSS-class string for view-layer binding.
    pub fn code(&self) -> &'static str {
        match self {
            State::Empty => "state-empty",
            State::Pending(_) => "state-pending",
            State::Stale(_) => "state-stale",
            State::Done(_) => "state-done",
            State::Error(_) => "state-error",
        }
    }
}

impl<A, E> From<Result<A, E>> for State<A, E> {
    fn from(result: Result<A, E>) -> Self {
        State::from_result(result)
    }
}
