//! Pure descriptions of model-cached effectful computations.
//!
//! A [`Promise`] is a single-shot function from a model to a triple: the
//! [`State`] of the requested value, a successor model, and the list of
//! effects the host must launch to make further progress. Evaluation is
//! synchronous and deterministic; nothing here performs I/O. The host's update
//! loop rebuilds the relevant promise on every message, hands it the current
//! model through [`Promise::run`], installs the candidate model it gets back,
//! and dispatches the returned effects.
//!
//! Asynchrony is represented entirely in-band: a slot that is waiting on a
//! response reports [`State::Pending`], and [`Promise::from_effect_when_empty`]
//! guarantees that at most one request per slot is ever in flight.

use std::convert::Infallible;

use smallvec::{smallvec, SmallVec};
use state::State;

/// Ordered list of effects emitted during one evaluation.
///
/// Concatenation order is part of the contract: sources before continuations,
/// left operands before right operands.
pub type Effects<Eff> = SmallVec<[Eff; 4]>;

/// A sinked promise: unit result, uninhabited error. The only shape accepted
/// by [`Promise::run`].
pub type Sink<M, Eff> = Promise<M, Eff, (), Infallible>;

/// A composable description of a computation over the host model.
///
/// Evaluating a promise against a model yields a [`State`]-tagged result, a
/// successor model, and emitted effects. Promises are descriptions, not live
/// objects: combinators consume `self` and the host rebuilds the promise from
/// scratch each tick.
pub struct Promise<M, Eff, A, E> {
    eval: Box<dyn FnOnce(M) -> (State<A, E>, M, Effects<Eff>)>,
}

impl<M, Eff, A, E> Promise<M, Eff, A, E>
where
    M: 'static,
    Eff: 'static,
    A: 'static,
    E: 'static,
{
    /// Wraps a raw evaluation function.
    pub fn new(eval: impl FnOnce(M) -> (State<A, E>, M, Effects<Eff>) + 'static) -> Self {
        Self {
            eval: Box::new(eval),
        }
    }

    /// Evaluates the promise against a model snapshot.
    pub fn step(self, model: M) -> (State<A, E>, M, Effects<Eff>) {
        (self.eval)(model)
    }

    /// Always yields `Done(value)` with no effects and no model change.
    pub fn from_value(value: A) -> Self {
        Self::from_state(State::Done(value))
    }

    /// Always yields `Error(err)`.
    pub fn from_error(err: E) -> Self {
        Self::from_state(State::Error(err))
    }

    /// Lifts a `Result` into a constant promise.
    pub fn from_result(result: Result<A, E>) -> Self {
        Self::from_state(State::from_result(result))
    }

    /// Lifts an `Option` into a constant promise.
    pub fn from_option(option: Option<A>) -> Self {
        Self::from_state(State::from_option(option))
    }

    /// Lifts a constant state into a promise.
    pub fn from_state(state: State<A, E>) -> Self {
        Self::new(move |model| (state, model, SmallVec::new()))
    }

    /// The reader: `f` inspects the model to decide which promise to become,
    /// and that promise is evaluated against the same model.
    pub fn from_model(f: impl FnOnce(&M) -> Self + 'static) -> Self {
        Self::new(move |model| {
            let promise = f(&model);
            promise.step(model)
        })
    }

    /// The cache-insertion primitive: `f` rewrites the model and yields the
    /// promise to evaluate against the rewritten model.
    pub fn from_update(f: impl FnOnce(M) -> (M, Self) + 'static) -> Self {
        Self::new(move |model| {
            let (model, promise) = f(model);
            promise.step(model)
        })
    }

    /// Applies `f` under every state variant's value payload.
    pub fn map<B>(self, f: impl FnOnce(A) -> B + 'static) -> Promise<M, Eff, B, E>
    where
        B: 'static,
    {
        Promise::new(move |model| {
            let (state, model, effects) = self.step(model);
            (state.map(f), model, effects)
        })
    }

    /// Applies `f` to every emitted effect.
    pub fn map_effect<Eff2>(self, f: impl FnMut(Eff) -> Eff2 + 'static) -> Promise<M, Eff2, A, E>
    where
        Eff2: 'static,
    {
        Promise::new(move |model| {
            let (state, model, effects) = self.step(model);
            (state, model, effects.into_iter().map(f).collect())
        })
    }

    /// Applies `f` to the error payload only.
    pub fn map_error<F>(self, f: impl FnOnce(E) -> F + 'static) -> Promise<M, Eff, A, F>
    where
        F: 'static,
    {
        Promise::new(move |model| {
            let (state, model, effects) = self.step(model);
            (state.map_error(f), model, effects)
        })
    }

    /// Reifies the inner state as a value, so callers can inspect progress
    /// without blocking on it.
    ///
    /// The outer state is `Done(inner)` unless the inner state was pending, in
    /// which case it is `Pending(Some(inner))` so the in-flight signal is not
    /// lost. The outer error type is free because the outer promise cannot
    /// fail.
    pub fn with_state<F>(self) -> Promise<M, Eff, State<A, E>, F>
    where
        F: 'static,
    {
        Promise::new(move |model| {
            let (state, model, effects) = self.step(model);
            let outer = if state.is_pending() {
                State::Pending(Some(state))
            } else {
                State::Done(state)
            };
            (outer, model, effects)
        })
    }

    /// Monadic bind: continues with the produced value.
    ///
    /// Any value-carrying state binds. A `Pending(Some)` source forces the
    /// continuation's state through [`State::set_pending`] so the in-flight
    /// flag survives the chain. `Empty` and `Pending(None)` short-circuit to
    /// themselves and `Error` propagates; in every case the source's model
    /// update and effects are kept, and source effects precede continuation
    /// effects.
    pub fn and_then<B>(
        self,
        f: impl FnOnce(A) -> Promise<M, Eff, B, E> + 'static,
    ) -> Promise<M, Eff, B, E>
    where
        B: 'static,
    {
        Promise::new(move |model| {
            let (state, model, mut effects) = self.step(model);
            match state {
                State::Done(value) | State::Stale(value) => {
                    let (next, model, more) = f(value).step(model);
                    effects.extend(more);
                    (next, model, effects)
                }
                State::Pending(Some(value)) => {
                    let (next, model, more) = f(value).step(model);
                    effects.extend(more);
                    (next.set_pending(), model, effects)
                }
                State::Pending(None) => (State::Pending(None), model, effects),
                State::Empty => (State::Empty, model, effects),
                State::Error(err) => (State::Error(err), model, effects),
            }
        })
    }

    /// Applicative product: applies the function this promise produces to the
    /// value `pa` produces.
    ///
    /// `self` evaluates first and its model update is visible to `pa`; states
    /// combine via [`State::merge`] and effects concatenate left to right.
    pub fn and_map<B, C>(self, pa: Promise<M, Eff, B, E>) -> Promise<M, Eff, C, E>
    where
        A: FnOnce(B) -> C,
        B: 'static,
        C: 'static,
    {
        self.map2(pa, |f, b| f(b))
    }

    /// Combines two promises with `f`, threading the model left to right.
    pub fn map2<B, C>(
        self,
        pb: Promise<M, Eff, B, E>,
        f: impl FnOnce(A, B) -> C + 'static,
    ) -> Promise<M, Eff, C, E>
    where
        B: 'static,
        C: 'static,
    {
        Promise::new(move |model| {
            let (sa, model, mut effects) = self.step(model);
            let (sb, model, more) = pb.step(model);
            effects.extend(more);
            (sa.merge(sb, f), model, effects)
        })
    }

    /// Three-way [`Promise::map2`].
    pub fn map3<B, C, D>(
        self,
        pb: Promise<M, Eff, B, E>,
        pc: Promise<M, Eff, C, E>,
        f: impl FnOnce(A, B, C) -> D + 'static,
    ) -> Promise<M, Eff, D, E>
    where
        B: 'static,
        C: 'static,
        D: 'static,
    {
        self.map2(pb, |a, b| (a, b))
            .map2(pc, move |(a, b), c| f(a, b, c))
    }

    /// Four-way [`Promise::map2`].
    pub fn map4<B, C, D, R>(
        self,
        pb: Promise<M, Eff, B, E>,
        pc: Promise<M, Eff, C, E>,
        pd: Promise<M, Eff, D, E>,
        f: impl FnOnce(A, B, C, D) -> R + 'static,
    ) -> Promise<M, Eff, R, E>
    where
        B: 'static,
        C: 'static,
        D: 'static,
        R: 'static,
    {
        self.map2(pb, |a, b| (a, b))
            .map2(pc, |(a, b), c| (a, b, c))
            .map2(pd, move |(a, b, c), d| f(a, b, c, d))
    }

    /// Sequences a list of promises into a promise of the list of values,
    /// preserving order for values and effects alike.
    pub fn combine(promises: Vec<Self>) -> Promise<M, Eff, Vec<A>, E> {
        promises
            .into_iter()
            .fold(Promise::from_value(Vec::new()), |acc, p| {
                acc.map2(p, |mut values, value| {
                    values.push(value);
                    values
                })
            })
    }

    /// Substitutes a fallback value into a `Pending(None)` result so the view
    /// has something to show while the first request is in flight.
    pub fn when_pending(self, value: A) -> Self {
        Promise::new(move |model| {
            let (state, model, effects) = self.step(model);
            let state = match state {
                State::Pending(None) => State::Pending(Some(value)),
                other => other,
            };
            (state, model, effects)
        })
    }

    /// Converts an error into a plain value, leaving every other state
    /// untouched. The error type widens to any fresh `F` because no error can
    /// escape.
    pub fn when_error<F>(self, f: impl FnOnce(E) -> A + 'static) -> Promise<M, Eff, A, F>
    where
        F: 'static,
    {
        Promise::new(move |model| {
            let (state, model, effects) = self.step(model);
            let state = match state {
                State::Error(err) => State::Done(f(err)),
                State::Empty => State::Empty,
                State::Pending(prev) => State::Pending(prev),
                State::Stale(value) => State::Stale(value),
                State::Done(value) => State::Done(value),
            };
            (state, model, effects)
        })
    }

    /// Lifts the result into an `Option`, collapsing errors to `None`.
    pub fn with_option<F>(self) -> Promise<M, Eff, Option<A>, F>
    where
        F: 'static,
    {
        self.map(Some).when_error(|_| None)
    }

    /// Like [`Promise::with_option`], but only errors matching `pred` collapse
    /// to `None`; the rest still propagate.
    pub fn with_option_when_error(
        self,
        pred: impl FnOnce(&E) -> bool + 'static,
    ) -> Promise<M, Eff, Option<A>, E> {
        Promise::new(move |model| {
            let (state, model, effects) = self.step(model);
            let state = match state {
                State::Error(err) if pred(&err) => State::Done(None),
                other => other.map(Some),
            };
            (state, model, effects)
        })
    }

    /// Lifts the result into a `Result`, turning both terminal states into
    /// plain values.
    pub fn with_result<F>(self) -> Promise<M, Eff, Result<A, E>, F>
    where
        F: 'static,
    {
        self.map(Ok).when_error(Err)
    }

    /// Swaps an error for a fresh promise evaluated against the failed
    /// promise's model; its effects are appended after the original's. All
    /// other states pass through.
    pub fn recover(self, handler: impl FnOnce(E) -> Self + 'static) -> Self {
        Promise::new(move |model| {
            let (state, model, mut effects) = self.step(model);
            match state {
                State::Error(err) => {
                    let (next, model, more) = handler(err).step(model);
                    effects.extend(more);
                    (next, model, effects)
                }
                other => (other, model, effects),
            }
        })
    }

    /// Focuses this promise onto a slice of a larger model.
    ///
    /// `get` clones the slice out of the outer model, the promise evaluates
    /// against it, and `set` writes the successor slice back. State and
    /// effects pass through verbatim. The getter/setter pair is the lens that
    /// lets slot-level promises compose into the host's model; map-keyed slots
    /// capture their key in both closures.
    pub fn embed_model<N>(
        self,
        get: impl FnOnce(&N) -> M + 'static,
        set: impl FnOnce(M, N) -> N + 'static,
    ) -> Promise<N, Eff, A, E>
    where
        N: 'static,
    {
        Promise::new(move |outer| {
            let inner = get(&outer);
            let (state, inner, effects) = self.step(inner);
            (state, set(inner, outer), effects)
        })
    }

    /// Terminates the promise with a writer that folds the final state back
    /// into the model.
    ///
    /// The writer runs after evaluation and may emit further effects, which
    /// are appended after the promise's own. The result is the [`Sink`] shape
    /// accepted by [`Promise::run`].
    pub fn update(
        self,
        writer: impl FnOnce(State<A, E>, M) -> (M, Effects<Eff>) + 'static,
    ) -> Sink<M, Eff> {
        Promise::new(move |model| {
            let (state, model, mut effects) = self.step(model);
            let (model, more) = writer(state, model);
            effects.extend(more);
            (State::Done(()), model, effects)
        })
    }
}

impl<M, Eff> Promise<M, Eff, (), Infallible>
where
    M: 'static,
    Eff: 'static,
{
    /// Evaluates a sinked promise, returning the candidate model and the
    /// effects the host must dispatch. The host entry point.
    pub fn run(self, model: M) -> (M, Effects<Eff>) {
        let (_done, model, effects) = self.step(model);
        (model, effects)
    }
}

/// Argument-flipped [`Promise::run`], convenient at the end of a builder
/// pipeline inside the host's update function.
pub fn run_with<M, Eff>(model: M, sink: Sink<M, Eff>) -> (M, Effects<Eff>)
where
    M: 'static,
    Eff: 'static,
{
    sink.run(model)
}

impl<Eff, A, E> Promise<State<A, E>, Eff, A, E>
where
    Eff: 'static,
    A: Clone + 'static,
    E: Clone + 'static,
{
    /// The revalidation protocol, defined over a single slot as its model.
    ///
    /// An `Empty` slot fires the effect and becomes `Pending(None)`; a `Stale`
    /// slot fires and keeps its previous value as `Pending(Some)`; a `Pending`
    /// slot is left alone so at most one request per slot is ever in flight;
    /// `Done` and `Error` are served as they stand. Compose with
    /// [`Promise::embed_model`] to point this at a slot inside the host model.
    pub fn from_effect_when_empty(get_effect: impl FnOnce() -> Eff + 'static) -> Self {
        Promise::new(move |slot: State<A, E>| match slot {
            State::Empty => {
                tracing::trace!("empty slot, firing request");
                (State::Pending(None), State::Pending(None), smallvec![get_effect()])
            }
            State::Stale(prev) => {
                tracing::trace!("stale slot, refreshing behind previous value");
                let pending = State::Pending(Some(prev));
                (pending.clone(), pending, smallvec![get_effect()])
            }
            State::Pending(prev) => {
                tracing::trace!("request already in flight, holding");
                let pending = State::Pending(prev);
                (pending.clone(), pending, SmallVec::new())
            }
            served @ (State::Done(_) | State::Error(_)) => {
                (served.clone(), served, SmallVec::new())
            }
        })
    }
}
