//! Ordered pending-request records with grouped one-in-flight dispatch.
//!
//! A [`Queue`] lives inside the host model and holds the requests that have
//! been asked for but not yet resolved, each under a monotonic prefixed
//! [`RequestId`]. The driver, [`Queue::run`], walks the queue once per
//! invocation and asks a per-request handler for a [`Decision`]; grouped
//! decisions share a mark set so at most one effect per group leaves the queue
//! in a single pass, while independent groups progress in parallel.

use std::collections::HashSet;
use std::fmt;

use promise::{Effects, Promise};
use serde::{Deserialize, Serialize};
use state::State;

/// Opaque identifier of a queued request, rendered as `"{prefix}-{n}"` on the
/// wire. Identifiers are unique within their queue and never recycled.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// The wire form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered list of pending requests keyed by [`RequestId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Queue<R> {
    prefix: String,
    next_id: u64,
    requests: Vec<(RequestId, R)>,
}

impl<R> Queue<R> {
    /// Creates an empty queue whose identifiers are namespaced by `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_id: 0,
            requests: Vec::new(),
        }
    }

    /// Appends a request under the next identifier and returns that
    /// identifier.
    pub fn add(&mut self, request: R) -> RequestId {
        let id = RequestId(format!("{}-{}", self.prefix, self.next_id));
        self.next_id += 1;
        self.requests.push((id.clone(), request));
        id
    }

    /// Drops the entry with the given identifier, preserving the relative
    /// order of the rest. Unknown identifiers are a no-op.
    pub fn remove(&mut self, id: &RequestId) {
        self.requests.retain(|(entry_id, _)| entry_id != id);
    }

    /// Replaces the payload stored under `id` in place. Unknown identifiers
    /// are a no-op; `insert` never grows the queue.
    pub fn insert(&mut self, id: &RequestId, request: R) {
        if let Some(entry) = self.requests.iter_mut().find(|(entry_id, _)| entry_id == id) {
            entry.1 = request;
        }
    }

    /// The pending entries in insertion order.
    pub fn requests(&self) -> &[(RequestId, R)] {
        &self.requests
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// True when any pending payload satisfies `pred`.
    pub fn any(&self, mut pred: impl FnMut(&R) -> bool) -> bool {
        self.requests.iter().any(|(_, request)| pred(request))
    }

    /// True when every pending payload satisfies `pred`.
    pub fn all(&self, mut pred: impl FnMut(&R) -> bool) -> bool {
        self.requests.iter().all(|(_, request)| pred(request))
    }
}

impl<R> Queue<R>
where
    R: Clone + 'static,
{
    /// The driver: walks every entry exactly once, in order, asking `handler`
    /// for a [`Decision`] per entry.
    ///
    /// The handler's promises thread the model left to right and their emitted
    /// effects flow through the returned promise's effect channel. The effects
    /// *selected* by `Send`/`SendGroup` decisions are data, not emissions:
    /// they come back in queue order (modulo group suppression) inside the
    /// promise's `Done((next_queue, decided_effects))` value, so the host can
    /// install the queue and launch them from one `update` writer.
    ///
    /// A handler whose state is anything but `Done` skips its entry; the walk
    /// itself never stops early.
    pub fn run<M, Eff, E>(
        &self,
        handler: impl Fn(&RequestId, &R) -> Promise<M, Eff, Decision<R, Eff>, E> + 'static,
    ) -> Promise<M, Eff, (Queue<R>, Vec<Eff>), E>
    where
        M: 'static,
        Eff: 'static,
        E: 'static,
    {
        let mut next = self.clone();
        Promise::new(move |mut model| {
            let mut emitted = Effects::new();
            let mut decided = Vec::new();
            let mut marked: HashSet<String> = HashSet::new();
            let snapshot = next.requests.clone();

            for (id, request) in &snapshot {
                let (outcome, threaded, more) = handler(id, request).step(model);
                model = threaded;
                emitted.extend(more);

                let decision = match outcome {
                    State::Done(decision) => decision,
                    other => {
                        tracing::debug!(id = %id, state = other.code(), "handler did not settle, skipping entry");
                        continue;
                    }
                };
                match decision {
                    Decision::Send { request, effect } => {
                        next.insert(id, request);
                        decided.push(effect);
                    }
                    Decision::SendGroup {
                        group,
                        request,
                        effect,
                    } => {
                        if marked.contains(&group) {
                            tracing::debug!(id = %id, group = %group, "group already sent this pass, suppressing");
                        } else {
                            marked.insert(group);
                            next.insert(id, request);
                            decided.push(effect);
                        }
                    }
                    Decision::StopGroup { group } => {
                        marked.insert(group);
                    }
                    Decision::Skip => {}
                }
            }

            (State::Done((next, decided)), model, emitted)
        })
    }
}

/// Per-request verdict produced by a [`Queue::run`] handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision<R, Eff> {
    /// Replace the entry's payload and emit the effect unconditionally.
    Send {
        /// Successor payload for the entry.
        request: R,
        /// Effect to hand to the host.
        effect: Eff,
    },
    /// Emit and replace only if the group has not fired yet in this pass,
    /// then mark the group.
    SendGroup {
        /// Exclusion group name.
        group: String,
        /// Successor payload for the entry.
        request: R,
        /// Effect to hand to the host.
        effect: Eff,
    },
    /// Mark the group without emitting, blocking later entries in the same
    /// group for this pass.
    StopGroup {
        /// Exclusion group name.
        group: String,
    },
    /// Leave the entry untouched and emit nothing.
    Skip,
}

/// Ungrouped dispatch policy over a response slot: fire only when the slot
/// was never requested.
pub fn send<R, Eff, A, E>(request: R, effect: Eff, response: &State<A, E>) -> Decision<R, Eff> {
    match response {
        State::Empty => Decision::Send { request, effect },
        _ => Decision::Skip,
    }
}

/// Grouped dispatch policy over a response slot: fire when the slot was never
/// requested, hold the whole group while one is in flight, and stand down once
/// a response (of any kind) has arrived.
pub fn with_group<R, Eff, A, E>(
    group: impl Into<String>,
    request: R,
    effect: Eff,
    response: &State<A, E>,
) -> Decision<R, Eff> {
    match response {
        State::Empty => Decision::SendGroup {
            group: group.into(),
            request,
            effect,
        },
        State::Pending(_) => Decision::StopGroup {
            group: group.into(),
        },
        State::Stale(_) | State::Done(_) | State::Error(_) => Decision::Skip,
    }
}
