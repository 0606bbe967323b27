//! Revalidation protocol tests: slot-focused promises over a model with
//! keyed caches, per the at-most-one-in-flight contract.

use std::collections::HashMap;

use pretty_assertions::assert_eq;
use promise::Promise;
use state::State;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Effect {
    Upper(String),
    Suggest(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Model {
    upper: HashMap<String, State<String, String>>,
    suggest: HashMap<String, State<Vec<String>, String>>,
}

type P<A> = Promise<Model, Effect, A, String>;

/// Cache-backed uppercase lookup focused on `model.upper[term]`.
fn upper(term: &str) -> P<String> {
    let effect_key = term.to_string();
    let get_key = term.to_string();
    let set_key = term.to_string();
    Promise::from_effect_when_empty(move || Effect::Upper(effect_key))
        .embed_model(
            move |m: &Model| m.upper.get(&get_key).cloned().unwrap_or_default(),
            move |slot, mut m: Model| {
                m.upper.insert(set_key, slot);
                m
            },
        )
}

/// Cache-backed suggestion lookup focused on `model.suggest[term]`.
fn suggest(term: String) -> P<Vec<String>> {
    let effect_key = term.clone();
    let get_key = term.clone();
    let set_key = term;
    Promise::from_effect_when_empty(move || Effect::Suggest(effect_key))
        .embed_model(
            move |m: &Model| m.suggest.get(&get_key).cloned().unwrap_or_default(),
            move |slot, mut m: Model| {
                m.suggest.insert(set_key, slot);
                m
            },
        )
}

/// An empty slot fires once, a pending slot holds, a settled slot serves.
#[test]
fn empty_slot_fires_and_pending_slot_holds() {
    let model = Model::default();

    // First evaluation: the slot was never requested, so the request fires
    // and the slot transitions to in-flight.
    let (state, model, effects) = upper("hi").step(model);
    assert_eq!(state, State::Pending(None));
    assert_eq!(effects.into_vec(), vec![Effect::Upper("hi".into())]);
    assert_eq!(model.upper.get("hi"), Some(&State::Pending(None)));

    // Second evaluation against the unchanged model: nothing new may fire.
    let before = model.clone();
    let (state, model, effects) = upper("hi").step(model);
    assert_eq!(state, State::Pending(None));
    assert!(effects.is_empty(), "a pending slot must not re-fire");
    assert_eq!(model, before);

    // The host ingests the response, after which the value is served.
    let mut model = model;
    model.upper.insert("hi".into(), State::Done("HI".into()));
    let (state, _, effects) = upper("hi").step(model);
    assert_eq!(state, State::Done("HI".into()));
    assert!(effects.is_empty(), "a settled slot must not re-fire");
}

#[test]
fn stale_slot_refires_behind_its_previous_value() {
    let mut model = Model::default();
    model.upper.insert("hi".into(), State::Stale("HI".into()));

    let (state, model, effects) = upper("hi").step(model);
    assert_eq!(state, State::Pending(Some("HI".into())));
    assert_eq!(effects.into_vec(), vec![Effect::Upper("hi".into())]);
    assert_eq!(model.upper.get("hi"), Some(&State::Pending(Some("HI".into()))));
}

#[test]
fn error_slot_is_surfaced_without_refiring() {
    let mut model = Model::default();
    model.upper.insert("hi".into(), State::Error("offline".into()));

    let (state, _, effects) = upper("hi").step(model);
    assert_eq!(state, State::Error("offline".into()));
    assert!(effects.is_empty());
}

/// A chained fetch fires the dependent request as soon as its input settles,
/// and the chain reports in-flight.
#[test]
fn chained_fetch_fires_the_dependent_request() {
    let mut model = Model::default();
    model.upper.insert("cat".into(), State::Done("CAT".into()));

    let p = upper("cat").and_then(suggest);
    let (state, model, effects) = p.step(model);

    assert_eq!(effects.into_vec(), vec![Effect::Suggest("CAT".into())]);
    assert_eq!(state, State::Pending(None));
    assert_eq!(model.suggest.get("CAT"), Some(&State::Pending(None)));
    // The upstream slot is untouched.
    assert_eq!(model.upper.get("cat"), Some(&State::Done("CAT".into())));
}

/// A chain whose head is still refreshing keeps the in-flight flag even after
/// the tail settles.
#[test]
fn chained_fetch_stays_pending_while_the_head_refreshes() {
    let mut model = Model::default();
    model.upper.insert("cat".into(), State::Stale("CAT".into()));
    model
        .suggest
        .insert("CAT".into(), State::Done(vec!["cats".into()]));

    let p = upper("cat").and_then(suggest);
    let (state, _, effects) = p.step(model);

    assert_eq!(effects.into_vec(), vec![Effect::Upper("cat".into())]);
    assert_eq!(state, State::Pending(Some(vec!["cats".into()])));
}
