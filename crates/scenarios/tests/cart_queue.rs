//! End-to-end queue flow: cart mutations are queued as they happen and the
//! driver sends them one at a time, in order, across host ticks.

use std::collections::HashMap;
use std::convert::Infallible;

use pretty_assertions::assert_eq;
use promise::{Promise, Sink};
use queue::{with_group, Decision, Queue, RequestId};
use scenarios::Host;
use state::State;

#[derive(Clone, Debug, PartialEq, Eq)]
struct CartOp {
    item: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct PostCart {
    id: String,
    item: String,
}

#[derive(Clone, Debug, PartialEq)]
struct Model {
    queue: Queue<CartOp>,
    responses: HashMap<String, State<u32, String>>,
}

impl Model {
    fn new() -> Self {
        Self {
            queue: Queue::new("cart"),
            responses: HashMap::new(),
        }
    }
}

fn cart_handler(
    id: &RequestId,
    op: &CartOp,
) -> Promise<Model, PostCart, Decision<CartOp, PostCart>, Infallible> {
    let id = id.clone();
    let op = op.clone();
    Promise::from_model(move |m: &Model| {
        let slot = m.responses.get(id.as_str()).cloned().unwrap_or_default();
        let effect = PostCart {
            id: id.as_str().to_string(),
            item: op.item.clone(),
        };
        Promise::from_value(with_group("cart", op.clone(), effect, &slot))
    })
}

/// One turn of the host's update function: drive the queue, install the
/// successor queue, and launch whatever the driver decided to send.
fn queue_tick(model: &Model) -> Sink<Model, PostCart> {
    model.queue.run(cart_handler).update(|state, mut m| {
        let (next, decided) = state.to_option().expect("driver always settles");
        m.queue = next;
        (m, decided.into_iter().collect())
    })
}

#[test]
fn grouped_sends_progress_one_response_at_a_time() {
    scenarios::logging::init();

    let mut host = Host::new(Model::new());
    host.respond(|m| {
        for item in ["apples", "pears", "plums"] {
            m.queue.add(CartOp { item: item.into() });
        }
        Ok(())
    })
    .unwrap();

    // Tick 1: only the head of the group is sent.
    host.tick(queue_tick);
    assert_eq!(
        host.take_dispatched(),
        vec![PostCart {
            id: "cart-0".into(),
            item: "apples".into()
        }]
    );

    // The host records the dispatch as in flight; re-running sends nothing.
    host.respond(|m| {
        m.responses.insert("cart-0".into(), State::Pending(None));
        Ok(())
    })
    .unwrap();
    host.tick(queue_tick);
    assert_eq!(host.take_dispatched(), vec![]);

    // The first response lands; the host retires the entry and the next one
    // goes out on the following tick.
    host.respond(|m| {
        m.responses.insert("cart-0".into(), State::Done(200));
        let done: Vec<RequestId> = m
            .queue
            .requests()
            .iter()
            .filter(|(id, _)| id.as_str() == "cart-0")
            .map(|(id, _)| id.clone())
            .collect();
        for id in done {
            m.queue.remove(&id);
        }
        Ok(())
    })
    .unwrap();
    host.tick(queue_tick);
    assert_eq!(
        host.take_dispatched(),
        vec![PostCart {
            id: "cart-1".into(),
            item: "pears".into()
        }]
    );
    assert_eq!(host.model().queue.len(), 2);

    // New work enqueued mid-flight keeps the monotonic id sequence.
    host.respond(|m| {
        let id = m.queue.add(CartOp {
            item: "quinces".into(),
        });
        assert_eq!(id.as_str(), "cart-3");
        Ok(())
    })
    .unwrap();
}
