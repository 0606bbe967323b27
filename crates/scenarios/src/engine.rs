//! The scripted host loop.

use anyhow::Result;
use promise::Sink;

/// A fake host runtime: one model, one ordered dispatch log.
pub struct Host<M, Eff> {
    model: Option<M>,
    dispatched: Vec<Eff>,
}

impl<M, Eff> Host<M, Eff>
where
    M: 'static,
    Eff: 'static,
{
    /// Creates a host over an initial model.
    pub fn new(model: M) -> Self {
        Self {
            model: Some(model),
            dispatched: Vec::new(),
        }
    }

    /// The current model.
    pub fn model(&self) -> &M {
        self.model.as_ref().expect("model is present between ticks")
    }

    /// One turn of the update loop: rebuild the sinked promise from the
    /// current model, run it, install the candidate model it returns, and
    /// append its effects to the dispatch log.
    pub fn tick(&mut self, build: impl FnOnce(&M) -> Sink<M, Eff>) {
        let model = self.model.take().expect("model is present between ticks");
        let sink = build(&model);
        let (model, effects) = sink.run(model);
        tracing::debug!(effects = effects.len(), "tick complete");
        self.model = Some(model);
        self.dispatched.extend(effects);
    }

    /// The response-ingestion step: apply a host write to the model, exactly
    /// as the runtime would on receiving a transport message.
    pub fn respond(&mut self, write: impl FnOnce(&mut M) -> Result<()>) -> Result<()> {
        let model = self.model.as_mut().expect("model is present between ticks");
        write(model)
    }

    /// Everything dispatched so far, in order.
    pub fn dispatched(&self) -> &[Eff] {
        &self.dispatched
    }

    /// Drains the dispatch log, so tests can assert per-tick emissions.
    pub fn take_dispatched(&mut self) -> Vec<Eff> {
        std::mem::take(&mut self.dispatched)
    }
}
