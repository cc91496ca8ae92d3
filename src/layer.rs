//! [`tracing_subscriber::Layer`] feeding closed `tracing` spans into a [`LatencyLearner`].

use crate::{sample::SpanSample, LatencyLearner};
use std::fmt;
use tracing::{
    field::{Field, Visit},
    Id, Subscriber,
};
use tracing_core::span::Attributes;
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

/// Name of the span field whose value, when present, is used as the variant label.
pub const VARIANT_FIELD: &str = "variant";

/// Records every `tracing` span, from creation to close, as a sample under the span's name.
/// A `variant` field on the span selects the variant, e.g.
/// `trace_span!("parse", variant = "n=200")` records into `parse(n=200)` and `parse`.
#[derive(Clone)]
pub struct LatencyLearnerLayer {
    learner: LatencyLearner,
}

impl LatencyLearnerLayer {
    pub fn new(learner: LatencyLearner) -> Self {
        Self { learner }
    }

    pub fn learner(&self) -> &LatencyLearner {
        &self.learner
    }
}

/// Sample stored in the span's extensions between `on_new_span` and `on_close`.
struct PendingSample(SpanSample);

struct VariantReader(Option<String>);

impl Visit for VariantReader {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == VARIANT_FIELD {
            self.0 = Some(value.to_owned());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == VARIANT_FIELD {
            self.0 = Some(format!("{:?}", value));
        }
    }
}

impl<S> Layer<S> for LatencyLearnerLayer
where
    S: Subscriber,
    S: for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut reader = VariantReader(None);
        attrs.record(&mut reader);

        let sample = SpanSample::new(attrs.metadata().name(), reader.0);
        span.extensions_mut().insert(PendingSample(sample));
        log::trace!("`on_new_span` executed with id={:?}", id);
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };

        let pending = span.extensions_mut().remove::<PendingSample>();
        if let Some(PendingSample(sample)) = pending {
            self.learner.end(sample);
        }
        log::trace!("`on_close` executed for span id {:?}", id);
    }
}
