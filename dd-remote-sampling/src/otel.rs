// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::borrow::Cow;

use opentelemetry::trace::{SamplingDecision, SamplingResult, TraceContextExt, TraceId};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::ShouldSample;

use crate::remote_sampler::RemoteSampler;
use crate::types::{Tag, TagValue};

fn tag_to_key_value(tag: &Tag) -> KeyValue {
    match &tag.value {
        TagValue::String(Cow::Borrowed(s)) => KeyValue::new(tag.key, *s),
        TagValue::String(Cow::Owned(s)) => KeyValue::new(tag.key, s.clone()),
        TagValue::F64(v) => KeyValue::new(tag.key, *v),
    }
}

impl ShouldSample for RemoteSampler {
    fn should_sample(
        &self,
        parent_context: Option<&Context>,
        trace_id: TraceId,
        name: &str,
        _span_kind: &opentelemetry::trace::SpanKind,
        _attributes: &[KeyValue],
        _links: &[opentelemetry::trace::Link],
    ) -> SamplingResult {
        // Children inherit the decision taken for the root span
        if let Some(parent_ctx) = parent_context.filter(|cx| cx.has_active_span()) {
            let span = parent_ctx.span();
            let parent_span_context = span.span_context();
            let decision = if parent_span_context.is_sampled() {
                SamplingDecision::RecordAndSample
            } else {
                SamplingDecision::Drop
            };
            return SamplingResult {
                decision,
                attributes: Vec::new(),
                trace_state: parent_span_context.trace_state().clone(),
            };
        }

        let result = self.decide(trace_id.into(), name);
        SamplingResult {
            decision: if result.sampled {
                SamplingDecision::RecordAndSample
            } else {
                SamplingDecision::Drop
            },
            attributes: result.tags.iter().map(tag_to_key_value).collect(),
            trace_state: Default::default(),
        }
    }
}
