//! Encodes text bodies as UTF-8 bytes.

use bytes::Bytes;

use crate::pipeline::ResponseStage;
use crate::types::{Outcome, ReplyBody};
use crate::RequestContext;

/// The `encode_utf8` stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeUtf8;

impl ResponseStage for EncodeUtf8 {
    fn name(&self) -> &'static str {
        "encode_utf8"
    }

    fn process(&self, _ctx: &mut RequestContext, outcome: Outcome) -> Outcome {
        let mut reply = outcome?;
        reply.body = match std::mem::take(&mut reply.body) {
            ReplyBody::Text(text) => ReplyBody::Bytes(Bytes::from(text)),
            other => other,
        };
        Ok(reply)
    }
}
