//! Caller identity resolution.
//!
//! Tries each configured [`Extractor`] in order. The first one that returns
//! an identity wins; with none, the caller stays anonymous. Credentials
//! that fail verification are not an error, they just prove nothing.

use std::sync::Arc;

use tracing::debug;

use crate::extractor::Extractor;
use crate::pipeline::RequestStage;
use crate::{HttpError, Request, RequestContext};

/// The `user_extract` stage.
#[derive(Debug, Clone, Default)]
pub struct UserExtract {
    extractors: Vec<Arc<dyn Extractor>>,
}

impl UserExtract {
    /// Creates the stage with extractors in the order they are tried.
    #[must_use]
    pub fn new(extractors: Vec<Arc<dyn Extractor>>) -> Self {
        Self { extractors }
    }
}

impl RequestStage for UserExtract {
    fn name(&self) -> &'static str {
        "user_extract"
    }

    fn process(&self, ctx: &mut RequestContext, request: &Request) -> Result<(), HttpError> {
        for extractor in &self.extractors {
            if let Some(identity) = extractor.extract(ctx, request)? {
                debug!(extractor = extractor.name(), user = identity.log_id(), "Identity resolved");
                ctx.set_identity(identity);
                return Ok(());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::sign;
    use crate::extractor::{HttpBasic, SimpleCookie};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use bytes::Bytes;
    use http::header::{AUTHORIZATION, COOKIE};
    use tiddlyweb_core::fixtures::sample_store;

    fn ctx() -> RequestContext {
        let mut ctx = RequestContext::detached("/");
        ctx.set_store(Arc::new(sample_store().unwrap()));
        ctx
    }

    fn stage() -> UserExtract {
        UserExtract::new(vec![Arc::new(HttpBasic), Arc::new(SimpleCookie)])
    }

    #[test]
    fn test_no_credentials_is_anonymous() {
        let mut ctx = ctx();
        let request = http::Request::get("/").body(Bytes::new()).unwrap();
        stage().process(&mut ctx, &request).unwrap();
        assert!(ctx.identity().is_anonymous());
    }

    #[test]
    fn test_first_extractor_wins() {
        let mut ctx = ctx();
        let cookie = format!("tiddlyweb_user=bob:{}", sign("bob", &ctx.config().secret));
        let request = http::Request::get("/")
            .header(AUTHORIZATION, format!("Basic {}", STANDARD.encode("alice:alicepass")))
            .header(COOKIE, cookie)
            .body(Bytes::new())
            .unwrap();

        stage().process(&mut ctx, &request).unwrap();
        assert_eq!(ctx.identity().name(), Some("alice"));
    }

    #[test]
    fn test_falls_through_to_cookie() {
        let mut ctx = ctx();
        let cookie = format!("tiddlyweb_user=bob:{}", sign("bob", &ctx.config().secret));
        let request = http::Request::get("/")
            .header(AUTHORIZATION, format!("Basic {}", STANDARD.encode("alice:nope")))
            .header(COOKIE, cookie)
            .body(Bytes::new())
            .unwrap();

        stage().process(&mut ctx, &request).unwrap();
        assert_eq!(ctx.identity().name(), Some("bob"));
    }
}
