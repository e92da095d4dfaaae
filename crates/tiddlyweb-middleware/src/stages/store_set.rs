//! Attaches the shared store to each request.

use std::sync::Arc;

use tiddlyweb_core::Store;

use crate::pipeline::RequestStage;
use crate::{HttpError, Request, RequestContext};

/// The `store_set` stage.
pub struct StoreSet {
    store: Arc<dyn Store>,
}

impl StoreSet {
    /// Creates the stage for `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl RequestStage for StoreSet {
    fn name(&self) -> &'static str {
        "store_set"
    }

    fn process(&self, ctx: &mut RequestContext, _request: &Request) -> Result<(), HttpError> {
        ctx.set_store(Arc::clone(&self.store));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tiddlyweb_core::MemoryStore;

    #[test]
    fn test_store_attached() {
        let stage = StoreSet::new(Arc::new(MemoryStore::new()));
        let mut ctx = RequestContext::detached("/");
        let request = http::Request::get("/").body(Bytes::new()).unwrap();

        stage.process(&mut ctx, &request).unwrap();
        assert_eq!(ctx.store().unwrap().name(), "memory");
    }
}
