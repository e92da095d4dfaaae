//! The handler table.
//!
//! Handlers are plain functions run inside the pipeline after routing.
//! They read what the request stages left in the [`RequestContext`] and
//! return an [`Outcome`]; they never build responses for errors.

use std::collections::HashMap;

use tiddlyweb_middleware::types::{Outcome, Request};
use tiddlyweb_middleware::RequestContext;

use crate::handlers::{bag, challenge, recipe, root, tiddler};

/// A route handler.
pub type HandlerFn = fn(&mut RequestContext, &Request) -> Outcome;

/// Handler names mapped to handler functions.
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<&'static str, HandlerFn>,
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort_unstable();
        f.debug_struct("HandlerTable").field("handlers", &names).finish()
    }
}

impl HandlerTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the table with every wiki handler.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.register("root", root::root);
        table.register("list_bags", bag::list_bags);
        table.register("get_bag", bag::get_bag);
        table.register("put_bag", bag::put_bag);
        table.register("delete_bag", bag::delete_bag);
        table.register("list_bag_tiddlers", bag::list_bag_tiddlers);
        table.register("list_recipes", recipe::list_recipes);
        table.register("get_recipe", recipe::get_recipe);
        table.register("put_recipe", recipe::put_recipe);
        table.register("delete_recipe", recipe::delete_recipe);
        table.register("list_recipe_tiddlers", recipe::list_recipe_tiddlers);
        table.register("get_tiddler", tiddler::get_tiddler);
        table.register("put_tiddler", tiddler::put_tiddler);
        table.register("delete_tiddler", tiddler::delete_tiddler);
        table.register("list_revisions", tiddler::list_revisions);
        table.register("get_revision", tiddler::get_revision);
        table.register("list_challengers", challenge::list_challengers);
        table.register("cookie_form", challenge::cookie_form);
        table.register("cookie_form_submit", challenge::cookie_form_submit);
        table
    }

    /// Registers `handler` under `name`, replacing any previous one.
    pub fn register(&mut self, name: &'static str, handler: HandlerFn) {
        self.handlers.insert(name, handler);
    }

    /// Returns the handler registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<HandlerFn> {
        self.handlers.get(name).copied()
    }

    /// Returns true if a handler is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Returns the number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
