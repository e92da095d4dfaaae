//! Sample content for tests and local runs.
//!
//! ```text
//! bags:     alpha (open), private (read: R:ADMIN), users (write: ANY)
//! recipes:  site = [alpha, private]
//! tiddlers: alpha/foo (two revisions), alpha/bar, private/secret
//! users:    alice (ADMIN, password "alicepass"), bob (password "bobpass")
//! ```

use crate::error::WikiResult;
use crate::policy::{Constraint, Policy, Principal};
use crate::{Bag, MemoryStore, Recipe, Store, Tiddler, User};

/// Timestamp given to every fixture tiddler.
pub const FIXTURE_TIMESTAMP: &str = "20240101120000";

/// Fills `store` with the sample content.
pub fn populate(store: &dyn Store) -> WikiResult<()> {
    store.put_bag(&Bag::new("alpha").with_desc("An open bag"))?;

    let mut private = Policy::new();
    private.set(Constraint::Read, vec![Principal::Role("ADMIN".into())]);
    private.set(Constraint::Write, vec![Principal::Role("ADMIN".into())]);
    store.put_bag(&Bag::new("private").with_desc("Admins only").with_policy(private))?;

    let mut users = Policy::new();
    users.set(Constraint::Write, vec![Principal::AnyAuthenticated]);
    users.set(Constraint::Delete, vec![Principal::User("alice".into())]);
    store.put_bag(&Bag::new("users").with_policy(users))?;

    store.put_recipe(
        &Recipe::new("site")
            .with_desc("Everything")
            .with_bag("alpha", "")
            .with_bag("private", ""),
    )?;

    for text in ["first draft", "Hello from foo"] {
        store.put_tiddler(&fixture_tiddler("foo", "alpha", text).with_tags(["greeting"]))?;
    }
    store.put_tiddler(&fixture_tiddler("bar", "alpha", "Bar text"))?;
    store.put_tiddler(&fixture_tiddler("secret", "private", "Do not read"))?;

    let mut alice = User::new("alice");
    alice.set_password("alicepass");
    alice.add_role("ADMIN");
    store.put_user(&alice)?;

    let mut bob = User::new("bob");
    bob.set_password("bobpass");
    store.put_user(&bob)?;

    Ok(())
}

/// Returns a new [`MemoryStore`] holding the sample content.
pub fn sample_store() -> WikiResult<MemoryStore> {
    let store = MemoryStore::new();
    populate(&store)?;
    Ok(store)
}

fn fixture_tiddler(title: &str, bag: &str, text: &str) -> Tiddler {
    let mut tiddler = Tiddler::new(title, bag).with_text(text);
    tiddler.modifier = Some("fixture".to_string());
    tiddler.modified = FIXTURE_TIMESTAMP.to_string();
    tiddler
}
