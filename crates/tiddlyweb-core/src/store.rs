//! The storage collaborator.
//!
//! The web layer only ever sees the [`Store`] trait: atomic per-entity get,
//! put, delete and list operations. [`MemoryStore`] is the reference
//! implementation used by the server binary and the tests; durability is
//! left to other backends.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{EntityKind, WikiError, WikiResult};
use crate::tiddler::current_timestring;
use crate::{Bag, Recipe, Tiddler, User};

/// Storage backend for bags, recipes, tiddlers and users.
///
/// Implementations must be safe for concurrent use; each call is treated
/// as atomic for the entity it touches.
pub trait Store: Send + Sync + 'static {
    /// Returns the name of the backend, for logging.
    fn name(&self) -> &'static str;

    /// Loads a bag.
    fn get_bag(&self, name: &str) -> WikiResult<Bag>;

    /// Creates or replaces a bag.
    fn put_bag(&self, bag: &Bag) -> WikiResult<()>;

    /// Deletes a bag and every tiddler in it.
    fn delete_bag(&self, name: &str) -> WikiResult<()>;

    /// Lists all bags, ordered by name.
    fn list_bags(&self) -> WikiResult<Vec<Bag>>;

    /// Loads a recipe.
    fn get_recipe(&self, name: &str) -> WikiResult<Recipe>;

    /// Creates or replaces a recipe.
    fn put_recipe(&self, recipe: &Recipe) -> WikiResult<()>;

    /// Deletes a recipe.
    fn delete_recipe(&self, name: &str) -> WikiResult<()>;

    /// Lists all recipes, ordered by name.
    fn list_recipes(&self) -> WikiResult<Vec<Recipe>>;

    /// Loads a tiddler. `None` or `Some(0)` loads the latest revision.
    fn get_tiddler(&self, bag: &str, title: &str, revision: Option<u64>) -> WikiResult<Tiddler>;

    /// Stores a new revision of a tiddler and returns it as stored, with
    /// its revision number assigned.
    fn put_tiddler(&self, tiddler: &Tiddler) -> WikiResult<Tiddler>;

    /// Deletes a tiddler and all of its revisions.
    fn delete_tiddler(&self, bag: &str, title: &str) -> WikiResult<()>;

    /// Lists the latest revision of every tiddler in a bag, ordered by
    /// title.
    fn list_bag_tiddlers(&self, bag: &str) -> WikiResult<Vec<Tiddler>>;

    /// Lists the revision numbers of a tiddler, newest first.
    fn list_tiddler_revisions(&self, bag: &str, title: &str) -> WikiResult<Vec<u64>>;

    /// Loads a user.
    fn get_user(&self, usersign: &str) -> WikiResult<User>;

    /// Creates or replaces a user.
    fn put_user(&self, user: &User) -> WikiResult<()>;

    /// Deletes a user.
    fn delete_user(&self, usersign: &str) -> WikiResult<()>;

    /// Lists all users, ordered by name.
    fn list_users(&self) -> WikiResult<Vec<User>>;
}

#[derive(Debug, Default)]
struct Contents {
    bags: BTreeMap<String, Bag>,
    recipes: BTreeMap<String, Recipe>,
    users: BTreeMap<String, User>,
    // bag -> title -> revisions, oldest first
    tiddlers: BTreeMap<String, BTreeMap<String, Vec<Tiddler>>>,
}

/// In-memory [`Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    contents: RwLock<Contents>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn tiddler_path(bag: &str, title: &str) -> String {
    format!("{bag}/{title}")
}

impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get_bag(&self, name: &str) -> WikiResult<Bag> {
        self.contents
            .read()
            .bags
            .get(name)
            .cloned()
            .ok_or_else(|| WikiError::not_found(EntityKind::Bag, name))
    }

    fn put_bag(&self, bag: &Bag) -> WikiResult<()> {
        let mut contents = self.contents.write();
        contents.bags.insert(bag.name.clone(), bag.clone());
        contents.tiddlers.entry(bag.name.clone()).or_default();
        debug!(bag = %bag.name, "Stored bag");
        Ok(())
    }

    fn delete_bag(&self, name: &str) -> WikiResult<()> {
        let mut contents = self.contents.write();
        if contents.bags.remove(name).is_none() {
            return Err(WikiError::not_found(EntityKind::Bag, name));
        }
        contents.tiddlers.remove(name);
        debug!(bag = %name, "Deleted bag");
        Ok(())
    }

    fn list_bags(&self) -> WikiResult<Vec<Bag>> {
        Ok(self.contents.read().bags.values().cloned().collect())
    }

    fn get_recipe(&self, name: &str) -> WikiResult<Recipe> {
        self.contents
            .read()
            .recipes
            .get(name)
            .cloned()
            .ok_or_else(|| WikiError::not_found(EntityKind::Recipe, name))
    }

    fn put_recipe(&self, recipe: &Recipe) -> WikiResult<()> {
        self.contents
            .write()
            .recipes
            .insert(recipe.name.clone(), recipe.clone());
        debug!(recipe = %recipe.name, "Stored recipe");
        Ok(())
    }

    fn delete_recipe(&self, name: &str) -> WikiResult<()> {
        self.contents
            .write()
            .recipes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| WikiError::not_found(EntityKind::Recipe, name))
    }

    fn list_recipes(&self) -> WikiResult<Vec<Recipe>> {
        Ok(self.contents.read().recipes.values().cloned().collect())
    }

    fn get_tiddler(&self, bag: &str, title: &str, revision: Option<u64>) -> WikiResult<Tiddler> {
        let contents = self.contents.read();
        let revisions = contents
            .tiddlers
            .get(bag)
            .and_then(|titles| titles.get(title))
            .ok_or_else(|| WikiError::not_found(EntityKind::Tiddler, tiddler_path(bag, title)))?;

        let found = match revision {
            None | Some(0) => revisions.last(),
            Some(wanted) => revisions
                .iter()
                .find(|tiddler| tiddler.revision == Some(wanted)),
        };
        found.cloned().ok_or_else(|| {
            WikiError::not_found(
                EntityKind::Revision,
                format!("{}/{}", tiddler_path(bag, title), revision.unwrap_or(0)),
            )
        })
    }

    fn put_tiddler(&self, tiddler: &Tiddler) -> WikiResult<Tiddler> {
        let bag = tiddler
            .bag
            .clone()
            .ok_or_else(|| WikiError::invalid("tiddler has no bag"))?;
        if tiddler.title.is_empty() {
            return Err(WikiError::invalid("tiddler has no title"));
        }

        let mut contents = self.contents.write();
        if !contents.bags.contains_key(&bag) {
            return Err(WikiError::not_found(EntityKind::Bag, bag));
        }

        let revisions = contents
            .tiddlers
            .entry(bag.clone())
            .or_default()
            .entry(tiddler.title.clone())
            .or_default();

        let mut stored = tiddler.clone();
        stored.recipe = None;
        stored.revision = Some(revisions.last().map_or(1, |last| last.revision_or_latest() + 1));
        if stored.modified.is_empty() {
            stored.modified = current_timestring();
        }
        match revisions.first() {
            Some(first) => {
                stored.created.clone_from(&first.created);
                stored.creator.clone_from(&first.creator);
            }
            None => {
                if stored.created.is_empty() {
                    stored.created.clone_from(&stored.modified);
                }
                if stored.creator.is_none() {
                    stored.creator.clone_from(&stored.modifier);
                }
            }
        }

        revisions.push(stored.clone());
        debug!(bag = %bag, title = %stored.title, revision = ?stored.revision, "Stored tiddler");
        Ok(stored)
    }

    fn delete_tiddler(&self, bag: &str, title: &str) -> WikiResult<()> {
        self.contents
            .write()
            .tiddlers
            .get_mut(bag)
            .and_then(|titles| titles.remove(title))
            .map(|_| ())
            .ok_or_else(|| WikiError::not_found(EntityKind::Tiddler, tiddler_path(bag, title)))
    }

    fn list_bag_tiddlers(&self, bag: &str) -> WikiResult<Vec<Tiddler>> {
        let contents = self.contents.read();
        let titles = contents
            .tiddlers
            .get(bag)
            .ok_or_else(|| WikiError::not_found(EntityKind::Bag, bag))?;
        Ok(titles
            .values()
            .filter_map(|revisions| revisions.last().cloned())
            .collect())
    }

    fn list_tiddler_revisions(&self, bag: &str, title: &str) -> WikiResult<Vec<u64>> {
        let contents = self.contents.read();
        let revisions = contents
            .tiddlers
            .get(bag)
            .and_then(|titles| titles.get(title))
            .ok_or_else(|| WikiError::not_found(EntityKind::Tiddler, tiddler_path(bag, title)))?;
        Ok(revisions
            .iter()
            .rev()
            .map(Tiddler::revision_or_latest)
            .collect())
    }

    fn get_user(&self, usersign: &str) -> WikiResult<User> {
        self.contents
            .read()
            .users
            .get(usersign)
            .cloned()
            .ok_or_else(|| WikiError::not_found(EntityKind::User, usersign))
    }

    fn put_user(&self, user: &User) -> WikiResult<()> {
        self.contents
            .write()
            .users
            .insert(user.usersign.clone(), user.clone());
        Ok(())
    }

    fn delete_user(&self, usersign: &str) -> WikiResult<()> {
        self.contents
            .write()
            .users
            .remove(usersign)
            .map(|_| ())
            .ok_or_else(|| WikiError::not_found(EntityKind::User, usersign))
    }

    fn list_users(&self) -> WikiResult<Vec<User>> {
        Ok(self.contents.read().users.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_bag() -> MemoryStore {
        let store = MemoryStore::new();
        store.put_bag(&Bag::new("alpha")).unwrap();
        store
    }

    #[test]
    fn test_missing_bag() {
        let store = MemoryStore::new();
        let err = store.get_bag("alpha").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "bag alpha not found");
    }

    #[test]
    fn test_put_tiddler_assigns_revisions() {
        let store = store_with_bag();
        let first = store
            .put_tiddler(&Tiddler::new("foo", "alpha").with_text("one"))
            .unwrap();
        let second = store
            .put_tiddler(&Tiddler::new("foo", "alpha").with_text("two"))
            .unwrap();

        assert_eq!(first.revision, Some(1));
        assert_eq!(second.revision, Some(2));
        assert_eq!(second.created, first.created);
        assert_eq!(store.list_tiddler_revisions("alpha", "foo").unwrap(), vec![2, 1]);
    }

    #[test]
    fn test_get_tiddler_by_revision() {
        let store = store_with_bag();
        store
            .put_tiddler(&Tiddler::new("foo", "alpha").with_text("one"))
            .unwrap();
        store
            .put_tiddler(&Tiddler::new("foo", "alpha").with_text("two"))
            .unwrap();

        assert_eq!(store.get_tiddler("alpha", "foo", None).unwrap().text, "two");
        assert_eq!(store.get_tiddler("alpha", "foo", Some(0)).unwrap().text, "two");
        assert_eq!(store.get_tiddler("alpha", "foo", Some(1)).unwrap().text, "one");
        assert!(store.get_tiddler("alpha", "foo", Some(9)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_put_tiddler_requires_bag() {
        let store = MemoryStore::new();
        let err = store.put_tiddler(&Tiddler::new("foo", "nowhere")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_bag_removes_tiddlers() {
        let store = store_with_bag();
        store.put_tiddler(&Tiddler::new("foo", "alpha")).unwrap();
        store.delete_bag("alpha").unwrap();

        assert!(store.get_tiddler("alpha", "foo", None).is_err());
        assert!(store.list_bag_tiddlers("alpha").is_err());
    }

    #[test]
    fn test_list_bag_tiddlers_latest_only() {
        let store = store_with_bag();
        store.put_tiddler(&Tiddler::new("b", "alpha")).unwrap();
        store.put_tiddler(&Tiddler::new("a", "alpha")).unwrap();
        store.put_tiddler(&Tiddler::new("a", "alpha")).unwrap();

        let listed = store.list_bag_tiddlers("alpha").unwrap();
        let summary: Vec<_> = listed
            .iter()
            .map(|t| (t.title.as_str(), t.revision))
            .collect();
        assert_eq!(summary, vec![("a", Some(2)), ("b", Some(1))]);
    }
}
