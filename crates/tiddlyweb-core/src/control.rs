//! Recipe resolution.
//!
//! A recipe presents a merged view of its bags: for each title, the tiddler
//! from the last bag (in recipe order) whose filter admits it wins.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{EntityKind, WikiError, WikiResult};
use crate::filter::{apply_filters, parse_filters, tiddler_matches};
use crate::identity::{CallerIdentity, GUEST_NAME};
use crate::{Recipe, Store, Tiddler};

const USER_TEMPLATE: &str = "{{ user }}";

/// Returns the recipe's `(bag, filter)` pairs with `{{ user }}` replaced by
/// the caller's name.
#[must_use]
pub fn recipe_template(recipe: &Recipe, identity: &CallerIdentity) -> Vec<(String, String)> {
    let user = identity.name().unwrap_or(GUEST_NAME);
    recipe
        .recipe
        .iter()
        .map(|(bag, filter)| {
            (
                bag.replace(USER_TEMPLATE, user),
                filter.replace(USER_TEMPLATE, user),
            )
        })
        .collect()
}

/// Returns the merged tiddlers of a recipe, ordered by title.
///
/// Each returned tiddler keeps its owning bag and records the recipe it was
/// resolved through.
pub fn get_tiddlers_from_recipe(
    store: &dyn Store,
    recipe: &Recipe,
    identity: &CallerIdentity,
) -> WikiResult<Vec<Tiddler>> {
    let mut merged: BTreeMap<String, Tiddler> = BTreeMap::new();

    for (bag, filter) in recipe_template(recipe, identity) {
        let filters = parse_filters(&filter)?;
        let tiddlers = apply_filters(&filters, store.list_bag_tiddlers(&bag)?);
        debug!(recipe = %recipe.name, bag = %bag, count = tiddlers.len(), "Merged recipe bag");
        for mut tiddler in tiddlers {
            tiddler.recipe = Some(recipe.name.clone());
            merged.insert(tiddler.title.clone(), tiddler);
        }
    }

    Ok(merged.into_values().collect())
}

/// Finds the bag that currently provides `title` through `recipe`.
///
/// Bags are searched from last to first; the first bag holding a tiddler
/// with that title that passes the bag's filter wins.
pub fn determine_bag_from_recipe(
    store: &dyn Store,
    recipe: &Recipe,
    identity: &CallerIdentity,
    title: &str,
) -> WikiResult<String> {
    for (bag, filter) in recipe_template(recipe, identity).into_iter().rev() {
        let filters = parse_filters(&filter)?;
        match store.get_tiddler(&bag, title, None) {
            Ok(tiddler) if tiddler_matches(&filters, &tiddler) => return Ok(bag),
            Ok(_) => {}
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }
    }

    Err(WikiError::not_found(
        EntityKind::Tiddler,
        format!("{title} in recipe {}", recipe.name),
    ))
}

/// Finds the bag an incoming tiddler should be written to through
/// `recipe`: the last bag whose filter admits it.
pub fn determine_bag_for_tiddler(
    recipe: &Recipe,
    identity: &CallerIdentity,
    tiddler: &Tiddler,
) -> WikiResult<String> {
    for (bag, filter) in recipe_template(recipe, identity).into_iter().rev() {
        if tiddler_matches(&parse_filters(&filter)?, tiddler) {
            return Ok(bag);
        }
    }

    Err(WikiError::not_found(
        EntityKind::Bag,
        format!("for {} in recipe {}", tiddler.title, recipe.name),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bag, MemoryStore};

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.put_bag(&Bag::new("system")).unwrap();
        store.put_bag(&Bag::new("content")).unwrap();
        store
            .put_tiddler(&Tiddler::new("shared", "system").with_text("system copy"))
            .unwrap();
        store
            .put_tiddler(&Tiddler::new("shared", "content").with_text("content copy"))
            .unwrap();
        store
            .put_tiddler(&Tiddler::new("only-system", "system"))
            .unwrap();
        store
    }

    fn recipe() -> Recipe {
        Recipe::new("site")
            .with_bag("system", "")
            .with_bag("content", "")
    }

    #[test]
    fn test_later_bags_win() {
        let store = store();
        let tiddlers =
            get_tiddlers_from_recipe(&store, &recipe(), &CallerIdentity::anonymous()).unwrap();

        assert_eq!(tiddlers.len(), 2);
        let shared = tiddlers.iter().find(|t| t.title == "shared").unwrap();
        assert_eq!(shared.bag.as_deref(), Some("content"));
        assert_eq!(shared.recipe.as_deref(), Some("site"));
    }

    #[test]
    fn test_determine_bag_from_recipe() {
        let store = store();
        let anon = CallerIdentity::anonymous();

        assert_eq!(
            determine_bag_from_recipe(&store, &recipe(), &anon, "shared").unwrap(),
            "content"
        );
        assert_eq!(
            determine_bag_from_recipe(&store, &recipe(), &anon, "only-system").unwrap(),
            "system"
        );
        assert!(determine_bag_from_recipe(&store, &recipe(), &anon, "nothing")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_determine_bag_for_tiddler_respects_filters() {
        let recipe = Recipe::new("site")
            .with_bag("system", "")
            .with_bag("content", "select=tag:!systemConfig");
        let anon = CallerIdentity::anonymous();

        let plain = Tiddler::new("note", "");
        let config = Tiddler::new("plugin", "").with_tags(["systemConfig"]);

        assert_eq!(determine_bag_for_tiddler(&recipe, &anon, &plain).unwrap(), "content");
        assert_eq!(determine_bag_for_tiddler(&recipe, &anon, &config).unwrap(), "system");
    }

    #[test]
    fn test_user_template() {
        let recipe = Recipe::new("mine").with_bag("{{ user }}_private", "");
        let alice = CallerIdentity::user("alice", Vec::<String>::new());

        let resolved = recipe_template(&recipe, &alice);
        assert_eq!(resolved, vec![("alice_private".to_string(), String::new())]);
    }
}
