//! The `json` format.
//!
//! Output is deterministic (struct field order, ordered maps), which the
//! entity fingerprints rely on.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Serialization;
use crate::error::WikiResult;
use crate::policy::Policy;
use crate::{Bag, Recipe, Tiddler};

/// JSON serialization plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerialization;

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct BagFields {
    desc: String,
    policy: Policy,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct RecipeFields {
    desc: String,
    policy: Policy,
    recipe: Vec<(String, String)>,
}

fn tiddler_summary(tiddler: &Tiddler) -> WikiResult<Value> {
    let mut value = serde_json::to_value(tiddler)?;
    if let Value::Object(map) = &mut value {
        map.remove("text");
    }
    Ok(value)
}

impl Serialization for JsonSerialization {
    fn format(&self) -> &'static str {
        "json"
    }

    fn list_bags(&self, bags: &[Bag]) -> WikiResult<String> {
        let names: Vec<&str> = bags.iter().map(|bag| bag.name.as_str()).collect();
        Ok(serde_json::to_string(&names)?)
    }

    fn list_recipes(&self, recipes: &[Recipe]) -> WikiResult<String> {
        let names: Vec<&str> = recipes.iter().map(|recipe| recipe.name.as_str()).collect();
        Ok(serde_json::to_string(&names)?)
    }

    fn list_tiddlers(&self, tiddlers: &[Tiddler]) -> WikiResult<String> {
        let summaries = tiddlers
            .iter()
            .map(tiddler_summary)
            .collect::<WikiResult<Vec<_>>>()?;
        Ok(serde_json::to_string(&summaries)?)
    }

    fn bag_as(&self, bag: &Bag) -> WikiResult<String> {
        Ok(serde_json::to_string(&BagFields {
            desc: bag.desc.clone(),
            policy: bag.policy.clone(),
        })?)
    }

    fn recipe_as(&self, recipe: &Recipe) -> WikiResult<String> {
        Ok(serde_json::to_string(&RecipeFields {
            desc: recipe.desc.clone(),
            policy: recipe.policy.clone(),
            recipe: recipe.recipe.clone(),
        })?)
    }

    fn tiddler_as(&self, tiddler: &Tiddler) -> WikiResult<String> {
        Ok(serde_json::to_string(tiddler)?)
    }

    fn as_bag(&self, name: &str, input: &str) -> WikiResult<Bag> {
        let fields: BagFields = serde_json::from_str(input)?;
        Ok(Bag::new(name)
            .with_desc(fields.desc)
            .with_policy(fields.policy))
    }

    fn as_recipe(&self, name: &str, input: &str) -> WikiResult<Recipe> {
        let fields: RecipeFields = serde_json::from_str(input)?;
        let mut recipe = Recipe::new(name)
            .with_desc(fields.desc)
            .with_policy(fields.policy);
        recipe.recipe = fields.recipe;
        Ok(recipe)
    }

    fn as_tiddler(&self, title: &str, bag: &str, input: &str) -> WikiResult<Tiddler> {
        let mut tiddler: Tiddler = serde_json::from_str(input)?;
        tiddler.title = title.to_string();
        tiddler.bag = Some(bag.to_string());
        tiddler.recipe = None;
        tiddler.revision = None;
        Ok(tiddler)
    }
}
