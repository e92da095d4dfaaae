//! The `text` format: names one per line, tiddlers as a header block
//! followed by a blank line and the text.

use super::Serialization;
use crate::error::{WikiError, WikiResult};
use crate::policy::Policy;
use crate::tiddler::{string_to_tags, tags_to_string};
use crate::util::encode_name;
use crate::{Bag, Recipe, Tiddler};

/// Plain text serialization plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSerialization;

fn lines<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(|name| format!("{name}\n")).collect()
}

impl Serialization for TextSerialization {
    fn format(&self) -> &'static str {
        "text"
    }

    fn list_bags(&self, bags: &[Bag]) -> WikiResult<String> {
        Ok(lines(bags.iter().map(|bag| bag.name.as_str())))
    }

    fn list_recipes(&self, recipes: &[Recipe]) -> WikiResult<String> {
        Ok(lines(recipes.iter().map(|recipe| recipe.name.as_str())))
    }

    fn list_tiddlers(&self, tiddlers: &[Tiddler]) -> WikiResult<String> {
        Ok(lines(tiddlers.iter().map(|tiddler| tiddler.title.as_str())))
    }

    fn recipe_as(&self, recipe: &Recipe) -> WikiResult<String> {
        let mut out = format!(
            "desc: {}\npolicy: {}\n\n",
            recipe.desc,
            serde_json::to_string(&recipe.policy)?
        );
        for (bag, filter) in &recipe.recipe {
            out.push_str("/bags/");
            out.push_str(&encode_name(bag));
            out.push_str("/tiddlers");
            if !filter.is_empty() {
                out.push('?');
                out.push_str(filter);
            }
            out.push('\n');
        }
        Ok(out)
    }

    fn tiddler_as(&self, tiddler: &Tiddler) -> WikiResult<String> {
        let mut out = String::new();
        let mut header = |key: &str, value: &str| {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        };

        header("title", &tiddler.title);
        header("creator", tiddler.creator.as_deref().unwrap_or_default());
        header("modifier", tiddler.modifier.as_deref().unwrap_or_default());
        header("created", &tiddler.created);
        header("modified", &tiddler.modified);
        header("tags", &tags_to_string(&tiddler.tags));
        if let Some(content_type) = &tiddler.content_type {
            header("type", content_type);
        }
        for (key, value) in &tiddler.fields {
            header(key, value);
        }

        out.push('\n');
        out.push_str(&tiddler.text);
        Ok(out)
    }

    fn as_recipe(&self, name: &str, input: &str) -> WikiResult<Recipe> {
        let (head, body) = split_headers(input);
        let mut recipe = Recipe::new(name);

        for (key, value) in head {
            match key {
                "desc" => recipe.desc = value.to_string(),
                "policy" => recipe.policy = serde_json::from_str::<Policy>(value)?,
                _ => {}
            }
        }

        for line in body.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let (path, filter) = line.split_once('?').unwrap_or((line, ""));
            let bag = path
                .strip_prefix("/bags/")
                .and_then(|rest| rest.strip_suffix("/tiddlers"))
                .ok_or_else(|| WikiError::invalid(format!("malformed recipe line: {line}")))?;
            let bag = urlencoding::decode(bag)
                .map_err(|_| WikiError::invalid(format!("malformed recipe line: {line}")))?;
            recipe.recipe.push((bag.into_owned(), filter.to_string()));
        }

        Ok(recipe)
    }

    fn as_tiddler(&self, title: &str, bag: &str, input: &str) -> WikiResult<Tiddler> {
        let (head, body) = split_headers(input);
        let mut tiddler = Tiddler::new(title, bag).with_text(body);

        for (key, value) in head {
            match key {
                "title" => {}
                "creator" => tiddler.creator = Some(value.to_string()),
                "modifier" => tiddler.modifier = Some(value.to_string()),
                "created" => tiddler.created = value.to_string(),
                "modified" => tiddler.modified = value.to_string(),
                "tags" => tiddler.tags = string_to_tags(value),
                "type" => tiddler.content_type = Some(value.to_string()),
                other => {
                    tiddler.fields.insert(other.to_string(), value.to_string());
                }
            }
        }

        Ok(tiddler)
    }
}

/// Splits `key: value` header lines from the body at the first blank line.
fn split_headers(input: &str) -> (Vec<(&str, &str)>, &str) {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let (head, body) = input
        .split_once("\n\n")
        .or_else(|| input.split_once("\r\n\r\n"))
        .unwrap_or((input, ""));

    let headers = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect();
    (headers, body)
}
