//! The `html` format.
//!
//! Produces page fragments: listings as link lists and tiddlers as a
//! metadata block plus the escaped text in a `<pre>`. Markup is never
//! rendered. The `html_presenter` response stage wraps fragments with
//! [`page_header`] and [`page_footer`].

use std::fmt::Write as _;

use super::Serialization;
use crate::error::WikiResult;
use crate::tiddler::tags_to_string;
use crate::util::{encode_name, escape_attribute_value, html_encode};
use crate::{Bag, Recipe, Tiddler};

/// HTML serialization plugin. Links are prefix-relative.
#[derive(Debug, Clone, Default)]
pub struct HtmlSerialization {
    server_prefix: String,
}

impl HtmlSerialization {
    /// Creates the plugin for a server mounted at `server_prefix`.
    #[must_use]
    pub fn new(server_prefix: impl Into<String>) -> Self {
        Self {
            server_prefix: server_prefix.into(),
        }
    }

    fn link(&self, path: &str, label: &str) -> String {
        format!(
            "<li><a href=\"{}{}\">{}</a></li>\n",
            escape_attribute_value(&self.server_prefix),
            path,
            html_encode(label)
        )
    }

    fn listing(&self, id: &str, items: impl Iterator<Item = String>) -> String {
        let mut out = format!("<ul id=\"{id}\" class=\"listing\">\n");
        out.extend(items);
        out.push_str("</ul>\n");
        out
    }

    fn tiddler_path(&self, tiddler: &Tiddler) -> String {
        let container = match (&tiddler.recipe, &tiddler.bag) {
            (Some(recipe), _) => format!("/recipes/{}", encode_name(recipe)),
            (None, Some(bag)) => format!("/bags/{}", encode_name(bag)),
            (None, None) => String::new(),
        };
        format!("{container}/tiddlers/{}", encode_name(&tiddler.title))
    }
}

/// Returns the opening of an HTML page.
#[must_use]
pub fn page_header(title: &str, css_uri: &str) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n",
    );
    let _ = writeln!(out, "<title>TiddlyWeb - {}</title>", html_encode(title));
    if !css_uri.is_empty() {
        let _ = writeln!(
            out,
            "<link rel=\"stylesheet\" href=\"{}\" type=\"text/css\">",
            escape_attribute_value(css_uri)
        );
    }
    out.push_str("</head>\n<body>\n<div id=\"header\">\n");
    let _ = writeln!(out, "<h1>{}</h1>", html_encode(title));
    out.push_str("</div>\n<div id=\"content\">\n");
    out
}

/// Returns the closing of an HTML page.
#[must_use]
pub fn page_footer() -> String {
    concat!(
        "</div>\n<div id=\"footer\">\n",
        "<div id=\"badge\">This is <a href=\"http://tiddlyweb.com/\">TiddlyWeb</a></div>\n",
        "</div>\n</body>\n</html>\n",
    )
    .to_string()
}

impl Serialization for HtmlSerialization {
    fn format(&self) -> &'static str {
        "html"
    }

    fn list_bags(&self, bags: &[Bag]) -> WikiResult<String> {
        Ok(self.listing(
            "bags",
            bags.iter().map(|bag| {
                self.link(&format!("/bags/{}/tiddlers", encode_name(&bag.name)), &bag.name)
            }),
        ))
    }

    fn list_recipes(&self, recipes: &[Recipe]) -> WikiResult<String> {
        Ok(self.listing(
            "recipes",
            recipes.iter().map(|recipe| {
                self.link(
                    &format!("/recipes/{}/tiddlers", encode_name(&recipe.name)),
                    &recipe.name,
                )
            }),
        ))
    }

    fn list_tiddlers(&self, tiddlers: &[Tiddler]) -> WikiResult<String> {
        Ok(self.listing(
            "tiddlers",
            tiddlers.iter().map(|tiddler| {
                let label = match tiddler.revision {
                    Some(revision) if revision > 0 => format!("{}:{revision}", tiddler.title),
                    _ => tiddler.title.clone(),
                };
                self.link(&self.tiddler_path(tiddler), &label)
            }),
        ))
    }

    fn bag_as(&self, bag: &Bag) -> WikiResult<String> {
        let mut out = format!(
            "<div id=\"bagdesc\" class=\"description\">{}</div>\n",
            html_encode(&bag.desc)
        );
        out.push_str(&self.listing(
            "bag",
            std::iter::once(self.link(
                &format!("/bags/{}/tiddlers", encode_name(&bag.name)),
                "Tiddlers in Bag",
            )),
        ));
        Ok(out)
    }

    fn recipe_as(&self, recipe: &Recipe) -> WikiResult<String> {
        let mut out = format!(
            "<div id=\"recipedesc\" class=\"description\">{}</div>\n",
            html_encode(&recipe.desc)
        );
        out.push_str(&self.listing(
            "recipe",
            recipe.recipe.iter().map(|(bag, filter)| {
                let label = if filter.is_empty() {
                    bag.clone()
                } else {
                    format!("{bag}?{filter}")
                };
                self.link(&format!("/bags/{}/tiddlers", encode_name(bag)), &label)
            }),
        ));
        let _ = writeln!(
            out,
            "<div class=\"tiddlerslink\">\
             <a href=\"{}/recipes/{}/tiddlers\">Tiddlers in Recipe</a></div>",
            escape_attribute_value(&self.server_prefix),
            encode_name(&recipe.name)
        );
        Ok(out)
    }

    fn tiddler_as(&self, tiddler: &Tiddler) -> WikiResult<String> {
        let mut out = format!(
            "<div class=\"tiddler\" title=\"{}\">\n<dl class=\"meta\">\n",
            escape_attribute_value(&tiddler.title)
        );
        let mut meta = |key: &str, value: &str| {
            let _ = writeln!(out, "<dt>{key}</dt><dd>{}</dd>", html_encode(value));
        };

        if let Some(bag) = &tiddler.bag {
            meta("bag", bag);
        }
        meta("revision", &tiddler.revision_or_latest().to_string());
        meta("modifier", tiddler.modifier.as_deref().unwrap_or_default());
        meta("modified", &tiddler.modified);
        meta("tags", &tags_to_string(&tiddler.tags));
        for (key, value) in &tiddler.fields {
            meta(key, value);
        }

        out.push_str("</dl>\n<pre>");
        out.push_str(&html_encode(&tiddler.text));
        out.push_str("</pre>\n</div>\n");
        Ok(out)
    }
}
