//! Tiddler filters.
//!
//! A filter string is a sequence of steps separated by `;` or `&`:
//!
//! - `select=field:value` keeps tiddlers whose attribute equals `value`;
//!   `select=field:!value` keeps those where it does not. The `tag` field
//!   matches any of a tiddler's tags.
//! - `sort=field` sorts ascending, `sort=-field` descending.
//! - `limit=N` keeps the first `N` tiddlers.
//!
//! Recipes attach a filter string to each bag; the tiddler listing routes
//! apply the request's query string the same way.

use crate::error::{WikiError, WikiResult};
use crate::tiddler::Tiddler;

/// One parsed filter step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Keep tiddlers whose `field` matches `value` (or does not, if negated).
    Select {
        /// Attribute name.
        field: String,
        /// Value to compare against.
        value: String,
        /// Invert the match.
        negate: bool,
    },
    /// Order by `field`.
    Sort {
        /// Attribute name.
        field: String,
        /// Sort descending.
        descending: bool,
    },
    /// Keep at most `count` tiddlers.
    Limit(usize),
}

impl Filter {
    /// Returns true if `tiddler` passes this step. Sort and limit steps
    /// pass every tiddler.
    #[must_use]
    pub fn matches(&self, tiddler: &Tiddler) -> bool {
        match self {
            Self::Select {
                field,
                value,
                negate,
            } => {
                let hit = if field == "tag" {
                    tiddler.has_tag(value)
                } else {
                    tiddler.attribute(field).as_deref() == Some(value.as_str())
                };
                hit != *negate
            }
            Self::Sort { .. } | Self::Limit(_) => true,
        }
    }
}

/// Parses a filter string. An empty string yields no steps.
pub fn parse_filters(input: &str) -> WikiResult<Vec<Filter>> {
    input
        .split(['&', ';'])
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .map(parse_step)
        .collect()
}

fn parse_step(step: &str) -> WikiResult<Filter> {
    let malformed = || WikiError::invalid(format!("malformed filter: {step}"));
    let (key, argument) = step.split_once('=').ok_or_else(malformed)?;

    match key {
        "select" => {
            let (field, value) = argument.split_once(':').ok_or_else(malformed)?;
            if field.is_empty() {
                return Err(malformed());
            }
            let (value, negate) = match value.strip_prefix('!') {
                Some(rest) => (rest, true),
                None => (value, false),
            };
            Ok(Filter::Select {
                field: field.to_string(),
                value: value.to_string(),
                negate,
            })
        }
        "sort" => {
            let (field, descending) = match argument.strip_prefix('-') {
                Some(rest) => (rest, true),
                None => (argument, false),
            };
            if field.is_empty() {
                return Err(malformed());
            }
            Ok(Filter::Sort {
                field: field.to_string(),
                descending,
            })
        }
        "limit" => argument
            .parse()
            .map(Filter::Limit)
            .map_err(|_| malformed()),
        _ => Err(WikiError::invalid(format!("unknown filter: {key}"))),
    }
}

/// Applies filter steps, in order, to a list of tiddlers.
#[must_use]
pub fn apply_filters(filters: &[Filter], mut tiddlers: Vec<Tiddler>) -> Vec<Tiddler> {
    for filter in filters {
        match filter {
            Filter::Select { .. } => tiddlers.retain(|tiddler| filter.matches(tiddler)),
            Filter::Sort { field, descending } => {
                tiddlers.sort_by_cached_key(|tiddler| tiddler.attribute(field));
                if *descending {
                    tiddlers.reverse();
                }
            }
            Filter::Limit(count) => tiddlers.truncate(*count),
        }
    }
    tiddlers
}

/// Returns true if `tiddler` passes every select step of `filters`.
#[must_use]
pub fn tiddler_matches(filters: &[Filter], tiddler: &Tiddler) -> bool {
    filters.iter().all(|filter| filter.matches(tiddler))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Tiddler> {
        vec![
            Tiddler::new("apple", "alpha").with_tags(["fruit"]),
            Tiddler::new("carrot", "alpha").with_tags(["vegetable"]),
            Tiddler::new("banana", "alpha").with_tags(["fruit", "yellow"]),
        ]
    }

    fn titles(tiddlers: &[Tiddler]) -> Vec<&str> {
        tiddlers.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_filters("").unwrap().is_empty());
        assert!(parse_filters(" ; ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_steps() {
        let filters = parse_filters("select=tag:!fruit;sort=-title&limit=2").unwrap();
        assert_eq!(
            filters,
            vec![
                Filter::Select {
                    field: "tag".into(),
                    value: "fruit".into(),
                    negate: true
                },
                Filter::Sort {
                    field: "title".into(),
                    descending: true
                },
                Filter::Limit(2),
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_filters("select=tag").is_err());
        assert!(parse_filters("limit=many").is_err());
        assert!(parse_filters("bogus=1").is_err());
        assert!(parse_filters("sort=").is_err());
    }

    #[test]
    fn test_select_by_tag() {
        let filters = parse_filters("select=tag:fruit").unwrap();
        let result = apply_filters(&filters, sample());
        assert_eq!(titles(&result), vec!["apple", "banana"]);
    }

    #[test]
    fn test_sort_and_limit() {
        let filters = parse_filters("sort=-title;limit=2").unwrap();
        let result = apply_filters(&filters, sample());
        assert_eq!(titles(&result), vec!["carrot", "banana"]);
    }

    #[test]
    fn test_select_by_field() {
        let filters = parse_filters("select=title:!apple").unwrap();
        let result = apply_filters(&filters, sample());
        assert_eq!(titles(&result), vec!["carrot", "banana"]);
        assert!(tiddler_matches(&filters, &sample()[1]));
        assert!(!tiddler_matches(&filters, &sample()[0]));
    }
}
