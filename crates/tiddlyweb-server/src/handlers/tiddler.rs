//! Tiddler routes, reached through a bag or through a recipe.
//!
//! Through a recipe, reads go to the bag that currently provides the title
//! and writes go to the last bag whose filter admits the incoming tiddler.
//! Single tiddlers carry both validators: the entity tag is checked first,
//! then `If-Modified-Since` against the tiddler's `modified` time, but only
//! when the client offered no entity tag.

use http::header::{ETAG, LAST_MODIFIED};
use http::StatusCode;
use tracing::info;

use tiddlyweb_core::control::{determine_bag_for_tiddler, determine_bag_from_recipe};
use tiddlyweb_core::serializer::SerializerEntry;
use tiddlyweb_core::tiddler::current_timestring;
use tiddlyweb_core::{Constraint, Tiddler};
use tiddlyweb_middleware::authz::{check_bag_constraint, check_recipe_constraint};
use tiddlyweb_middleware::cache::{
    check_incoming_etag, check_last_modified, http_date_from_timestamp,
};
use tiddlyweb_middleware::negotiate::require_serialize_type;
use tiddlyweb_middleware::tagging::{tiddler_etag, tiddler_url, Container};
use tiddlyweb_middleware::types::Outcome;
use tiddlyweb_middleware::util::{get_route_value, handle_extension};
use tiddlyweb_middleware::{HttpError, Reply, Request, RequestContext};

use super::{read_entity_body, send_entity, send_listing, serializer_for};

const RECIPE_PARAM: &str = "recipe_name";

/// Where a read resolved to: the owning bag, and the recipe if the route
/// went through one.
struct Located {
    bag: String,
    recipe: Option<String>,
}

impl Located {
    fn container(&self) -> Container {
        if self.recipe.is_some() {
            Container::Recipes
        } else {
            Container::Bags
        }
    }

    fn stamp(&self, tiddler: &mut Tiddler) {
        tiddler.recipe.clone_from(&self.recipe);
    }
}

fn through_recipe(ctx: &RequestContext) -> bool {
    ctx.route_params.contains_key(RECIPE_PARAM)
}

/// Resolves the bag holding `title` and checks the caller may read it.
fn locate_for_read(ctx: &RequestContext, title: &str) -> Result<Located, HttpError> {
    let located = if through_recipe(ctx) {
        let recipe_name = get_route_value(ctx, RECIPE_PARAM)?;
        check_recipe_constraint(ctx, &recipe_name, Constraint::Read)?;
        let store = ctx.store()?;
        let recipe = store.get_recipe(&recipe_name)?;
        let bag = determine_bag_from_recipe(store, &recipe, ctx.identity(), title)?;
        Located {
            bag,
            recipe: Some(recipe_name),
        }
    } else {
        Located {
            bag: get_route_value(ctx, "bag_name")?,
            recipe: None,
        }
    };

    check_bag_constraint(ctx, &located.bag, Constraint::Read)?;
    Ok(located)
}

fn send_tiddler(ctx: &RequestContext, entry: &SerializerEntry, tiddler: &Tiddler) -> Outcome {
    let etag = tiddler_etag(ctx, tiddler)?;
    let last_modified = http_date_from_timestamp(&tiddler.modified);
    if check_incoming_etag(ctx, &etag, None, Some(&last_modified), None)?.is_none() {
        check_last_modified(ctx, &last_modified, Some(&etag), None, None)?;
    }

    let body = serializer_for(ctx, entry)?.tiddler_as(tiddler)?;
    Ok(send_entity(entry, body, etag, &tiddler.title).with_header(LAST_MODIFIED, last_modified))
}

/// `GET .../tiddlers/{tiddler_name}`: the latest revision.
pub fn get_tiddler(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let raw = get_route_value(ctx, "tiddler_name")?;
    let title = handle_extension(ctx, &raw);
    let entry = require_serialize_type(ctx, false)?;

    let located = locate_for_read(ctx, &title)?;
    let mut tiddler = ctx.store()?.get_tiddler(&located.bag, &title, None)?;
    located.stamp(&mut tiddler);
    send_tiddler(ctx, &entry, &tiddler)
}

/// `GET .../tiddlers/{tiddler_name}/revisions/{revision}`
pub fn get_revision(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let title = get_route_value(ctx, "tiddler_name")?;
    let raw = get_route_value(ctx, "revision")?;
    let revision = handle_extension(ctx, &raw);
    let revision: u64 = revision
        .parse()
        .map_err(|_| HttpError::bad_request(format!("revision must be a number: {revision}")))?;
    let entry = require_serialize_type(ctx, false)?;

    let located = locate_for_read(ctx, &title)?;
    let mut tiddler = ctx.store()?.get_tiddler(&located.bag, &title, Some(revision))?;
    located.stamp(&mut tiddler);
    send_tiddler(ctx, &entry, &tiddler)
}

/// `GET .../tiddlers/{tiddler_name}/revisions`: every revision, newest
/// first.
pub fn list_revisions(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let title = get_route_value(ctx, "tiddler_name")?;
    let entry = require_serialize_type(ctx, true)?;

    let located = locate_for_read(ctx, &title)?;
    let store = ctx.store()?;
    let revisions = store
        .list_tiddler_revisions(&located.bag, &title)?
        .into_iter()
        .map(|revision| {
            store.get_tiddler(&located.bag, &title, Some(revision)).map(|mut tiddler| {
                located.stamp(&mut tiddler);
                tiddler
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let body = serializer_for(ctx, &entry)?.list_tiddlers(&revisions)?;
    send_listing(ctx, &entry, body, &format!("Revisions of {title}"))
}

/// `PUT .../tiddlers/{tiddler_name}`: stores a new revision.
///
/// Overwriting an existing tiddler needs `write` on its bag, a new one
/// needs `create`. Through a recipe, a tiddler no bag filter admits is a
/// conflict.
pub fn put_tiddler(ctx: &mut RequestContext, request: &Request) -> Outcome {
    let raw = get_route_value(ctx, "tiddler_name")?;
    let title = handle_extension(ctx, &raw);
    let (serializer, body) = read_entity_body(ctx, request)?;
    let store = ctx.store()?;

    let (mut tiddler, located) = if through_recipe(ctx) {
        let recipe_name = get_route_value(ctx, RECIPE_PARAM)?;
        check_recipe_constraint(ctx, &recipe_name, Constraint::Read)?;
        let recipe = store.get_recipe(&recipe_name)?;

        let mut tiddler = serializer.as_tiddler(&title, "", &body)?;
        let bag = determine_bag_for_tiddler(&recipe, ctx.identity(), &tiddler).map_err(|err| {
            if err.is_not_found() {
                HttpError::Conflict(format!("no bag in recipe {recipe_name} accepts {title}"))
            } else {
                err.into()
            }
        })?;
        tiddler.bag = Some(bag.clone());
        (
            tiddler,
            Located {
                bag,
                recipe: Some(recipe_name),
            },
        )
    } else {
        let bag = get_route_value(ctx, "bag_name")?;
        let tiddler = serializer.as_tiddler(&title, &bag, &body)?;
        (tiddler, Located { bag, recipe: None })
    };

    let constraint = match store.get_tiddler(&located.bag, &title, None) {
        Ok(_) => Constraint::Write,
        Err(err) if err.is_not_found() => Constraint::Create,
        Err(err) => return Err(err.into()),
    };
    check_bag_constraint(ctx, &located.bag, constraint)?;

    tiddler.modifier = Some(ctx.identity().log_id().to_string());
    tiddler.modified = current_timestring();
    let mut stored = store.put_tiddler(&tiddler)?;
    located.stamp(&mut stored);
    info!(
        bag = %located.bag,
        title = %stored.title,
        revision = stored.revision_or_latest(),
        user = ctx.identity().log_id(),
        "Tiddler stored"
    );

    let etag = tiddler_etag(ctx, &stored)?;
    let location = tiddler_url(ctx.config(), &stored, located.container(), true);
    Ok(Reply::no_content(&location).with_header(ETAG, etag))
}

/// `DELETE /bags/{bag_name}/tiddlers/{tiddler_name}`: removes the tiddler
/// and all its revisions.
pub fn delete_tiddler(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let raw = get_route_value(ctx, "tiddler_name")?;
    let title = handle_extension(ctx, &raw);
    let bag = get_route_value(ctx, "bag_name")?;
    check_bag_constraint(ctx, &bag, Constraint::Delete)?;

    ctx.store()?.delete_tiddler(&bag, &title)?;
    info!(bag = %bag, title = %title, user = ctx.identity().log_id(), "Tiddler deleted");
    Ok(Reply::new(StatusCode::NO_CONTENT))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{basic, get, send, server};
    use http::header::{ACCEPT, CONTENT_TYPE, IF_MODIFIED_SINCE, IF_NONE_MATCH};
    use http::{HeaderName, StatusCode};

    fn json() -> (HeaderName, String) {
        (ACCEPT, "application/json".to_string())
    }

    fn json_body() -> (HeaderName, String) {
        (CONTENT_TYPE, "application/json".to_string())
    }

    #[test]
    fn test_get_tiddler_validators() {
        let sent = get(&server(), "/bags/alpha/tiddlers/foo", &[json()]);

        assert_eq!(sent.status, StatusCode::OK);
        assert!(sent.header("etag").unwrap().starts_with("\"alpha/foo/2:"));
        assert_eq!(sent.header("last-modified"), Some("Mon, 01 Jan 2024 12:00:00 GMT"));
        assert_eq!(sent.header("cache-control"), Some("no-cache"));
        assert_eq!(sent.header("vary"), Some("Accept"));

        let tiddler: serde_json::Value = serde_json::from_str(&sent.body).unwrap();
        assert_eq!(tiddler["text"], "Hello from foo");
        assert_eq!(tiddler["revision"], 2);
    }

    #[test]
    fn test_if_modified_since() {
        let server = server();
        let fresh = get(
            &server,
            "/bags/alpha/tiddlers/foo.json",
            &[(IF_MODIFIED_SINCE, "Tue, 02 Jan 2024 00:00:00 GMT".to_string())],
        );
        assert_eq!(fresh.status, StatusCode::NOT_MODIFIED);
        assert_eq!(fresh.header("last-modified"), Some("Mon, 01 Jan 2024 12:00:00 GMT"));

        let stale = get(
            &server,
            "/bags/alpha/tiddlers/foo.json",
            &[(IF_MODIFIED_SINCE, "Sun, 31 Dec 2023 00:00:00 GMT".to_string())],
        );
        assert_eq!(stale.status, StatusCode::OK);
    }

    #[test]
    fn test_stale_etag_gets_content() {
        let sent = get(
            &server(),
            "/bags/alpha/tiddlers/foo.json",
            &[(IF_NONE_MATCH, "\"alpha/foo/1:nope\"".to_string())],
        );
        assert_eq!(sent.status, StatusCode::OK);
    }

    #[test]
    fn test_stale_etag_overrides_if_modified_since() {
        let sent = get(
            &server(),
            "/bags/alpha/tiddlers/foo.json",
            &[
                (IF_NONE_MATCH, "\"alpha/foo/1:stale\"".to_string()),
                (IF_MODIFIED_SINCE, "Tue, 02 Jan 2024 00:00:00 GMT".to_string()),
            ],
        );
        assert_eq!(sent.status, StatusCode::OK);
        assert!(!sent.body.is_empty());
    }

    #[test]
    fn test_missing_tiddler() {
        assert_eq!(
            get(&server(), "/bags/alpha/tiddlers/nothing.json", &[]).status,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_unknown_extension_is_part_of_title() {
        let server = server();
        let put = send(
            &server,
            "PUT",
            "/bags/alpha/tiddlers/notes.bag",
            &[json_body()],
            r#"{"text": "dotted"}"#,
        );
        assert_eq!(put.status, StatusCode::NO_CONTENT);

        let sent = get(&server, "/bags/alpha/tiddlers/notes.bag", &[json()]);
        assert_eq!(sent.status, StatusCode::OK);
        let tiddler: serde_json::Value = serde_json::from_str(&sent.body).unwrap();
        assert_eq!(tiddler["title"], "notes.bag");
    }

    #[test]
    fn test_revisions() {
        let server = server();

        let listing = get(&server, "/bags/alpha/tiddlers/foo/revisions.json", &[]);
        assert_eq!(listing.status, StatusCode::OK);
        let revisions: Vec<serde_json::Value> = serde_json::from_str(&listing.body).unwrap();
        let numbers: Vec<_> = revisions.iter().map(|r| r["revision"].as_u64()).collect();
        assert_eq!(numbers, vec![Some(2), Some(1)]);

        let first = get(&server, "/bags/alpha/tiddlers/foo/revisions/1.json", &[]);
        assert_eq!(first.status, StatusCode::OK);
        let tiddler: serde_json::Value = serde_json::from_str(&first.body).unwrap();
        assert_eq!(tiddler["text"], "first draft");

        let bad = get(&server, "/bags/alpha/tiddlers/foo/revisions/first", &[json()]);
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let missing = get(&server, "/bags/alpha/tiddlers/foo/revisions/9", &[json()]);
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_put_creates_new_revision() {
        let server = server();
        let put = send(
            &server,
            "PUT",
            "/bags/alpha/tiddlers/foo",
            &[json_body(), basic("bob", "bobpass")],
            r#"{"text": "third", "tags": ["greeting"]}"#,
        );

        assert_eq!(put.status, StatusCode::NO_CONTENT);
        assert_eq!(
            put.header("location"),
            Some("http://0.0.0.0:8080/bags/alpha/tiddlers/foo")
        );
        assert!(put.header("etag").unwrap().starts_with("\"alpha/foo/3:"));

        let sent = get(&server, "/bags/alpha/tiddlers/foo.json", &[]);
        let tiddler: serde_json::Value = serde_json::from_str(&sent.body).unwrap();
        assert_eq!(tiddler["text"], "third");
        assert_eq!(tiddler["modifier"], "bob");
        assert_eq!(tiddler["creator"], "fixture");
        assert_eq!(sent.header("etag"), put.header("etag"));
    }

    #[test]
    fn test_put_into_protected_bag() {
        let server = server();
        let body = r#"{"text": "hi"}"#;

        let anonymous = send(&server, "PUT", "/bags/private/tiddlers/secret", &[json_body()], body);
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

        let bob = send(
            &server,
            "PUT",
            "/bags/private/tiddlers/secret",
            &[json_body(), basic("bob", "bobpass")],
            body,
        );
        assert_eq!(bob.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_put_to_missing_bag() {
        let sent = send(
            &server(),
            "PUT",
            "/bags/nowhere/tiddlers/foo",
            &[json_body()],
            r#"{"text": "hi"}"#,
        );
        assert_eq!(sent.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_recipe_read_and_write() {
        let server = server();
        let alice = basic("alice", "alicepass");

        let secret = get(&server, "/recipes/site/tiddlers/secret.json", &[alice.clone()]);
        assert_eq!(secret.status, StatusCode::OK);
        let tiddler: serde_json::Value = serde_json::from_str(&secret.body).unwrap();
        assert_eq!(tiddler["bag"], "private");
        assert_eq!(tiddler["recipe"], "site");

        let anonymous = get(&server, "/recipes/site/tiddlers/secret.json", &[]);
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

        let put = send(
            &server,
            "PUT",
            "/recipes/site/tiddlers/fresh",
            &[json_body(), alice],
            r#"{"text": "via recipe"}"#,
        );
        assert_eq!(put.status, StatusCode::NO_CONTENT);
        assert_eq!(
            put.header("location"),
            Some("http://0.0.0.0:8080/recipes/site/tiddlers/fresh")
        );
        let stored = get(
            &server,
            "/bags/private/tiddlers/fresh.txt",
            &[basic("alice", "alicepass")],
        );
        assert_eq!(stored.status, StatusCode::OK);
    }

    #[test]
    fn test_delete_tiddler() {
        let server = server();
        let deleted = send(&server, "DELETE", "/bags/alpha/tiddlers/bar", &[], "");
        assert_eq!(deleted.status, StatusCode::NO_CONTENT);
        assert_eq!(
            get(&server, "/bags/alpha/tiddlers/bar.json", &[]).status,
            StatusCode::NOT_FOUND
        );

        let bob = send(&server, "DELETE", "/bags/users/tiddlers/x", &[basic("bob", "bobpass")], "");
        assert_eq!(bob.status, StatusCode::FORBIDDEN);
    }
}
