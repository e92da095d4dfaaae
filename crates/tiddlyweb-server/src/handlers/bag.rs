//! Bag routes: listing, retrieval, creation, deletion, and the tiddlers a
//! bag holds.

use http::header::ETAG;
use http::StatusCode;
use tracing::info;

use tiddlyweb_core::filter::apply_filters;
use tiddlyweb_core::{check, Bag, Constraint};
use tiddlyweb_middleware::authz::{check_bag_constraint, check_bag_create};
use tiddlyweb_middleware::cache::check_incoming_etag;
use tiddlyweb_middleware::negotiate::require_serialize_type;
use tiddlyweb_middleware::tagging::{bag_etag, bag_url};
use tiddlyweb_middleware::types::Outcome;
use tiddlyweb_middleware::util::{get_route_value, handle_extension};
use tiddlyweb_middleware::{HttpError, Reply, Request, RequestContext};

use super::{query_filters, read_entity_body, send_entity, send_listing, serializer_for};

fn bag_name(ctx: &mut RequestContext) -> Result<String, HttpError> {
    let raw = get_route_value(ctx, "bag_name")?;
    Ok(handle_extension(ctx, &raw))
}

/// `GET /bags`: the bags the caller may read.
pub fn list_bags(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let entry = require_serialize_type(ctx, true)?;
    let mut bags: Vec<Bag> = ctx
        .store()?
        .list_bags()?
        .into_iter()
        .filter(|bag| check(ctx.identity(), bag, Constraint::Read).is_ok())
        .collect();
    bags.sort_by(|a, b| a.name.cmp(&b.name));

    let body = serializer_for(ctx, &entry)?.list_bags(&bags)?;
    send_listing(ctx, &entry, body, "Bags")
}

/// `GET /bags/{bag_name}`: the bag itself, which carries its policy, so
/// reading it takes `manage`.
pub fn get_bag(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let name = bag_name(ctx)?;
    let entry = require_serialize_type(ctx, false)?;
    check_bag_constraint(ctx, &name, Constraint::Manage)?;

    let bag = ctx.store()?.get_bag(&name)?;
    let etag = bag_etag(ctx, &bag)?;
    check_incoming_etag(ctx, &etag, None, None, None)?;

    let body = serializer_for(ctx, &entry)?.bag_as(&bag)?;
    Ok(send_entity(&entry, body, etag, &format!("Bag {name}")))
}

/// `PUT /bags/{bag_name}`: creates or replaces a bag.
///
/// Replacing needs `manage` on the stored bag; creating is governed by
/// `bag_create_policy`.
pub fn put_bag(ctx: &mut RequestContext, request: &Request) -> Outcome {
    let name = bag_name(ctx)?;
    let store = ctx.store()?;

    match store.get_bag(&name) {
        Ok(existing) => {
            check(ctx.identity(), &existing, Constraint::Manage).map_err(|denial| {
                HttpError::AccessDenied(denial.with_context(format!("for bag {name}")))
            })?;
        }
        Err(err) if err.is_not_found() => check_bag_create(ctx)?,
        Err(err) => return Err(err.into()),
    }

    let (serializer, body) = read_entity_body(ctx, request)?;
    let bag = serializer.as_bag(&name, &body)?;
    store.put_bag(&bag)?;
    info!(bag = %bag.name, user = ctx.identity().log_id(), "Bag stored");

    let etag = bag_etag(ctx, &bag)?;
    Ok(Reply::no_content(&bag_url(ctx.config(), &bag, true)).with_header(ETAG, etag))
}

/// `DELETE /bags/{bag_name}`: removes the bag and every tiddler in it.
pub fn delete_bag(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let name = bag_name(ctx)?;
    check_bag_constraint(ctx, &name, Constraint::Manage)?;

    ctx.store()?.delete_bag(&name)?;
    info!(bag = %name, user = ctx.identity().log_id(), "Bag deleted");
    Ok(Reply::new(StatusCode::NO_CONTENT))
}

/// `GET /bags/{bag_name}/tiddlers`: the latest revision of each tiddler,
/// narrowed by `select`, `sort` and `limit` query parameters.
pub fn list_bag_tiddlers(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let name = get_route_value(ctx, "bag_name")?;
    let entry = require_serialize_type(ctx, true)?;
    check_bag_constraint(ctx, &name, Constraint::Read)?;

    let filters = query_filters(ctx)?;
    let tiddlers = apply_filters(&filters, ctx.store()?.list_bag_tiddlers(&name)?);
    let body = serializer_for(ctx, &entry)?.list_tiddlers(&tiddlers)?;
    send_listing(ctx, &entry, body, &format!("Tiddlers in bag {name}"))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{basic, get, send, server};
    use http::header::{CONTENT_TYPE, IF_NONE_MATCH};
    use http::StatusCode;

    fn json() -> (http::HeaderName, String) {
        (http::header::ACCEPT, "application/json".to_string())
    }

    #[test]
    fn test_list_bags_hides_unreadable() {
        let server = server();

        let anonymous = get(&server, "/bags.txt", &[]);
        assert_eq!(anonymous.status, StatusCode::OK);
        assert_eq!(anonymous.body.lines().collect::<Vec<_>>(), vec!["alpha", "users"]);

        let admin = get(&server, "/bags.txt", &[basic("alice", "alicepass")]);
        assert_eq!(admin.body.lines().collect::<Vec<_>>(), vec!["alpha", "private", "users"]);
    }

    #[test]
    fn test_listing_etag_revalidates() {
        let server = server();
        let first = get(&server, "/bags", &[json()]);
        let etag = first.header("etag").unwrap().to_string();

        let again = get(&server, "/bags", &[json(), (IF_NONE_MATCH, etag.clone())]);
        assert_eq!(again.status, StatusCode::NOT_MODIFIED);
        assert!(again.body.is_empty());

        let other_format = get(&server, "/bags.txt", &[(IF_NONE_MATCH, etag)]);
        assert_eq!(other_format.status, StatusCode::OK);
    }

    #[test]
    fn test_get_bag_json() {
        let sent = get(&server(), "/bags/alpha.json", &[]);

        assert_eq!(sent.status, StatusCode::OK);
        let bag: serde_json::Value = serde_json::from_str(&sent.body).unwrap();
        assert_eq!(bag["desc"], "An open bag");
        assert!(sent.header("etag").unwrap().starts_with('"'));
    }

    #[test]
    fn test_get_missing_bag() {
        assert_eq!(get(&server(), "/bags/nope", &[json()]).status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_put_bag_then_get() {
        let server = server();
        let body = r#"{"desc": "fresh", "policy": {}}"#;
        let put = send(
            &server,
            "PUT",
            "/bags/fresh",
            &[(CONTENT_TYPE, "application/json".to_string())],
            body,
        );

        assert_eq!(put.status, StatusCode::NO_CONTENT);
        assert_eq!(put.header("location"), Some("http://0.0.0.0:8080/bags/fresh"));

        let fetched = get(&server, "/bags/fresh", &[json()]);
        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(fetched.header("etag"), put.header("etag"));
    }

    #[test]
    fn test_put_bag_needs_content_type() {
        let sent = send(&server(), "PUT", "/bags/fresh", &[], "{}");
        assert_eq!(sent.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_put_bag_unknown_type() {
        let sent = send(
            &server(),
            "PUT",
            "/bags/fresh",
            &[(CONTENT_TYPE, "application/x-bag".to_string())],
            "{}",
        );
        assert_eq!(sent.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_replace_bag_requires_manage() {
        let server = server();
        let as_alice = [
            (CONTENT_TYPE, "application/json".to_string()),
            basic("alice", "alicepass"),
        ];
        let as_bob = [
            (CONTENT_TYPE, "application/json".to_string()),
            basic("bob", "bobpass"),
        ];

        let locked = r#"{"desc": "", "policy": {"manage": ["R:ADMIN"]}}"#;
        assert_eq!(
            send(&server, "PUT", "/bags/locked", &as_alice, locked).status,
            StatusCode::NO_CONTENT
        );

        let takeover = r#"{"desc": "mine now", "policy": {}}"#;
        assert_eq!(
            send(&server, "PUT", "/bags/locked", &as_bob, takeover).status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            send(&server, "PUT", "/bags/locked", &as_alice, takeover).status,
            StatusCode::NO_CONTENT
        );
    }

    #[test]
    fn test_delete_bag() {
        let server = server();
        let deleted = send(&server, "DELETE", "/bags/alpha", &[], "");
        assert_eq!(deleted.status, StatusCode::NO_CONTENT);
        assert_eq!(get(&server, "/bags/alpha", &[json()]).status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_list_bag_tiddlers_with_filters() {
        let server = server();

        let all = get(&server, "/bags/alpha/tiddlers.txt", &[]);
        assert_eq!(all.status, StatusCode::OK);
        assert_eq!(all.body.lines().count(), 2);

        let tagged = get(&server, "/bags/alpha/tiddlers.txt?select=tag:greeting", &[]);
        assert_eq!(tagged.body.lines().collect::<Vec<_>>(), vec!["foo"]);

        let bad = get(&server, "/bags/alpha/tiddlers.txt?limit=lots", &[]);
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_private_tiddlers_need_login() {
        let sent = get(&server(), "/bags/private/tiddlers", &[json()]);
        assert_eq!(sent.status, StatusCode::UNAUTHORIZED);
        assert!(sent.header("www-authenticate").is_some());
    }
}
