//! Recipe routes.

use http::header::ETAG;
use http::StatusCode;
use tracing::info;

use tiddlyweb_core::control::{get_tiddlers_from_recipe, recipe_template};
use tiddlyweb_core::filter::apply_filters;
use tiddlyweb_core::{check, Constraint, Recipe};
use tiddlyweb_middleware::authz::{
    check_bag_constraint, check_recipe_constraint, check_recipe_create,
};
use tiddlyweb_middleware::cache::check_incoming_etag;
use tiddlyweb_middleware::negotiate::require_serialize_type;
use tiddlyweb_middleware::tagging::{recipe_etag, recipe_url};
use tiddlyweb_middleware::types::Outcome;
use tiddlyweb_middleware::util::{get_route_value, handle_extension};
use tiddlyweb_middleware::{HttpError, Reply, Request, RequestContext};

use super::{query_filters, read_entity_body, send_entity, send_listing, serializer_for};

fn recipe_name(ctx: &mut RequestContext) -> Result<String, HttpError> {
    let raw = get_route_value(ctx, "recipe_name")?;
    Ok(handle_extension(ctx, &raw))
}

/// `GET /recipes`: the recipes the caller may read.
pub fn list_recipes(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let entry = require_serialize_type(ctx, true)?;
    let mut recipes: Vec<Recipe> = ctx
        .store()?
        .list_recipes()?
        .into_iter()
        .filter(|recipe| check(ctx.identity(), recipe, Constraint::Read).is_ok())
        .collect();
    recipes.sort_by(|a, b| a.name.cmp(&b.name));

    let body = serializer_for(ctx, &entry)?.list_recipes(&recipes)?;
    send_listing(ctx, &entry, body, "Recipes")
}

/// `GET /recipes/{recipe_name}`
pub fn get_recipe(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let name = recipe_name(ctx)?;
    let entry = require_serialize_type(ctx, false)?;
    check_recipe_constraint(ctx, &name, Constraint::Read)?;

    let recipe = ctx.store()?.get_recipe(&name)?;
    let etag = recipe_etag(ctx, &recipe)?;
    check_incoming_etag(ctx, &etag, None, None, None)?;

    let body = serializer_for(ctx, &entry)?.recipe_as(&recipe)?;
    Ok(send_entity(&entry, body, etag, &format!("Recipe {name}")))
}

/// `PUT /recipes/{recipe_name}`: creates or replaces a recipe.
pub fn put_recipe(ctx: &mut RequestContext, request: &Request) -> Outcome {
    let name = recipe_name(ctx)?;
    let store = ctx.store()?;

    match store.get_recipe(&name) {
        Ok(existing) => check(ctx.identity(), &existing, Constraint::Manage).map_err(|denial| {
            HttpError::AccessDenied(denial.with_context(format!("for recipe {name}")))
        })?,
        Err(err) if err.is_not_found() => check_recipe_create(ctx)?,
        Err(err) => return Err(err.into()),
    }

    let (serializer, body) = read_entity_body(ctx, request)?;
    let recipe = serializer.as_recipe(&name, &body)?;
    store.put_recipe(&recipe)?;
    info!(recipe = %recipe.name, user = ctx.identity().log_id(), "Recipe stored");

    let etag = recipe_etag(ctx, &recipe)?;
    Ok(Reply::no_content(&recipe_url(ctx.config(), &recipe, true)).with_header(ETAG, etag))
}

/// `DELETE /recipes/{recipe_name}`. The bags it names are left alone.
pub fn delete_recipe(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let name = recipe_name(ctx)?;
    check_recipe_constraint(ctx, &name, Constraint::Manage)?;

    ctx.store()?.delete_recipe(&name)?;
    info!(recipe = %name, user = ctx.identity().log_id(), "Recipe deleted");
    Ok(Reply::new(StatusCode::NO_CONTENT))
}

/// `GET /recipes/{recipe_name}/tiddlers`: the merged view of the recipe's
/// bags. Every bag in the recipe must be readable.
pub fn list_recipe_tiddlers(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let name = get_route_value(ctx, "recipe_name")?;
    let entry = require_serialize_type(ctx, true)?;
    check_recipe_constraint(ctx, &name, Constraint::Read)?;

    let store = ctx.store()?;
    let recipe = store.get_recipe(&name)?;
    for (bag, _) in recipe_template(&recipe, ctx.identity()) {
        check_bag_constraint(ctx, &bag, Constraint::Read)?;
    }

    let filters = query_filters(ctx)?;
    let merged = get_tiddlers_from_recipe(store, &recipe, ctx.identity())?;
    let tiddlers = apply_filters(&filters, merged);
    let body = serializer_for(ctx, &entry)?.list_tiddlers(&tiddlers)?;
    send_listing(ctx, &entry, body, &format!("Tiddlers in recipe {name}"))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{basic, get, send, server};
    use http::header::{ACCEPT, CONTENT_TYPE};
    use http::StatusCode;

    #[test]
    fn test_list_recipes() {
        let sent = get(&server(), "/recipes.json", &[]);

        assert_eq!(sent.status, StatusCode::OK);
        assert_eq!(sent.body, r#"["site"]"#);
    }

    #[test]
    fn test_get_recipe_text() {
        let sent = get(&server(), "/recipes/site", &[(ACCEPT, "text/plain".to_string())]);

        assert_eq!(sent.status, StatusCode::OK);
        assert!(sent.body.contains("/bags/alpha/tiddlers\n/bags/private/tiddlers\n"));
    }

    #[test]
    fn test_put_recipe_with_create_policy() {
        let server = crate::Server::new(
            tiddlyweb_config::WikiConfig {
                recipe_create_policy: "ANY".into(),
                ..tiddlyweb_config::WikiConfig::default()
            },
            std::sync::Arc::new(tiddlyweb_core::fixtures::sample_store().unwrap()),
        )
        .unwrap();
        let body = r#"{"desc": "alpha only", "recipe": [["alpha", ""]]}"#;
        let json = (CONTENT_TYPE, "application/json".to_string());

        let anonymous = send(&server, "PUT", "/recipes/solo", &[json.clone()], body);
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

        let bob = send(&server, "PUT", "/recipes/solo", &[json, basic("bob", "bobpass")], body);
        assert_eq!(bob.status, StatusCode::NO_CONTENT);
        assert_eq!(bob.header("location"), Some("http://0.0.0.0:8080/recipes/solo"));
    }

    #[test]
    fn test_delete_recipe() {
        let server = server();
        assert_eq!(
            send(&server, "DELETE", "/recipes/site", &[], "").status,
            StatusCode::NO_CONTENT
        );
        assert_eq!(
            get(&server, "/recipes/site.json", &[]).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(get(&server, "/bags/alpha.json", &[]).status, StatusCode::OK);
    }

    #[test]
    fn test_recipe_tiddlers_need_every_bag_readable() {
        let server = server();

        let anonymous = get(&server, "/recipes/site/tiddlers.txt", &[]);
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

        let admin = get(&server, "/recipes/site/tiddlers.txt", &[basic("alice", "alicepass")]);
        assert_eq!(admin.status, StatusCode::OK);
        assert_eq!(admin.body.lines().collect::<Vec<_>>(), vec!["bar", "foo", "secret"]);
    }
}
