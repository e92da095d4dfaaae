//! Policy checks that need the request's store and identity.

use tiddlyweb_core::{check, check_create_policy, Constraint};
use tracing::debug;

use crate::{HttpError, RequestContext};

/// Checks `constraint` on the bag named `bag_name` for the caller.
///
/// A missing bag is reported as not found. A denial keeps its kind and is
/// prefixed with `for bag <name>:`.
pub fn check_bag_constraint(
    ctx: &RequestContext,
    bag_name: &str,
    constraint: Constraint,
) -> Result<(), HttpError> {
    let bag = ctx.store()?.get_bag(bag_name)?;
    check(ctx.identity(), &bag, constraint).map_err(|denial| {
        debug!(bag = %bag.name, %constraint, user = ctx.identity().log_id(), "Bag access denied");
        HttpError::AccessDenied(denial.with_context(format!("for bag {}", bag.name)))
    })
}

/// Checks `constraint` on the recipe named `recipe_name` for the caller.
pub fn check_recipe_constraint(
    ctx: &RequestContext,
    recipe_name: &str,
    constraint: Constraint,
) -> Result<(), HttpError> {
    let recipe = ctx.store()?.get_recipe(recipe_name)?;
    check(ctx.identity(), &recipe, constraint).map_err(|denial| {
        debug!(
            recipe = %recipe.name,
            %constraint,
            user = ctx.identity().log_id(),
            "Recipe access denied"
        );
        HttpError::AccessDenied(denial.with_context(format!("for recipe {}", recipe.name)))
    })
}

/// Checks the server's `bag_create_policy` for the caller.
pub fn check_bag_create(ctx: &RequestContext) -> Result<(), HttpError> {
    check_create_policy(ctx.identity(), &ctx.config().bag_create_policy)
        .map_err(|denial| HttpError::AccessDenied(denial.with_context("bag create")))
}

/// Checks the server's `recipe_create_policy` for the caller.
pub fn check_recipe_create(ctx: &RequestContext) -> Result<(), HttpError> {
    check_create_policy(ctx.identity(), &ctx.config().recipe_create_policy)
        .map_err(|denial| HttpError::AccessDenied(denial.with_context("recipe create")))
}
