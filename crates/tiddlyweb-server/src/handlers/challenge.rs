//! Login challengers.
//!
//! `cookie_form` asks for a user name and password and, when they match a
//! stored user, sets the signed `tiddlyweb_user` cookie that the
//! `simple_cookie` extractor reads on later requests.

use std::fmt::Write as _;

use http::header::SET_COOKIE;
use http::StatusCode;
use tracing::{debug, info};

use tiddlyweb_core::util::{escape_attribute_value, html_encode};
use tiddlyweb_middleware::cookie::{make_cookie, USER_COOKIE};
use tiddlyweb_middleware::types::Outcome;
use tiddlyweb_middleware::{Reply, Request, RequestContext};

const HTML: &str = "text/html; charset=UTF-8";
const REDIRECT_PARAM: &str = "tiddlyweb_redirect";

fn redirect_target(ctx: &RequestContext) -> String {
    ctx.query_value(REDIRECT_PARAM)
        .filter(|target| !target.is_empty())
        .map_or_else(|| format!("{}/", ctx.config().server_prefix), str::to_string)
}

fn cookie_path(ctx: &RequestContext) -> &str {
    match ctx.config().server_prefix.as_str() {
        "" => "/",
        prefix => prefix,
    }
}

fn login_form(ctx: &RequestContext, message: &str) -> String {
    let mut form = String::new();
    if !message.is_empty() {
        let _ = writeln!(form, "<pre>{}</pre>", html_encode(message));
    }
    let _ = write!(
        form,
        "<form action=\"{}/challenge/cookie_form\" method=\"POST\">\n\
         <input type=\"hidden\" name=\"{REDIRECT_PARAM}\" value=\"{}\">\n\
         <label>User <input name=\"user\" size=\"40\"></label>\n\
         <label>Password <input type=\"password\" name=\"password\" size=\"40\"></label>\n\
         <input type=\"submit\" value=\"submit\">\n\
         </form>\n",
        escape_attribute_value(&ctx.config().server_prefix),
        escape_attribute_value(&redirect_target(ctx)),
    );
    form
}

/// `GET /challenge`: links to the configured challengers.
pub fn list_challengers(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let prefix = escape_attribute_value(&ctx.config().server_prefix);
    let redirect = urlencoding::encode(&redirect_target(ctx)).into_owned();
    let items: String = ctx
        .config()
        .auth_systems
        .iter()
        .map(|system| {
            format!(
                "<li><a href=\"{prefix}/challenge/{}?{REDIRECT_PARAM}={redirect}\">{}</a></li>\n",
                escape_attribute_value(system),
                html_encode(system),
            )
        })
        .collect();

    let body = format!("<ul id=\"challengers\" class=\"listing\">\n{items}</ul>\n");
    Ok(Reply::ok(HTML, body).with_title("Login Challengers"))
}

/// `GET /challenge/cookie_form`: the login form.
pub fn cookie_form(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    Ok(Reply::ok(HTML, login_form(ctx, "")).with_title("Cookie Based Login"))
}

/// `POST /challenge/cookie_form`: checks the submitted credentials.
///
/// On success the caller is redirected to `tiddlyweb_redirect` with the
/// identity cookie set; otherwise the form is shown again with `401`.
pub fn cookie_form_submit(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let user = ctx.query_value("user").unwrap_or_default().to_string();
    let password = ctx.query_value("password").unwrap_or_default().to_string();

    let valid = !user.is_empty()
        && ctx
            .store()?
            .get_user(&user)
            .is_ok_and(|stored| stored.check_password(&password));

    if !valid {
        debug!(user = %user, "Cookie login rejected");
        let mut reply = Reply::ok(HTML, login_form(ctx, "User or Password incorrect"))
            .with_title("Cookie Based Login");
        reply.status = StatusCode::UNAUTHORIZED;
        return Ok(reply);
    }

    info!(user = %user, "Cookie login");
    let cookie = make_cookie(
        USER_COOKIE,
        &user,
        Some(&ctx.config().secret),
        Some(cookie_path(ctx)),
        None,
        true,
        None,
    );
    Ok(Reply::see_other(&redirect_target(ctx)).with_header(SET_COOKIE, cookie))
}
