//! `GET /`

use tiddlyweb_core::util::escape_attribute_value;
use tiddlyweb_middleware::types::Outcome;
use tiddlyweb_middleware::{Reply, Request, RequestContext};

/// Lists the top-level collections as an HTML page.
pub fn root(ctx: &mut RequestContext, _request: &Request) -> Outcome {
    let prefix = escape_attribute_value(&ctx.config().server_prefix);
    let body = format!(
        "<ul id=\"root\" class=\"listing\">\n\
         <li><a href=\"{prefix}/recipes\">recipes</a></li>\n\
         <li><a href=\"{prefix}/bags\">bags</a></li>\n\
         </ul>\n"
    );
    Ok(Reply::ok("text/html; charset=UTF-8", body).with_title("Home"))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{get, server};
    use http::StatusCode;

    #[test]
    fn test_root_is_framed_page() {
        let sent = get(&server(), "/", &[]);

        assert_eq!(sent.status, StatusCode::OK);
        assert_eq!(sent.header("content-type"), Some("text/html; charset=UTF-8"));
        assert!(sent.body.starts_with("<!DOCTYPE html>"));
        assert!(sent.body.contains("<a href=\"/bags\">bags</a>"));
        assert!(sent.body.contains("<a href=\"/recipes\">recipes</a>"));
    }
}
