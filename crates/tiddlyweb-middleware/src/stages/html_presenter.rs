//! Frames HTML replies as complete pages.
//!
//! Handlers that produce HTML return only the page content and a title;
//! this stage adds the page header (with the configured stylesheet) and
//! footer. Replies without a title are passed through untouched.

use tiddlyweb_core::serializer::{page_footer, page_header};

use crate::pipeline::ResponseStage;
use crate::types::{Outcome, ReplyBody};
use crate::RequestContext;

/// The `html_presenter` stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlPresenter;

impl ResponseStage for HtmlPresenter {
    fn name(&self) -> &'static str {
        "html_presenter"
    }

    fn process(&self, ctx: &mut RequestContext, outcome: Outcome) -> Outcome {
        let mut reply = outcome?;
        let is_html = reply
            .content_type()
            .is_some_and(|content_type| content_type.starts_with("text/html"));
        if !is_html {
            return Ok(reply);
        }

        let page = match (&reply.title, &reply.body) {
            (Some(title), ReplyBody::Text(body)) => format!(
                "{}{}{}",
                page_header(title, &ctx.config().css_uri),
                body,
                page_footer()
            ),
            _ => return Ok(reply),
        };
        reply.body = ReplyBody::Text(page);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reply;

    #[test]
    fn test_titled_html_is_framed() {
        let mut ctx = RequestContext::detached("/bags");
        let reply = Reply::ok("text/html; charset=UTF-8", "<ul></ul>").with_title("Bags");

        let reply = HtmlPresenter.process(&mut ctx, Ok(reply)).unwrap();
        let body = reply.body.as_text().unwrap();

        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("<title>TiddlyWeb - Bags</title>"));
        assert!(body.contains("<ul></ul>"));
        assert!(body.ends_with("</html>\n"));
    }

    #[test]
    fn test_untitled_and_non_html_untouched() {
        let mut ctx = RequestContext::detached("/bags");

        let untitled = Reply::ok("text/html; charset=UTF-8", "<p>x</p>");
        let reply = HtmlPresenter.process(&mut ctx, Ok(untitled)).unwrap();
        assert_eq!(reply.body.as_text(), Some("<p>x</p>"));

        let json = Reply::ok("application/json; charset=UTF-8", "[]").with_title("Bags");
        let reply = HtmlPresenter.process(&mut ctx, Ok(json)).unwrap();
        assert_eq!(reply.body.as_text(), Some("[]"));
    }

    #[test]
    fn test_errors_pass_through() {
        let mut ctx = RequestContext::detached("/");
        let outcome = HtmlPresenter.process(&mut ctx, Err(crate::HttpError::NotFound("x".into())));
        assert!(matches!(outcome, Err(crate::HttpError::NotFound(_))));
    }
}
