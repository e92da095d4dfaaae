//! Request routing and path matching.
//!
//! The router maps a method and path to a handler name. Templates use
//! `{param}` segments; parameter values are captured still percent-encoded
//! so handlers decode them with
//! [`get_route_value`](tiddlyweb_middleware::util::get_route_value), which
//! knows how to report bad encodings.
//!
//! A literal final segment also matches with a format extension appended,
//! so `/bags.json` reaches the `/bags` route. The extension itself was
//! already recorded by the `negotiate` stage.
//!
//! # Example
//!
//! ```rust
//! use http::Method;
//! use tiddlyweb_server::Router;
//!
//! let mut router = Router::new("");
//! router.add_route(Method::GET, "/bags/{bag_name}", "get_bag");
//!
//! let m = router.match_route(&Method::GET, "/bags/alpha").unwrap();
//! assert_eq!(m.handler(), "get_bag");
//! assert_eq!(m.param("bag_name"), Some("alpha"));
//! ```

use std::collections::HashMap;

use http::Method;

/// A matched route with its captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    template: String,
    handler: &'static str,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// The route template, e.g. `/bags/{bag_name}`. Used as a metrics label.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The handler name.
    #[must_use]
    pub fn handler(&self) -> &'static str {
        self.handler
    }

    /// The captured parameters, percent-encoded as they appeared.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns one parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Consumes the match, returning its parameters.
    #[must_use]
    pub fn into_params(self) -> HashMap<String, String> {
        self.params
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<PathSegment>,
    handler: &'static str,
    template: String,
}

impl Route {
    fn new(method: Method, template: &str, handler: &'static str) -> Self {
        let segments = template
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => PathSegment::Param(name.to_string()),
                None => PathSegment::Literal(s.to_string()),
            })
            .collect();
        Self {
            method,
            segments,
            handler,
            template: template.to_string(),
        }
    }

    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if actual.len() != self.segments.len() {
            return None;
        }

        let last = actual.len().saturating_sub(1);
        let mut params = HashMap::new();
        for (index, (pattern, segment)) in self.segments.iter().zip(&actual).enumerate() {
            match pattern {
                PathSegment::Literal(expected) => {
                    if !literal_matches(expected, segment, index == last) {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    params.insert(name.clone(), (*segment).to_string());
                }
            }
        }
        Some(params)
    }
}

fn literal_matches(expected: &str, segment: &str, is_last: bool) -> bool {
    if expected == segment {
        return true;
    }
    is_last
        && segment
            .strip_prefix(expected)
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|ext| !ext.is_empty() && !ext.contains('.'))
}

/// Method and path router.
///
/// Routes are tried in registration order; the first match wins. `HEAD`
/// requests match `GET` routes.
#[derive(Debug, Clone, Default)]
pub struct Router {
    prefix: String,
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router for a server mounted at `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim_end_matches('/').to_string(),
            routes: Vec::new(),
        }
    }

    /// Creates the router with every wiki route.
    #[must_use]
    pub fn wiki(prefix: impl Into<String>) -> Self {
        let mut router = Self::new(prefix);
        let routes: [(Method, &str, &'static str); 23] = [
            (Method::GET, "/", "root"),
            (Method::GET, "/bags", "list_bags"),
            (Method::GET, "/bags/{bag_name}", "get_bag"),
            (Method::PUT, "/bags/{bag_name}", "put_bag"),
            (Method::DELETE, "/bags/{bag_name}", "delete_bag"),
            (Method::GET, "/bags/{bag_name}/tiddlers", "list_bag_tiddlers"),
            (Method::GET, "/bags/{bag_name}/tiddlers/{tiddler_name}", "get_tiddler"),
            (Method::PUT, "/bags/{bag_name}/tiddlers/{tiddler_name}", "put_tiddler"),
            (Method::DELETE, "/bags/{bag_name}/tiddlers/{tiddler_name}", "delete_tiddler"),
            (
                Method::GET,
                "/bags/{bag_name}/tiddlers/{tiddler_name}/revisions",
                "list_revisions",
            ),
            (
                Method::GET,
                "/bags/{bag_name}/tiddlers/{tiddler_name}/revisions/{revision}",
                "get_revision",
            ),
            (Method::GET, "/recipes", "list_recipes"),
            (Method::GET, "/recipes/{recipe_name}", "get_recipe"),
            (Method::PUT, "/recipes/{recipe_name}", "put_recipe"),
            (Method::DELETE, "/recipes/{recipe_name}", "delete_recipe"),
            (Method::GET, "/recipes/{recipe_name}/tiddlers", "list_recipe_tiddlers"),
            (Method::GET, "/recipes/{recipe_name}/tiddlers/{tiddler_name}", "get_tiddler"),
            (Method::PUT, "/recipes/{recipe_name}/tiddlers/{tiddler_name}", "put_tiddler"),
            (
                Method::GET,
                "/recipes/{recipe_name}/tiddlers/{tiddler_name}/revisions",
                "list_revisions",
            ),
            (
                Method::GET,
                "/recipes/{recipe_name}/tiddlers/{tiddler_name}/revisions/{revision}",
                "get_revision",
            ),
            (Method::GET, "/challenge", "list_challengers"),
            (Method::GET, "/challenge/cookie_form", "cookie_form"),
            (Method::POST, "/challenge/cookie_form", "cookie_form_submit"),
        ];
        for (method, template, handler) in routes {
            router.add_route(method, template, handler);
        }
        router
    }

    /// Adds a route.
    pub fn add_route(&mut self, method: Method, template: &str, handler: &'static str) {
        self.routes.push(Route::new(method, template, handler));
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Returns every handler name, in registration order.
    pub fn handler_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.iter().map(|route| route.handler)
    }

    /// Finds the route for `method` and `path`.
    ///
    /// Paths outside the prefix match nothing.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let path = self.strip_prefix(path)?;
        let method = if *method == Method::HEAD { &Method::GET } else { method };

        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route.match_path(path).map(|params| RouteMatch {
                    template: route.template.clone(),
                    handler: route.handler,
                    params,
                })
            })
    }

    /// Returns the methods some route accepts for `path`, for an `Allow`
    /// header. Empty when no route has this path.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let Some(path) = self.strip_prefix(path) else {
            return Vec::new();
        };
        let mut methods: Vec<Method> = Vec::new();
        for route in &self.routes {
            if !methods.contains(&route.method) && route.match_path(path).is_some() {
                methods.push(route.method.clone());
            }
        }
        if methods.contains(&Method::GET) {
            methods.push(Method::HEAD);
        }
        methods
    }

    fn strip_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.prefix.is_empty() {
            return Some(path);
        }
        let rest = path.strip_prefix(&self.prefix)?;
        (rest.is_empty() || rest.starts_with('/')).then_some(rest)
    }
}
