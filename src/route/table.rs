use super::Route;
use crate::middleware::BoxedHandler;
use crate::regex_generator::Pattern;
use crate::types::RouteParams;
use http::Method;
use std::fmt::{self, Debug, Formatter};

/// The routes of one router, in registration order.
///
/// Lookup is first-match: the earliest registered route whose method and pattern both accept the request wins,
/// regardless of how specific later routes are.
pub(crate) struct RouteTable<B, E> {
    routes: Vec<Route<B, E>>,
    head_fallback: bool,
}

impl<B, E> RouteTable<B, E> {
    pub(crate) fn new() -> Self {
        RouteTable {
            routes: Vec::new(),
            head_fallback: true,
        }
    }

    pub(crate) fn set_head_fallback(&mut self, enabled: bool) {
        self.head_fallback = enabled;
    }

    pub(crate) fn register(
        &mut self,
        method: Option<Method>,
        pattern: &Pattern,
        handlers: Vec<BoxedHandler<B, E>>,
    ) -> crate::Result<()> {
        let route = Route::new(method, pattern, handlers)?;
        tracing::trace!(route = ?route, "registered route");
        self.routes.push(route);
        Ok(())
    }

    pub(crate) fn routes(&self) -> &[Route<B, E>] {
        &self.routes
    }

    /// Finds the route for `method` and a normalized `path`.
    ///
    /// With the fallback enabled, a `HEAD` request takes the first explicit `HEAD` route that matches. Failing that it
    /// is looked up exactly as a `GET` would be, so `GET` and any-method routes compete in registration order.
    pub(crate) fn lookup(&self, method: &Method, path: &str) -> Option<(&Route<B, E>, RouteParams)> {
        if self.head_fallback && *method == Method::HEAD {
            self.first_match(path, |route| route.method() == Some(&Method::HEAD))
                .or_else(|| self.first_match(path, |route| route.is_match_method(&Method::GET)))
        } else {
            self.first_match(path, |route| route.is_match_method(method))
        }
    }

    fn first_match<F>(&self, path: &str, accepts: F) -> Option<(&Route<B, E>, RouteParams)>
    where
        F: Fn(&Route<B, E>) -> bool,
    {
        self.routes
            .iter()
            .filter(|route| accepts(route))
            .find_map(|route| route.is_match_path(path).map(|params| (route, params)))
    }
}

impl<B, E> Debug for RouteTable<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.routes)
            .field("head_fallback", &self.head_fallback)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{handler, Flow};
    use crate::types::RequestContext;

    fn noop() -> Vec<BoxedHandler<(), String>> {
        vec![handler(|ctx: RequestContext<()>| async move { Ok::<Flow<()>, String>(ctx.next()) })]
    }

    fn table(routes: &[(Option<Method>, &str)]) -> RouteTable<(), String> {
        let mut table = RouteTable::new();
        for (method, path) in routes {
            table.register(method.clone(), &Pattern::from(*path), noop()).unwrap();
        }
        table
    }

    #[test]
    fn should_prefer_first_registered_match() {
        let table = table(&[(Some(Method::GET), "/a/:x"), (Some(Method::GET), "/a/b")]);

        let (route, params) = table.lookup(&Method::GET, "/a/b").unwrap();
        assert_eq!(route.path(), "/a/:x");
        assert_eq!(params.get("x").map(String::as_str), Some("b"));
    }

    #[test]
    fn should_match_methods_exactly() {
        let table = table(&[(Some(Method::POST), "/items")]);

        assert!(table.lookup(&Method::POST, "/items").is_some());
        assert!(table.lookup(&Method::GET, "/items").is_none());
        assert!(table.lookup(&Method::PUT, "/items").is_none());
    }

    #[test]
    fn should_match_any_method_routes() {
        let table = table(&[(None, "/health")]);

        assert!(table.lookup(&Method::GET, "/health").is_some());
        assert!(table.lookup(&Method::DELETE, "/health").is_some());
    }

    #[test]
    fn should_fall_back_from_head_to_get() {
        let mut table = table(&[(Some(Method::GET), "/page"), (Some(Method::HEAD), "/other")]);

        assert_eq!(table.lookup(&Method::HEAD, "/page").unwrap().0.path(), "/page");
        assert_eq!(table.lookup(&Method::HEAD, "/other").unwrap().0.method(), Some(&Method::HEAD));

        table.set_head_fallback(false);
        assert!(table.lookup(&Method::HEAD, "/page").is_none());
    }

    #[test]
    fn should_prefer_get_routes_over_later_catch_alls_for_head() {
        let table = table(&[(Some(Method::GET), "/page"), (None, "/*")]);

        assert_eq!(table.lookup(&Method::HEAD, "/page").unwrap().0.path(), "/page");
        assert_eq!(table.lookup(&Method::HEAD, "/other").unwrap().0.path(), "/*");
    }

    #[test]
    fn should_answer_head_like_get_when_a_catch_all_comes_first() {
        let with_head = table(&[(None, "/*"), (Some(Method::GET), "/page"), (Some(Method::HEAD), "/page")]);
        let (route, _) = with_head.lookup(&Method::HEAD, "/page").unwrap();
        assert_eq!(route.method(), Some(&Method::HEAD));

        let without_head = table(&[(None, "/*"), (Some(Method::GET), "/page")]);
        assert_eq!(without_head.lookup(&Method::HEAD, "/page").unwrap().0.path(), "/*");
        assert_eq!(without_head.lookup(&Method::GET, "/page").unwrap().0.path(), "/*");
    }

    #[test]
    fn should_return_none_on_miss() {
        let table = table(&[(Some(Method::GET), "/users/:id")]);
        assert!(table.lookup(&Method::GET, "/users").is_none());
        assert!(table.lookup(&Method::GET, "/posts/1").is_none());
    }

    #[test]
    fn should_reject_bad_patterns_without_touching_existing_routes() {
        let mut table = table(&[(Some(Method::GET), "/ok")]);
        assert!(table.register(Some(Method::GET), &Pattern::from("/bad/:id/:id"), noop()).is_err());
        assert_eq!(table.routes().len(), 1);
        assert!(table.lookup(&Method::GET, "/ok").is_some());
    }
}
