use crate::middleware::BoxedHandler;
use crate::regex_generator::{generate_exact_match_regex, Matcher, Pattern};
use crate::types::RouteParams;
use http::Method;
use std::fmt::{self, Debug, Formatter};

pub(crate) use self::table::RouteTable;

mod table;

/// Represents a single route.
///
/// A route consists of a path pattern, the http method it answers (or every method, for routes added with
/// [`all`](./struct.RouterBuilder.html#method.all)) and the chain of handlers to run. It shouldn't be created directly,
/// use [RouterBuilder](./struct.RouterBuilder.html) methods to create a route.
///
/// This `Route<B, E>` type accepts two type parameters: `B` and `E`.
///
/// * The `B` represents the request body type the handlers receive, e.g. [`hyper::body::Incoming`](https://docs.rs/hyper/1/hyper/body/struct.Incoming.html).
/// * The `E` represents any error type which will be used by route handlers and the middlewares. This error type must be
///   convertible into a boxed [std::error::Error](https://doc.rust-lang.org/std/error/trait.Error.html).
pub struct Route<B, E> {
    matcher: Matcher,
    // `None` accepts every method.
    method: Option<Method>,
    handlers: Vec<BoxedHandler<B, E>>,
}

impl<B, E> Route<B, E> {
    pub(crate) fn new(method: Option<Method>, pattern: &Pattern, handlers: Vec<BoxedHandler<B, E>>) -> crate::Result<Route<B, E>> {
        let matcher = generate_exact_match_regex(pattern)?;

        Ok(Route {
            matcher,
            method,
            handlers,
        })
    }

    /// The pattern this route was registered with.
    pub fn path(&self) -> &str {
        self.matcher.source()
    }

    /// The method this route answers, or `None` if it answers every method.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// The handler chain, in registration order.
    pub fn handlers(&self) -> &[BoxedHandler<B, E>] {
        &self.handlers
    }

    pub(crate) fn is_match_method(&self, method: &Method) -> bool {
        self.method.as_ref().map_or(true, |m| m == method)
    }

    pub(crate) fn is_match_path(&self, target_path: &str) -> Option<RouteParams> {
        self.matcher.captures(target_path)
    }
}

impl<B, E> Debug for Route<B, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ path: {:?}, params: {:?}, method: {:?}, handlers: {} }}",
            self.matcher.source(),
            self.matcher.param_names(),
            self.method,
            self.handlers.len()
        )
    }
}
