pub use self::context::RequestContext;
pub use self::request_info::RequestInfo;
pub use self::route_params::RouteParams;

mod context;
mod request_info;
mod route_params;
