use chainroute::{handlers, Error, Flow, RequestContext, RequestInfo, RouteError, Router};
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::Response;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn text(body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::new(Full::new(body.into()))
}

async fn body_text(res: Response<Full<Bytes>>) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn dispatch<E>(router: &Router<(), E>, method: Method, uri: &str) -> Response<Full<Bytes>>
where
    E: Into<RouteError> + 'static,
{
    let req = Request::builder().method(method).uri(uri).body(()).unwrap();
    router.dispatch(req).await.unwrap()
}

async fn get<E>(router: &Router<(), E>, uri: &str) -> (StatusCode, String)
where
    E: Into<RouteError> + 'static,
{
    let res = dispatch(router, Method::GET, uri).await;
    (res.status(), body_text(res).await)
}

// Responds with the path it saw and every parameter, sorted.
async fn echo(ctx: RequestContext<()>) -> Result<Flow<()>, Infallible> {
    let body = format!("{} {}", ctx.path(), ctx.params());
    Ok(ctx.respond(text(body)))
}

async fn pass(ctx: RequestContext<()>) -> Result<Flow<()>, Infallible> {
    Ok(ctx.next())
}

#[test]
fn should_find_literal_routes_without_params() {
    let router: Router<(), Infallible> = Router::builder()
        .get("/", echo)
        .get("/about", echo)
        .post("/about/team", echo)
        .build()
        .unwrap();

    for (method, path) in [(Method::GET, "/"), (Method::GET, "/about"), (Method::POST, "/about/team")] {
        let found = router.find(&method, path).unwrap();
        assert!(found.params.is_empty());
        assert_eq!(found.handlers.len(), 1);
    }
    assert!(router.find(&Method::GET, "/about/team").is_none());
}

#[test]
fn should_capture_named_segments() {
    let router: Router<(), Infallible> = Router::builder().get("/users/:id", echo).build().unwrap();

    let found = router.find(&Method::GET, "/users/42").unwrap();
    assert_eq!(found.params.get("id").map(String::as_str), Some("42"));
    assert_eq!(found.params.len(), 1);

    assert!(router.find(&Method::GET, "/users/").is_none());
    assert!(router.find(&Method::GET, "/users/42/posts").is_none());
}

#[test]
fn should_prefer_first_registered_route() {
    let router: Router<(), Infallible> = Router::builder()
        .get("/a/:x", echo)
        .add("GET", "/a/b", handlers![pass, echo])
        .build()
        .unwrap();

    let found = router.find(&Method::GET, "/a/b").unwrap();
    assert_eq!(found.params.get("x").map(String::as_str), Some("b"));
    assert_eq!(found.handlers.len(), 1);
}

#[test]
fn should_return_same_result_on_repeated_find() {
    let router: Router<(), Infallible> = Router::builder()
        .get("/files/*path", echo)
        .get("/users/:id", echo)
        .build()
        .unwrap();

    let first = router.find(&Method::GET, "/users/7").unwrap();
    for _ in 0..3 {
        let again = router.find(&Method::GET, "/users/7").unwrap();
        assert_eq!(again.params, first.params);
        assert_eq!(again.handlers.len(), first.handlers.len());
        assert!(Arc::ptr_eq(&again.handlers[0], &first.handlers[0]));
    }
}

#[test]
fn should_reject_malformed_registrations() {
    let dup = Router::<(), Infallible>::builder().get("/a/:id/b/:id", echo).build().unwrap_err();
    assert!(matches!(dup.downcast_ref::<Error>(), Some(Error::DuplicateParam { .. })));

    let wild = Router::<(), Infallible>::builder().get("/a/*/b", echo).build().unwrap_err();
    assert!(matches!(wild.downcast_ref::<Error>(), Some(Error::InvalidPattern { .. })));

    let verb = Router::<(), Infallible>::builder().add("get", "/a", handlers![echo]).build().unwrap_err();
    assert!(matches!(verb.downcast_ref::<Error>(), Some(Error::InvalidMethod(_))));
}

#[tokio::test]
async fn should_keep_valid_routes_when_a_registration_fails() {
    let (router, errors) = Router::<(), Infallible>::builder()
        .get("/ok", echo)
        .get("/bad/:id/:id", echo)
        .get("/after", echo)
        .build_skipping_invalid();

    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0].downcast_ref::<Error>(), Some(Error::DuplicateParam { .. })));
    assert!(router.find(&Method::GET, "/ok").is_some());
    assert_eq!(get(&router, "/ok").await, (StatusCode::OK, "/ok {}".to_owned()));
    assert_eq!(get(&router, "/after").await, (StatusCode::OK, "/after {}".to_owned()));
}

#[tokio::test]
async fn should_match_optional_wildcard_and_regex_patterns() {
    let router: Router<(), Infallible> = Router::builder()
        .get("/posts/:page?", echo)
        .get("/static/*", echo)
        .get(regex::Regex::new(r"^/v(?P<version>\d+)/(status|health)$").unwrap(), echo)
        .build()
        .unwrap();

    assert_eq!(get(&router, "/posts").await.1, "/posts {}");
    assert_eq!(get(&router, "/posts/3").await.1, "/posts/3 {page: \"3\"}");
    assert_eq!(get(&router, "/static/css/site.css").await.1, "/static/css/site.css {wild: \"css/site.css\"}");
    assert_eq!(get(&router, "/v2/health").await.1, "/v2/health {version: \"2\"}");
}

#[tokio::test]
async fn should_capture_encoded_newlines_in_wildcards() {
    let router: Router<(), Infallible> = Router::builder().get("/files/*", echo).build().unwrap();

    let found = router.find(&Method::GET, "/files/a\nb").unwrap();
    assert_eq!(found.params.get("wild").map(String::as_str), Some("a\nb"));

    let (status, body) = get(&router, "/files/a%0Ab").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.ends_with("{wild: \"a\\nb\"}"), "unexpected body {:?}", body);
}

#[tokio::test]
async fn should_normalize_trailing_slashes_and_decode_paths() {
    let router: Router<(), Infallible> = Router::builder().get("/users/:name", echo).build().unwrap();

    assert_eq!(get(&router, "/users/ann/").await.1, "/users/ann {name: \"ann\"}");
    assert_eq!(get(&router, "/users/J%C3%BCrgen").await.1, "/users/Jürgen {name: \"Jürgen\"}");
}

#[tokio::test]
async fn should_fall_back_from_head_to_get() {
    let router: Router<(), Infallible> = Router::builder().get("/page", echo).build().unwrap();
    assert_eq!(dispatch(&router, Method::HEAD, "/page").await.status(), StatusCode::OK);
    assert_eq!(dispatch(&router, Method::POST, "/page").await.status(), StatusCode::NOT_FOUND);

    let strict: Router<(), Infallible> = Router::builder().get("/page", echo).head_fallback(false).build().unwrap();
    assert_eq!(dispatch(&strict, Method::HEAD, "/page").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_answer_head_with_get_route_before_a_later_catch_all() {
    let router: Router<(), Infallible> = Router::builder()
        .get("/page", echo)
        .all("/*", |ctx: RequestContext<()>| async move {
            let mut res = text("caught");
            *res.status_mut() = StatusCode::NOT_FOUND;
            Ok(ctx.respond(res))
        })
        .build()
        .unwrap();

    let res = dispatch(&router, Method::HEAD, "/page").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_text(res).await, "/page {}");

    let res = dispatch(&router, Method::HEAD, "/elsewhere").await;
    assert_eq!(body_text(res).await, "caught");
}

#[tokio::test]
async fn should_run_global_middlewares_before_routes_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let recorder = |name: &'static str| {
        let log = log.clone();
        move |ctx: RequestContext<()>| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(name);
                Ok::<_, Infallible>(ctx.next())
            }
        }
    };

    let router: Router<(), Infallible> = Router::builder()
        .get("/", recorder("route"))
        .middleware(recorder("first"))
        .middleware(recorder("second"))
        .build()
        .unwrap();

    // The route passes the request on too, so nobody answers it.
    assert_eq!(get(&router, "/").await.0, StatusCode::NOT_FOUND);
    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "route"]);
}

#[tokio::test]
async fn should_let_a_middleware_answer_before_routing() {
    let router: Router<(), Infallible> = Router::builder()
        .middleware(|ctx: RequestContext<()>| async move {
            if ctx.headers().contains_key("x-maintenance") {
                Ok(ctx.respond(text("down for maintenance")))
            } else {
                Ok(ctx.next())
            }
        })
        .get("/", echo)
        .build()
        .unwrap();

    let req = Request::builder().uri("/").header("x-maintenance", "1").body(()).unwrap();
    assert_eq!(body_text(router.dispatch(req).await.unwrap()).await, "down for maintenance");
    assert_eq!(get(&router, "/").await.1, "/ {}");
}

#[tokio::test]
async fn should_rebase_paths_and_merge_params_into_scoped_routers() {
    let items: Router<(), Infallible> = Router::builder().get("/items/:itemId", echo).build().unwrap();
    let router: Router<(), Infallible> = Router::builder().scope("/api/:version", items).build().unwrap();

    assert_eq!(get(&router, "/api/v1/items/9").await.1, "/items/9 {itemId: \"9\", version: \"v1\"}");
    assert_eq!(get(&router, "/api/v1/other").await.0, StatusCode::NOT_FOUND);
    assert_eq!(get(&router, "/apiv1/items/9").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_only_rebase_regex_prefixes_on_segment_boundaries() {
    let items: Router<(), Infallible> = Router::builder().get("/items/:itemId", echo).build().unwrap();
    let router: Router<(), Infallible> = Router::builder()
        .scope(regex::Regex::new(r"^/v(?P<version>\d+)").unwrap(), items)
        .build()
        .unwrap();

    assert_eq!(get(&router, "/v2/items/1").await.1, "/items/1 {itemId: \"1\", version: \"2\"}");
    assert_eq!(get(&router, "/v2x/items/1").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_expose_original_and_base_urls_inside_mounts() {
    let inner: Router<(), Infallible> = Router::builder()
        .get("/x", |ctx: RequestContext<()>| async move {
            let body = format!("{}|{}|{}|{:?}", ctx.original_url(), ctx.base_url(), ctx.path(), ctx.search());
            Ok(ctx.respond(text(body)))
        })
        .build()
        .unwrap();
    let middle: Router<(), Infallible> = Router::builder().scope("/b", inner).build().unwrap();
    let router: Router<(), Infallible> = Router::builder().scope("/a", middle).build().unwrap();

    assert_eq!(get(&router, "/a/b/x?q=1").await.1, "/a/b/x?q=1|/a/b|/x|Some(\"q=1\")");
}

#[tokio::test]
async fn should_fall_through_mounts_that_do_not_answer() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let admin: Router<(), Infallible> = Router::builder().get("/stats", echo).build().unwrap();
    let router: Router<(), Infallible> = Router::builder()
        .mount(
            "/admin",
            handlers![move |ctx: RequestContext<()>| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(ctx.next())
                }
            }],
        )
        .scope("/admin", admin)
        .get("/admin/users", echo)
        .build()
        .unwrap();

    // Answered by the scoped router.
    assert_eq!(get(&router, "/admin/stats").await.1, "/stats {}");
    // Not answered by it, so the parent's routes get the original path back.
    assert_eq!(get(&router, "/admin/users").await.1, "/admin/users {}");
    assert_eq!(get(&router, "/users").await.0, StatusCode::NOT_FOUND);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn should_let_inner_params_replace_outer_ones() {
    let inner: Router<(), Infallible> = Router::builder().get("/:id", echo).build().unwrap();
    let router: Router<(), Infallible> = Router::builder().scope("/org/:id", inner).build().unwrap();

    assert_eq!(get(&router, "/org/1/2").await.1, "/2 {id: \"2\"}");
}

#[tokio::test]
async fn should_share_data_with_scoped_routers() {
    #[derive(Clone)]
    struct Greeting(&'static str);
    #[derive(Clone)]
    struct Limit(u32);

    async fn greet(ctx: RequestContext<()>) -> Result<Flow<()>, Infallible> {
        let greeting = ctx.data::<Greeting>().map(|g| g.0).unwrap_or("none");
        let limit = ctx.data::<Limit>().map(|l| l.0).unwrap_or(0);
        Ok(ctx.respond(text(format!("{} {}", greeting, limit))))
    }

    let inner: Router<(), Infallible> = Router::builder()
        .data(Greeting("inner"))
        .get("/hi", greet)
        .build()
        .unwrap();
    let router: Router<(), Infallible> = Router::builder()
        .data(Greeting("outer"))
        .data(Limit(10))
        .scope("/in", inner)
        .get("/hi", greet)
        .build()
        .unwrap();

    assert_eq!(get(&router, "/in/hi").await.1, "inner 10");
    assert_eq!(get(&router, "/hi").await.1, "outer 10");
}

#[tokio::test]
async fn should_pass_request_local_values_along_the_chain() {
    #[derive(Clone)]
    struct User(String);

    let router: Router<(), Infallible> = Router::builder()
        .add(
            "GET",
            "/me/:name",
            handlers![
                |mut ctx: RequestContext<()>| async move {
                    let name = ctx.param("name").unwrap_or_default().to_owned();
                    ctx.set_local(User(name));
                    Ok::<_, Infallible>(ctx.next())
                },
                |ctx: RequestContext<()>| async move {
                    let user = ctx.local::<User>().map(|u| u.0.clone()).unwrap_or_default();
                    Ok::<_, Infallible>(ctx.respond(text(user)))
                }
            ],
        )
        .build()
        .unwrap();

    assert_eq!(get(&router, "/me/ada").await.1, "ada");
}

#[tokio::test]
async fn should_keep_concurrent_requests_independent() {
    #[derive(Clone)]
    struct JobId(String);

    let gate = Arc::new(tokio::sync::Notify::new());
    let slow_done = Arc::new(AtomicBool::new(false));

    let finish = {
        let gate = gate.clone();
        let slow_done = slow_done.clone();
        move |ctx: RequestContext<()>| {
            let gate = gate.clone();
            let slow_done = slow_done.clone();
            async move {
                if ctx.param("id") == Some("slow") {
                    gate.notified().await;
                    slow_done.store(true, Ordering::SeqCst);
                }
                let job = ctx.local::<JobId>().map(|job| job.0.clone()).unwrap_or_default();
                let body = format!("{} {}", job, ctx.params());
                Ok::<_, Infallible>(ctx.respond(text(body)))
            }
        }
    };

    let router: Router<(), Infallible> = Router::builder()
        .add(
            "GET",
            "/jobs/:id",
            handlers![
                |mut ctx: RequestContext<()>| async move {
                    let id = ctx.param("id").unwrap_or_default().to_owned();
                    ctx.set_local(JobId(id));
                    Ok::<_, Infallible>(ctx.next())
                },
                finish
            ],
        )
        .build()
        .unwrap();

    // The slow request is parked inside its chain while the fast one runs start to finish.
    let (slow, fast) = tokio::join!(get(&router, "/jobs/slow"), async {
        let fast = get(&router, "/jobs/fast").await;
        assert!(!slow_done.load(Ordering::SeqCst));
        gate.notify_one();
        fast
    });

    assert_eq!(fast, (StatusCode::OK, "fast {id: \"fast\"}".to_owned()));
    assert_eq!(slow, (StatusCode::OK, "slow {id: \"slow\"}".to_owned()));
    assert!(slow_done.load(Ordering::SeqCst));
}

#[tokio::test]
async fn should_run_error_policy_once_and_skip_later_handlers() {
    let policy_runs = Arc::new(AtomicUsize::new(0));
    let later_runs = Arc::new(AtomicUsize::new(0));
    let (policy_counter, later_counter) = (policy_runs.clone(), later_runs.clone());

    let router: Router<(), std::io::Error> = Router::builder()
        .add(
            "GET",
            "/fail",
            handlers![
                |_: RequestContext<()>| async move {
                    Err::<Flow<()>, _>(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"))
                },
                move |ctx: RequestContext<()>| {
                    let counter = later_counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(ctx.next())
                    }
                }
            ],
        )
        .err_handler(move |err: RouteError| {
            let counter = policy_counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut res = text(format!("caught: {}", err));
                *res.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
                res
            }
        })
        .build()
        .unwrap();

    let (status, body) = get(&router, "/fail").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "caught: disk on fire");
    assert_eq!(policy_runs.load(Ordering::SeqCst), 1);
    assert_eq!(later_runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn should_route_panics_to_the_error_policy() {
    let router: Router<(), Infallible> = Router::builder()
        .get("/panic", |_: RequestContext<()>| async move {
            if true {
                panic!("handler blew up");
            }
            Ok(Flow::respond(text("unreachable")))
        })
        .err_handler_with_info(|err: RouteError, info: RequestInfo| async move {
            let panicked = matches!(err.downcast_ref::<Error>(), Some(Error::HandlerPanicked(_)));
            text(format!("{} {} {}", info.method(), info.uri().path(), panicked))
        })
        .build()
        .unwrap();

    assert_eq!(get(&router, "/panic").await.1, "GET /panic true");
}

#[tokio::test]
async fn should_use_only_the_root_routers_policies() {
    let inner: Router<(), String> = Router::builder()
        .get("/boom", |_: RequestContext<()>| async move { Err::<Flow<()>, _>("inner failure".to_owned()) })
        .err_handler(|_: RouteError| async move { text("inner policy") })
        .no_match_handler(|_: RequestInfo| async move { text("inner no match") })
        .build()
        .unwrap();
    let router: Router<(), String> = Router::builder()
        .scope("/in", inner)
        .err_handler(|err: RouteError| async move { text(format!("root policy: {}", err)) })
        .build()
        .unwrap();

    assert_eq!(get(&router, "/in/boom").await.1, "root policy: inner failure");
    assert_eq!(get(&router, "/in/missing").await, (StatusCode::NOT_FOUND, "Not Found".to_owned()));
}

#[tokio::test]
async fn should_use_custom_no_match_handler() {
    let router: Router<(), Infallible> = Router::builder()
        .get("/", echo)
        .no_match_handler(|info: RequestInfo| async move {
            let mut res = text(format!("nothing at {}", info.uri().path()));
            *res.status_mut() = StatusCode::NOT_FOUND;
            res
        })
        .build()
        .unwrap();

    assert_eq!(
        get(&router, "/missing").await,
        (StatusCode::NOT_FOUND, "nothing at /missing".to_owned())
    );
}

#[tokio::test]
async fn should_send_undecodable_paths_to_the_error_policy() {
    let router: Router<(), Infallible> = Router::builder()
        .get("/*", echo)
        .err_handler(|err: RouteError| async move {
            let decode = matches!(err.downcast_ref::<Error>(), Some(Error::PathDecode(_)));
            let mut res = text(decode.to_string());
            *res.status_mut() = StatusCode::BAD_REQUEST;
            res
        })
        .build()
        .unwrap();

    assert_eq!(get(&router, "/%FF").await, (StatusCode::BAD_REQUEST, "true".to_owned()));
}
