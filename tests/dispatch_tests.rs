//! Whole-pipeline tests through `RouteTable::handle`, no network.

use reef::{
    ABORTED_ERRMSG, Checker, Context, Envelope, Request, Router, Rule, RouteTable, Status, middleware,
};
use serde_json::{Value, json};

fn add(ctx: &mut Context) -> bool {
    let sum = ctx.int("a").unwrap_or(0) + ctx.int("b").unwrap_or(0);
    ctx.set_data(sum);
    true
}

fn table() -> RouteTable {
    Router::new()
        .route("/", |root| {
            root.filter(middleware::text("hello"))
                .child("ping", |r| r.filter(middleware::raw_text("pong")))
                .child("param", |r| r.filter(middleware::echo_params()))
                .child("math", |math| {
                    math.describe("arithmetic").child("add", |r| {
                        r.describe("a + b")
                            .input(Checker::new().rule("a", "int").rule("b", "int"))
                            .filter(add)
                    })
                })
                .child("bounded", |r| {
                    r.input(Checker::new().rule("a", "int").rule("b", "int"))
                        .output(
                            Checker::new()
                                .rule("status", Rule::in_status(&[]))
                                .rule("data", "int[,10]#10005"),
                        )
                        .filter(add)
                })
                .child("deny", |r| {
                    r.filter(|_: &mut Context| false)
                        .filter(|ctx: &mut Context| {
                            ctx.set_data("unreachable");
                            true
                        })
                })
                .child("users", |r| {
                    r.input(
                        Checker::new()
                            .nested("filter", Checker::new().rule("age", "int[18,]#10002"))
                            .rule("tag", "string{a,b,c}"),
                    )
                    .filter(middleware::echo_params())
                })
        })
        .build()
        .unwrap()
}

async fn call(table: &RouteTable, req: Request) -> Envelope {
    table.handle(req).await.to_envelope().unwrap()
}

#[tokio::test]
async fn add_success() {
    let res = table().handle(Request::new("localhost", "/math/add").query("a=2&b=3")).await;
    assert_eq!(res.http_status(), http::StatusCode::OK);
    assert_eq!(res.content_type(), Some("application/json"));
    assert_eq!(res.body(), br#"{"status":0,"data":5,"errmsg":""}"#);
}

#[tokio::test]
async fn add_rejects_non_int() {
    let env = call(&table(), Request::new("localhost", "/math/add").query("a=foo&b=3")).await;
    assert_eq!(env.status, Status::INVALID_PARAM);
    assert_eq!(env.data, Value::Null);
    assert!(env.errmsg.contains("`a`"));
}

#[tokio::test]
async fn add_rejects_missing_param() {
    let env = call(&table(), Request::new("localhost", "/math/add").query("a=1")).await;
    assert_eq!(env.status, Status::INVALID_PARAM);
    assert!(env.errmsg.contains("`b`"));
}

#[tokio::test]
async fn root_and_echo() {
    let table = table();
    let env = call(&table, Request::new("localhost", "/")).await;
    assert_eq!(env, Envelope { status: Status::SUCCESS, data: json!("hello"), errmsg: String::new() });

    let env = call(&table, Request::new("localhost", "/param").query(r#"x=1&obj={"k":[1,2]}&arr=[1,2]"#)).await;
    assert_eq!(env.data, json!({"x": "1", "obj": {"k": [1, 2]}, "arr": "[1,2]"}));
}

#[tokio::test]
async fn raw_pong() {
    let res = table().handle(Request::new("localhost", "/ping")).await;
    assert_eq!(res.body(), b"pong");
    assert!(res.to_envelope().is_none());
}

#[tokio::test]
async fn abort_without_status_is_unknown_error() {
    let env = call(&table(), Request::new("localhost", "/deny")).await;
    assert_eq!(env.status, Status::ERROR_UNKNOWN);
    assert_eq!(env.errmsg, ABORTED_ERRMSG);
    assert_eq!(env.data, Value::Null);
}

#[tokio::test]
async fn output_check_overrides_status_only() {
    let table = table();

    let env = call(&table, Request::new("h", "/bounded").query("a=2&b=3")).await;
    assert_eq!(env.status, Status::SUCCESS);
    assert_eq!(env.data, json!(5));

    let env = call(&table, Request::new("h", "/bounded").query("a=20&b=3")).await;
    assert_eq!(env.status, Status::app(10_005));
    assert_eq!(env.data, json!(23));
    assert_eq!(env.errmsg, "");
}

#[tokio::test]
async fn nested_input() {
    let table = table();

    let ok = Request::new("h", "/users").param("filter", json!({"age": 30})).param("tag", "b");
    assert_eq!(call(&table, ok).await.status, Status::SUCCESS);

    let young = Request::new("h", "/users").param("filter", json!({"age": 12})).param("tag", "b");
    let env = call(&table, young).await;
    assert_eq!(env.status, Status::app(10_002));
    assert!(env.errmsg.contains("filter.age"));

    let flat = Request::new("h", "/users").param("filter", "30").param("tag", "b");
    assert_eq!(call(&table, flat).await.status, Status::INVALID_PARAM);

    let tag = Request::new("h", "/users").param("filter", json!({"age": 30})).param("tag", "d");
    assert_eq!(call(&table, tag).await.status, Status::INVALID_PARAM);
}

#[tokio::test]
async fn doc_pages() {
    let table = table();

    let res = table.handle(Request::new("h", "/math/doc")).await;
    assert_eq!(res.http_status(), http::StatusCode::OK);
    assert_eq!(res.content_type(), Some("text/html; charset=utf-8"));
    let html = String::from_utf8(res.body().to_vec()).unwrap();
    assert!(html.contains("arithmetic"));
    assert!(html.contains("a + b"));
    assert!(!html.contains("hello"));

    let again = table.handle(Request::new("h", "/math/doc")).await;
    assert_eq!(res.body(), again.body());

    assert!(table.contains("/doc"));
    assert!(table.contains("/math/add/doc"));
}

#[tokio::test]
async fn unknown_path_is_404() {
    let table = table();
    for path in ["/nope", "/math/add/", "/math/sub", ""] {
        let res = table.handle(Request::new("h", path)).await;
        assert_eq!(res.http_status(), http::StatusCode::NOT_FOUND, "{path}");
        assert!(res.body().is_empty());
    }
}

#[test]
fn duplicate_paths_fail_to_build() {
    // Doc pages are registered first, so the clash surfaces on `/a/doc`.
    let dup = Router::new().route("/a", |r| r).route("a", |r| r).build();
    assert!(matches!(dup, Err(reef::Error::Route { ref path, .. }) if path == "/a/doc"));

    let doc_clash = Router::new().route("/a", |r| r.child("doc", |c| c)).build();
    assert!(matches!(doc_clash, Err(reef::Error::Route { ref path, .. }) if path == "/a/doc"));
}
