//! End-to-end web dispatch: routing, middleware, validation, model binding.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hermes::core::fixtures::MemoryPersistence;
use hermes::middleware::stages::validation::VALID_ATTRIBUTE;
use hermes::prelude::*;
use http::{Method, StatusCode};
use serde_json::{json, Value};

struct Mailer {
    sent: AtomicUsize,
}

fn store() -> Arc<MemoryPersistence> {
    let mut store = MemoryPersistence::new();
    store.insert("user", "id", json!({"id": 1, "email": "ada@example.com", "name": "Ada"}));
    store.insert("user", "id", json!({"id": 2, "email": "alan@example.com", "name": "Alan"}));
    Arc::new(store)
}

fn users() -> Controller {
    Controller::new("users")
        .depends_on(ParamSpec::service::<Mailer>("mailer"))
        .action(Action::new(
            "show",
            vec![ParamSpec::entity("user", "user")],
            |inv| Ok(inv.arguments().value("user").unwrap_or(Value::Null)),
        ))
        .action(Action::new(
            "search",
            vec![ParamSpec::scalar("q", ScalarType::String)],
            |inv| Ok(inv.arguments().get::<String>("q")?),
        ))
        .action(Action::new(
            "invite",
            vec![
                ParamSpec::context("request"),
                ParamSpec::entity("user", "user"),
            ],
            |inv| {
                let ctx = inv
                    .context()
                    .ok_or_else(|| DispatchError::handler("no context"))?;
                let mailer = inv
                    .dependencies()
                    .service::<Mailer>("mailer")
                    .ok_or_else(|| DispatchError::handler("no mailer"))?;
                let outcome = ctx
                    .validation()
                    .cloned()
                    .ok_or_else(|| DispatchError::handler("input not validated"))?;
                if !outcome.passed() {
                    return json(StatusCode::UNPROCESSABLE_ENTITY, &outcome.into_messages());
                }
                mailer.sent.fetch_add(1, Ordering::Relaxed);
                let name = inv
                    .arguments()
                    .entity("user")
                    .and_then(|u| u.get("name"))
                    .cloned()
                    .unwrap_or(Value::Null);
                json(StatusCode::OK, &json!({ "invited": name }))
            },
        ))
        .action(Action::new("explode", vec![], |_| {
            Err::<String, _>(DispatchError::handler("boom"))
        }))
}

fn app(persistence: Arc<MemoryPersistence>, mailer: Arc<Mailer>) -> Application {
    Application::builder()
        .persistence(persistence)
        .service(mailer)
        .entity("user", "id")
        .controller(users())
        .middleware(FnMiddleware::new("deny", |_ctx: RequestContext| {
            Err(DispatchError::middleware("deny", "access denied"))
        }))
        .validation_stage(
            "validate-invite",
            RuleSet::new()
                .field_str("email", "required|regex:email|!unique:user:email")
                .message("email.!unique", ":attribute is not a registered user"),
        )
        .web(Method::GET, "/users/{user}", "users", "show", &[])
        .web(Method::GET, "/search", "users", "search", &[])
        .web(Method::POST, "/users/{user}/invite", "users", "invite", &["validate-invite"])
        .web(Method::GET, "/admin", "users", "search", &["deny"])
        .web(Method::GET, "/ghost", "users", "search", &["ghost"])
        .web(Method::GET, "/orphan", "nobody", "nothing", &[])
        .web(Method::GET, "/explode", "users", "explode", &[])
        .boot()
        .unwrap()
}

fn mailer() -> Arc<Mailer> {
    Arc::new(Mailer {
        sent: AtomicUsize::new(0),
    })
}

fn error_code(response: &Response) -> String {
    let body: Value = serde_json::from_str(&body_text(response)).unwrap();
    body["error"]["code"].as_str().unwrap_or_default().to_string()
}

#[test]
fn test_model_binding_loads_entity() {
    let store = store();
    let app = app(Arc::clone(&store), mailer());

    let response = app.dispatch_web(WebRequest::get("/users/2")).unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(&response)).unwrap();
    assert_eq!(body["name"], json!("Alan"));
    assert_eq!(store.lookups(), 1);
}

#[test]
fn test_missing_entity_is_404() {
    let app = app(store(), mailer());

    let response = app.dispatch_web(WebRequest::get("/users/99")).unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_unmatched_path_is_404() {
    let app = app(store(), mailer());

    let response = app.dispatch_web(WebRequest::get("/nowhere/at/all")).unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_method_is_part_of_the_match() {
    let app = app(store(), mailer());

    let response = app.dispatch_web(WebRequest::post("/users/1")).unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_fallback_answers_misses() {
    let app = Application::builder()
        .fallback(|ctx| text_response(StatusCode::IM_A_TEAPOT, format!("nothing at {}", ctx.path())))
        .boot()
        .unwrap();

    let response = app.dispatch_web(WebRequest::get("/tea")).unwrap();

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(body_text(&response), "nothing at /tea");
}

#[test]
fn test_missing_argument_is_400() {
    let app = app(store(), mailer());

    let response = app.dispatch_web(WebRequest::get("/search")).unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(&response).contains("'q'"));
}

#[test]
fn test_unregistered_middleware_is_500() {
    let app = app(store(), mailer());

    let response = app.dispatch_web(WebRequest::get("/ghost")).unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_unregistered_controller_is_500() {
    let app = app(store(), mailer());

    let response = app.dispatch_web(WebRequest::get("/orphan")).unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_middleware_error_propagates() {
    let app = app(store(), mailer());

    let err = app.dispatch_web(WebRequest::get("/admin")).unwrap_err();
    assert!(matches!(err, DispatchError::Middleware { ref stage, .. } if stage == "deny"));

    let response = app.handle(WebRequest::get("/admin"));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_handler_fault_propagates() {
    let app = app(store(), mailer());

    assert!(app.dispatch_web(WebRequest::get("/explode")).is_err());

    let response = app.handle(WebRequest::get("/explode"));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!error_code(&response).is_empty());
}

#[test]
fn test_validated_invite_reuses_bound_entity() {
    let store = store();
    let mailer = mailer();
    let app = app(Arc::clone(&store), Arc::clone(&mailer));

    let response = app
        .dispatch_web(WebRequest::post("/users/1/invite").input("email", json!("ada@example.com")))
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(&response), r#"{"invited":"Ada"}"#);
    assert_eq!(mailer.sent.load(Ordering::Relaxed), 1);
    // `unique` cached the user, so model binding did not look it up again.
    assert_eq!(store.lookups(), 1);
}

#[test]
fn test_invite_with_unknown_email_fails_validation() {
    let mailer = mailer();
    let app = app(store(), Arc::clone(&mailer));

    let response = app
        .dispatch_web(WebRequest::post("/users/1/invite").input("email", json!("eve@example.com")))
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = serde_json::from_str(&body_text(&response)).unwrap();
    assert_eq!(body["email"], json!("email is not a registered user"));
    assert_eq!(mailer.sent.load(Ordering::Relaxed), 0);
}

#[test]
fn test_validation_stage_marks_context() {
    let app = Application::builder()
        .validation_stage("check", RuleSet::new().field_str("title", "required|min:3"))
        .controller(Controller::new("posts").action(Action::new(
            "store",
            vec![ParamSpec::context("request")],
            |inv| {
                let ctx = inv
                    .context()
                    .ok_or_else(|| DispatchError::handler("no context"))?;
                Ok(ctx.attribute(VALID_ATTRIBUTE).cloned().unwrap_or(Value::Null))
            },
        )))
        .web(Method::POST, "/posts", "posts", "store", &["check"])
        .boot()
        .unwrap();

    let ok = app.handle(WebRequest::post("/posts").input("title", json!("Hello")));
    assert_eq!(body_text(&ok), "true");

    let short = app.handle(WebRequest::post("/posts").input("title", json!("Hi")));
    assert_eq!(body_text(&short), "false");
}

#[test]
fn test_unknown_rule_propagates() {
    let app = Application::builder()
        .validation_stage("check", RuleSet::new().field_str("title", "shiny"))
        .controller(Controller::new("posts").action(Action::new("store", vec![], |_| Ok("stored"))))
        .web(Method::POST, "/posts", "posts", "store", &["check"])
        .boot()
        .unwrap();

    let err = app
        .dispatch_web(WebRequest::post("/posts").input("title", json!("x")))
        .unwrap_err();

    assert!(matches!(err, DispatchError::UnknownValidationRule { .. }));
}

#[test]
fn test_global_middleware_runs_first() {
    let app = Application::builder()
        .global_middleware(["stamp"])
        .middleware(FnMiddleware::new("stamp", |mut ctx: RequestContext| {
            ctx.set_attribute("trail", json!("stamp"));
            Ok(ctx)
        }))
        .middleware(FnMiddleware::new("extend", |mut ctx: RequestContext| {
            let trail = ctx
                .attribute("trail")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            ctx.set_attribute("trail", json!(format!("{trail},extend")));
            Ok(ctx)
        }))
        .controller(Controller::new("trail").action(Action::new(
            "show",
            vec![ParamSpec::context("request")],
            |inv| {
                let ctx = inv
                    .context()
                    .ok_or_else(|| DispatchError::handler("no context"))?;
                Ok(ctx.attribute("trail").cloned().unwrap_or(Value::Null))
            },
        )))
        .web(Method::GET, "/trail", "trail", "show", &["extend"])
        .boot()
        .unwrap();

    let response = app.handle(WebRequest::get("/trail"));

    assert_eq!(body_text(&response), r#""stamp,extend""#);
}
