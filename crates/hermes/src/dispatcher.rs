//! Web and command dispatch.
//!
//! A web request is tokenized, looked up, run through the route's middleware
//! pipeline, bound and handed to its action. A command line takes the same
//! path with an arity check for recognized commands and no model binding.
//!
//! Recoverable failures (no route, binding and usage failures, unresolvable
//! handlers) are answered with an error response or command output. Faults
//! raised by middleware, validation rules or handlers come back as `Err`;
//! [`Application::handle`] and [`Application::run_command`] normalize those
//! too.

use std::time::Instant;

use hermes_bind::{usage_for, BindMode, Binder};
use hermes_core::{
    body_text, DispatchError, ErrorCategory, Invocation, ParamSpec, RequestContext, Response,
};
use hermes_router::{Captures, RequestKind, RouteEntry};
use hermes_telemetry::{record_dispatch, DispatchOutcome};
use http::{HeaderMap, Method};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, error, info_span, warn};

use crate::application::Application;
use crate::command::{CommandLine, CommandOutput};

/// An incoming web request, already decoded by the transport.
#[derive(Debug, Clone)]
pub struct WebRequest {
    method: Method,
    path: String,
    input: IndexMap<String, Value>,
    headers: HeaderMap,
}

impl WebRequest {
    /// Creates a request without input or headers.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            input: IndexMap::new(),
            headers: HeaderMap::new(),
        }
    }

    /// A `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// A `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Adds one input field.
    #[must_use]
    pub fn input(mut self, field: impl Into<String>, value: Value) -> Self {
        self.input.insert(field.into(), value);
        self
    }

    /// Replaces the input batch.
    #[must_use]
    pub fn with_input(mut self, input: IndexMap<String, Value>) -> Self {
        self.input = input;
        self
    }

    /// Replaces the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// The request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// The request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Application {
    /// Dispatches a web request.
    ///
    /// A miss answers with the fallback when one is registered, else a 404
    /// error response.
    ///
    /// # Errors
    ///
    /// Returns middleware, validation setup and handler faults unchanged.
    pub fn dispatch_web(&self, request: WebRequest) -> Result<Response, DispatchError> {
        let WebRequest {
            method,
            path,
            input,
            headers,
        } = request;
        let started = Instant::now();
        let kind = RequestKind::http(method);
        let ctx = RequestContext::new(kind.clone(), path.as_str())
            .with_input(input)
            .with_headers(headers);

        let span = info_span!("dispatch", request_id = %ctx.request_id(), kind = %kind, path = %path);
        let _entered = span.enter();

        let tokens = kind.tokenize(&path);
        let (result, matched) = match self.routes.lookup(&kind, &tokens) {
            Some(found) => {
                let (route, captures) = found.into_parts();
                (self.run_route(route, ctx.with_captures(captures), BindMode::Web), true)
            }
            None => match &self.fallback {
                Some(fallback) => {
                    warn!("no route matched, answering with fallback");
                    (Ok(fallback(&ctx)), false)
                }
                None => (Err(DispatchError::route_not_found(&kind, path.as_str())), false),
            },
        };

        let (result, outcome) = match result {
            Ok(response) => {
                let outcome = if matched {
                    DispatchOutcome::Handled
                } else {
                    DispatchOutcome::NotFound
                };
                (Ok(response), outcome)
            }
            Err(err) if err.is_recoverable() => {
                warn!(error = %err, status = err.status_code().as_u16(), "request rejected");
                (Ok(err.to_response()), rejection(&err))
            }
            Err(err) => {
                error!(error = %err, "dispatch failed");
                (Err(err), DispatchOutcome::Failed)
            }
        };

        record_dispatch(&kind.to_string(), outcome, started.elapsed());
        result
    }

    /// Dispatches a web request and renders any error as a JSON error
    /// response.
    pub fn handle(&self, request: WebRequest) -> Response {
        self.dispatch_web(request)
            .unwrap_or_else(|err| err.to_response())
    }

    /// Dispatches a command line (argv without the program name).
    ///
    /// The matched command, or the first one whose leading words match, is
    /// checked for arity before anything runs: fewer positional tokens than
    /// the handler requires is a usage failure naming the required count.
    /// Tokens past the leading words of a command that did not match
    /// exactly may not exceed the handler's positional parameters. Captured
    /// pattern variables are always accepted, since entity parameters can
    /// consume them too.
    ///
    /// # Errors
    ///
    /// Returns middleware, validation setup and handler faults unchanged.
    pub fn dispatch_command<I, S>(&self, argv: I) -> Result<CommandOutput, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let started = Instant::now();
        let line = CommandLine::parse(argv);
        let text = line.line();
        let (positional, options) = line.into_parts();
        let kind = self.console.clone();
        let ctx = RequestContext::new(kind.clone(), text.as_str()).with_options(options);

        let span = info_span!("dispatch", request_id = %ctx.request_id(), kind = %kind, path = %text);
        let _entered = span.enter();

        let tokens: Vec<&str> = positional.iter().map(String::as_str).collect();
        let result = if tokens.is_empty() {
            Err(DispatchError::usage(self.command_listing("No command given.")))
        } else {
            self.route_command(&kind, &tokens, ctx)
        };

        let (result, outcome) = match result {
            Ok(response) => {
                let text = body_text(&response);
                let output = if response.status().is_success() {
                    CommandOutput::success(text)
                } else {
                    CommandOutput::failure(text)
                };
                (Ok(output), DispatchOutcome::Handled)
            }
            Err(err) if err.is_recoverable() => {
                warn!(error = %err, "command rejected");
                (Ok(command_failure(&err)), rejection(&err))
            }
            Err(err) => {
                error!(error = %err, "command failed");
                (Err(err), DispatchOutcome::Failed)
            }
        };

        record_dispatch(&kind.to_string(), outcome, started.elapsed());
        result
    }

    /// Dispatches a command line and renders any error as failure output.
    pub fn run_command<I, S>(&self, argv: I) -> CommandOutput
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.dispatch_command(argv)
            .unwrap_or_else(|err| CommandOutput::failure(err.to_string()))
    }

    fn route_command(
        &self,
        kind: &RequestKind,
        tokens: &[&str],
        mut ctx: RequestContext,
    ) -> Result<Response, DispatchError> {
        // An exact match already holds its tokens as captures; a head match
        // leaves everything after the leading words to bind by position.
        let (route, exact) = match self.routes.lookup(kind, tokens) {
            Some(found) => {
                let (route, captures) = found.into_parts();
                (route, Some(captures))
            }
            None => match self.routes.find_by_head(kind, tokens) {
                Some(route) => (route, None),
                None => return Err(DispatchError::route_not_found(kind, ctx.path())),
            },
        };
        let (_, action) = self.handlers.resolve(route.handler())?;

        let head = route.pattern().literal_head().len();
        let remaining = &tokens[head..];
        let given = exact.as_ref().map_or(remaining.len(), Captures::len);
        let required = action.required_positional();
        let total = action.total_positional();
        let usage = route.pattern().source();

        if given < required {
            return Err(DispatchError::usage(format!(
                "Not enough arguments: {required} required, {given} given. Usage: {usage}"
            )));
        }

        if let Some(captures) = exact {
            return self.run_route(route, ctx.with_captures(captures), BindMode::Command);
        }

        if given > total {
            return Err(DispatchError::usage(format!(
                "Too many arguments: at most {total} accepted, {given} given. Usage: {usage}"
            )));
        }

        let variables: Vec<&str> = route.pattern().variables().collect();
        if variables.is_empty() {
            let names = action
                .params()
                .iter()
                .filter(|p| p.is_positional())
                .map(ParamSpec::name);
            for (name, token) in names.zip(remaining) {
                ctx.set_capture(name, *token);
            }
        } else {
            for (name, token) in variables.into_iter().zip(remaining) {
                ctx.set_capture(name, *token);
            }
        }

        self.run_route(route, ctx, BindMode::Command)
    }

    fn run_route(
        &self,
        route: &RouteEntry,
        mut ctx: RequestContext,
        mode: BindMode,
    ) -> Result<Response, DispatchError> {
        let (controller, action) = self.handlers.resolve(route.handler())?;
        let pipeline = self.middleware.resolve(route.middleware())?;
        ctx.set_route(route.pattern().source(), route.handler().clone());
        debug!(
            handler = %route.handler(),
            pattern = route.pattern().source(),
            stages = pipeline.stage_count(),
            "route matched"
        );

        let mut ctx = pipeline.run(ctx)?;

        let binder = Binder::new(&self.services, &self.entities)
            .with_persistence(self.persistence.as_deref());
        let dependencies = binder.bind_dependencies(controller.dependencies(), controller.name())?;
        let usage = usage_for(route.kind(), route.pattern().source());
        let arguments = binder.bind_action(action.params(), &mut ctx, mode, &usage)?;

        let response = action.invoke(Invocation::new(&ctx, dependencies, arguments))?;
        debug!(status = response.status().as_u16(), "handler answered");
        Ok(response)
    }

    fn command_listing(&self, headline: &str) -> String {
        let mut text = format!("{headline}\nAvailable commands:");
        for route in self.routes.routes(&self.console) {
            text.push_str("\n  ");
            text.push_str(route.pattern().source());
        }
        text
    }
}

fn rejection(err: &DispatchError) -> DispatchOutcome {
    if err.category() == ErrorCategory::NotFound {
        DispatchOutcome::NotFound
    } else {
        DispatchOutcome::Rejected
    }
}

fn command_failure(err: &DispatchError) -> CommandOutput {
    match err {
        DispatchError::RouteNotFound { path, .. } => {
            CommandOutput::failure(format!("Command \"{path}\" is not defined."))
        }
        _ if err.category() == ErrorCategory::Usage => CommandOutput::usage(err.to_string()),
        _ => CommandOutput::failure(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{Action, Controller, ScalarType};
    use serde_json::json;

    fn app() -> Application {
        Application::builder()
            .controller(
                Controller::new("posts")
                    .action(Action::new(
                        "show",
                        vec![ParamSpec::scalar("post", ScalarType::Int)],
                        |inv| Ok(json!({ "post": inv.arguments().value("post") })),
                    ))
                    .action(Action::new(
                        "sum",
                        vec![
                            ParamSpec::scalar("a", ScalarType::Int),
                            ParamSpec::scalar("b", ScalarType::Int).with_default(json!(0)),
                        ],
                        |inv| {
                            let a: i64 = inv.arguments().get("a")?;
                            let b: i64 = inv.arguments().get("b")?;
                            Ok((a + b).to_string())
                        },
                    )),
            )
            .web(Method::GET, "/posts/{post}", "posts", "show", &[])
            .command("sum", "posts", "sum", &[])
            .boot()
            .unwrap()
    }

    #[test]
    fn test_web_request_builder() {
        let request = WebRequest::post("/posts").input("title", json!("hi"));
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/posts");
    }

    #[test]
    fn test_dispatch_web_binds_capture() {
        let response = app().dispatch_web(WebRequest::get("/posts/7")).unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(body_text(&response), r#"{"post":7}"#);
    }

    #[test]
    fn test_trailing_slash_matches() {
        let response = app().dispatch_web(WebRequest::get("/posts/7/")).unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
    }

    #[test]
    fn test_miss_is_404() {
        let response = app().dispatch_web(WebRequest::get("/nope")).unwrap();
        assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_positional_tokens_bind_in_order() {
        let output = app().run_command(["sum", "2", "3"]);
        assert_eq!(output, CommandOutput::success("5"));

        let output = app().run_command(["sum", "2"]);
        assert_eq!(output, CommandOutput::success("2"));
    }

    #[test]
    fn test_arity_errors() {
        let output = app().run_command(["sum"]);
        assert_eq!(output.status, crate::command::EXIT_USAGE);
        assert!(output.text.contains("1 required, 0 given"));

        let output = app().run_command(["sum", "1", "2", "3"]);
        assert_eq!(output.status, crate::command::EXIT_USAGE);
        assert!(output.text.contains("at most 2 accepted, 3 given"));
    }

    #[test]
    fn test_unknown_command() {
        let output = app().run_command(["deploy", "now"]);
        assert_eq!(output, CommandOutput::failure("Command \"deploy now\" is not defined."));
    }

    #[test]
    fn test_empty_command_lists_commands() {
        let output = app().run_command(Vec::<String>::new());
        assert_eq!(output.status, crate::command::EXIT_USAGE);
        assert!(output.text.contains("  sum"));
    }
}
