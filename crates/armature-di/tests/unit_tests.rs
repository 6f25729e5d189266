//! Unit tests for the container's registration and resolution surface

use std::sync::{Arc, Mutex};

use armature_di::{
    args, Argument, ClassSpec, Container, DIError, ErrorKind, Instance, ParamSpec, ServiceScope,
    Value,
};
use serde_json::json;

struct Database {
    dsn: String,
}

struct Logger {
    level: Mutex<String>,
}

fn register_database(container: &Container) {
    container
        .register_class(
            ClassSpec::builder("Database")
                .constructor(vec![ParamSpec::required("dsn")], |_, args| {
                    let dsn = args[0].as_str().unwrap_or_default().to_string();
                    Ok(Instance::new("Database", Database { dsn }))
                })
                .build(),
        )
        .unwrap();
}

fn register_logger(container: &Container) {
    container
        .register_class(
            ClassSpec::builder("Logger")
                .nullary(|| {
                    Instance::new(
                        "Logger",
                        Logger {
                            level: Mutex::new("info".to_string()),
                        },
                    )
                })
                .method(
                    "set_level",
                    vec![ParamSpec::required("level")],
                    |instance, args| {
                        let logger = instance.downcast::<Logger>().unwrap();
                        *logger.level.lock().unwrap() =
                            args[0].as_str().unwrap_or_default().to_string();
                        Ok(Value::Json(serde_json::Value::Null))
                    },
                )
                .build(),
        )
        .unwrap();
}

#[test]
fn resolves_a_class_service_with_parameter_arguments() {
    let container = Container::new();
    register_database(&container);
    container.set("db.dsn", "postgres://localhost");
    container.add("db").class("Database").arguments(args!["%db.dsn%"]);

    let db = container.get("db").unwrap();
    assert_eq!(db.type_name(), "Database");
    assert_eq!(db.downcast::<Database>().unwrap().dsn, "postgres://localhost");
}

#[test]
fn shared_scope_returns_the_same_instance() {
    let container = Container::new();
    register_database(&container);
    container.add("db").class("Database").arguments(args!["x"]);

    let first = container.get("db").unwrap();
    let second = container.get("db").unwrap();
    assert!(first.ptr_eq(&second));
    assert_eq!(container.pooled_count(), 1);
}

#[test]
fn single_scope_always_builds_fresh() {
    let container = Container::new();
    register_database(&container);
    container
        .add("db")
        .class("Database")
        .arguments(args!["x"])
        .scope(ServiceScope::Single);

    let first = container.get("db").unwrap();
    let second = container.get("db").unwrap();
    assert!(!first.ptr_eq(&second));
    assert_eq!(container.pooled_count(), 0);
}

#[test]
fn one_bypasses_the_declared_scope() {
    let container = Container::new();
    register_database(&container);
    container.add("db").class("Database").arguments(args!["x"]);

    let shared = container.get("db").unwrap();
    let fresh = container.one("db", &[]).unwrap();
    assert!(!shared.ptr_eq(&fresh));

    // The shared entry is untouched
    let again = container.get("db").unwrap();
    assert!(shared.ptr_eq(&again));
}

#[test]
fn explicit_arguments_bypass_the_pool() {
    let container = Container::new();
    register_database(&container);
    container.add("db").class("Database").arguments(args!["default"]);

    let pooled = container.get("db").unwrap();
    let custom = container.get_with("db", &args!["override"]).unwrap();
    assert!(!pooled.ptr_eq(&custom));
    assert_eq!(custom.downcast::<Database>().unwrap().dsn, "override");
    assert_eq!(container.pooled_count(), 1);

    let pooled_again = container.get("db").unwrap();
    assert!(pooled.ptr_eq(&pooled_again));
}

#[test]
fn unknown_ids_are_not_found() {
    let container = Container::new();
    let missing = container.get("nope");
    assert!(matches!(
        missing,
        Err(DIError::ServiceNotFound { ref id }) if id == "nope"
    ));
    assert_eq!(missing.unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn has_autowires_ids_naming_registered_classes() {
    let container = Container::new();
    register_logger(&container);

    assert!(container.has("Logger"));
    assert_eq!(container.service_count(), 1);
    let logger = container.get("Logger").unwrap();
    assert_eq!(logger.type_name(), "Logger");
}

#[test]
fn autowiring_can_be_disabled() {
    let container = Container::builder().autowiring(false).build();
    register_logger(&container);

    assert!(!container.has("Logger"));
    assert!(matches!(
        container.get("Logger"),
        Err(DIError::ServiceNotFound { .. })
    ));
}

#[test]
fn method_calls_run_in_declaration_order() {
    let container = Container::new();
    register_logger(&container);
    container
        .add("log")
        .class("Logger")
        .method("set_level", args!["warn"])
        .method("set_level", args!["debug"]);

    let logger = container.get("log").unwrap();
    let logger = logger.downcast::<Logger>().unwrap();
    assert_eq!(*logger.level.lock().unwrap(), "debug");
}

#[test]
fn empty_method_names_are_malformed() {
    let container = Container::new();
    register_logger(&container);
    container.add("log").class("Logger").method("", args![]);

    assert!(matches!(
        container.get("log"),
        Err(DIError::MalformedMethodCall { id }) if id == "log"
    ));
}

#[test]
fn unknown_methods_are_reported_with_their_class() {
    let container = Container::new();
    register_logger(&container);
    container.add("log").class("Logger").method("rotate", args![]);

    assert!(matches!(
        container.get("log"),
        Err(DIError::MethodNotFound { class, method })
            if class == "Logger" && method == "rotate"
    ));
}

#[test]
fn alias_services_share_the_target_instance() {
    let container = Container::new();
    register_database(&container);
    container.add("db").class("Database").arguments(args!["x"]);
    container.add_target("primary", "@db@");

    let direct = container.get("db").unwrap();
    let aliased = container.get("primary").unwrap();
    assert!(direct.ptr_eq(&aliased));
    // Pool bookkeeping belongs to the alias target
    assert_eq!(container.pooled_count(), 1);
}

#[test]
fn wrong_typed_positional_argument_with_exact_arity_fails() {
    let container = Container::new();
    container
        .register_class(
            ClassSpec::builder("Repository")
                .constructor(vec![ParamSpec::of_class("db", "Database")], |_, args| {
                    let db = args[0].as_instance().unwrap().downcast::<Database>().unwrap();
                    Ok(Instance::new("Repository", db))
                })
                .build(),
        )
        .unwrap();
    container.add("repo").class("Repository");

    let result = container.get_with("repo", &args![42]);
    assert!(matches!(
        result,
        Err(DIError::ParameterTypeWrong { name, expected, .. })
            if name == "db" && expected == "Database"
    ));
}

#[test]
fn parameter_chains_resolve_through_the_container() {
    let container = Container::new();
    container.set("db.primary.dsn", "sqlite::memory:");
    container.set("db.active", "%db.primary.dsn%");

    assert_eq!(
        container.parameter("db.active").unwrap(),
        json!("%db.primary.dsn%")
    );
    let resolved = container.resolve_parameter("db.active").unwrap();
    assert_eq!(resolved.as_str(), Some("sqlite::memory:"));
}

#[test]
fn reference_depth_is_bounded_by_configuration() {
    let container = Container::builder().max_reference_depth(2).build();
    container.set("a", "%b%");
    container.set("b", "%c%");
    container.set("c", "end");

    let result = container.resolve_parameter("a");
    assert!(matches!(result, Err(DIError::ReferenceLoop { .. })));

    let relaxed = Container::new();
    relaxed.set("a", "%b%");
    relaxed.set("b", "%c%");
    relaxed.set("c", "end");
    assert_eq!(
        relaxed.resolve_parameter("a").unwrap().as_str(),
        Some("end")
    );
}

#[test]
fn container_stays_usable_after_a_failed_resolution() {
    let container = Container::new();
    register_database(&container);
    container.add("db").class("Database").arguments(args!["x"]);
    container.add("broken").class("Missing");

    assert!(matches!(
        container.get("broken"),
        Err(DIError::ClassNotFound { name }) if name == "Missing"
    ));
    assert!(container.is_idle());
    assert!(container.get("db").is_ok());
}

#[test]
fn pre_built_instances_pass_through_arguments() {
    let container = Container::new();
    container
        .register_class(
            ClassSpec::builder("Holder")
                .constructor(vec![ParamSpec::of_class("db", "Database")], |_, args| {
                    let db = args[0].as_instance().unwrap().downcast::<Database>().unwrap();
                    Ok(Instance::new("Holder", db))
                })
                .build(),
        )
        .unwrap();
    container.add("holder").class("Holder");

    let db = Instance::new(
        "Database",
        Database {
            dsn: "handmade".to_string(),
        },
    );
    let holder = container
        .get_with("holder", &[Argument::from(db.clone())])
        .unwrap();
    let held = holder.downcast::<Arc<Database>>().unwrap();
    assert_eq!(held.dsn, "handmade");
    assert!(db.downcast::<Database>().unwrap().dsn == held.dsn);
}
