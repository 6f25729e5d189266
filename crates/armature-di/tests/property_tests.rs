//! Property-based tests for reference resolution and instance sharing

use proptest::prelude::*;

use armature_di::{args, ClassSpec, Container, DIError, Instance, ParamSpec, Reference};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
struct Payload {
    value: i64,
}

fn register_payload(container: &Container) {
    container
        .register_class(
            ClassSpec::builder("Payload")
                .constructor(vec![ParamSpec::required("value")], |_, args| {
                    let value = args[0].as_i64().unwrap_or_default();
                    Ok(Instance::new("Payload", Payload { value }))
                })
                .build(),
        )
        .unwrap();
}

// Top-level parameter names: no dots, so they never nest in the tree
fn arb_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,14}"
}

proptest! {
    /// Reference syntax round-trips through parse for any well-formed id
    #[test]
    fn reference_parsing_round_trips(id in "[a-z][a-z0-9_.]{0,14}") {
        let service = format!("@{id}@");
        prop_assert_eq!(
            Reference::parse(&service),
            Some(Reference::Service(id.clone()))
        );
        let parameter = format!("%{id}%");
        prop_assert_eq!(
            Reference::parse(&parameter),
            Some(Reference::Parameter(id))
        );
    }
}

proptest! {
    /// A parameter chain of any length under the depth cap resolves to the
    /// terminal literal
    #[test]
    fn parameter_chains_resolve_to_their_terminal(value in any::<i64>(), links in 1usize..7) {
        let container = Container::new();
        container.set("p0", json!(value));
        for i in 1..=links {
            container.set(&format!("p{i}"), json!(format!("%p{}%", i - 1)));
        }

        let resolved = container.resolve_parameter(&format!("p{links}")).unwrap();
        prop_assert_eq!(resolved.as_i64(), Some(value));
    }
}

proptest! {
    /// Two parameters referencing each other always trip the loop guard,
    /// never unbounded recursion
    #[test]
    fn mutual_parameter_references_are_loops(a in arb_id(), b in arb_id()) {
        prop_assume!(a != b);
        let container = Container::new();
        container.set(&a, json!(format!("%{b}%")));
        container.set(&b, json!(format!("%{a}%")));

        let result = container.resolve_parameter(&a);
        prop_assert!(
            matches!(result, Err(DIError::ReferenceLoop { .. })),
            "expected ReferenceLoop, got {:?}",
            result
        );
    }
}

proptest! {
    /// Shared services resolve to one identical instance however often they
    /// are requested
    #[test]
    fn shared_resolution_is_consistent(value in any::<i64>(), repeats in 2usize..6) {
        let container = Container::new();
        register_payload(&container);
        container.add("payload").class("Payload").arguments(args![value]);

        let first = container.get("payload").unwrap();
        for _ in 1..repeats {
            let next = container.get("payload").unwrap();
            prop_assert!(first.ptr_eq(&next));
        }
        prop_assert_eq!(
            first.downcast::<Payload>().unwrap().value,
            value
        );
        prop_assert_eq!(container.pooled_count(), 1);
    }
}

proptest! {
    /// `one` always builds fresh instances and never grows the pool
    #[test]
    fn one_builds_fresh_instances(value in any::<i64>(), repeats in 2usize..6) {
        let container = Container::new();
        register_payload(&container);
        container.add("payload").class("Payload").arguments(args![value]);

        let mut previous = container.one("payload", &[]).unwrap();
        for _ in 1..repeats {
            let next = container.one("payload", &[]).unwrap();
            prop_assert!(!previous.ptr_eq(&next));
            previous = next;
        }
        prop_assert_eq!(container.pooled_count(), 0);
    }
}

proptest! {
    /// Merging the same object twice leaves the parameter tree unchanged
    #[test]
    fn parameter_merge_is_idempotent(
        host in "[a-z]{1,10}",
        port in 1u16..,
        flag in any::<bool>()
    ) {
        let object = json!({"net": {"host": host, "port": port, "tls": flag}});
        let container = Container::new();
        container.merge_parameters(object.clone());
        let first = container.parameter("net").unwrap();
        container.merge_parameters(object);
        let second = container.parameter("net").unwrap();
        prop_assert_eq!(first, second);
    }
}

proptest! {
    /// Explicit arguments never disturb the pooled shared instance
    #[test]
    fn explicit_arguments_leave_the_pool_alone(
        base in any::<i64>(),
        other in any::<i64>()
    ) {
        prop_assume!(base != other);
        let container = Container::new();
        register_payload(&container);
        container.add("payload").class("Payload").arguments(args![base]);

        let pooled = container.get("payload").unwrap();
        let custom = container.get_with("payload", &args![other]).unwrap();
        prop_assert!(!pooled.ptr_eq(&custom));
        prop_assert_eq!(custom.downcast::<Payload>().unwrap().value, other);

        let again = container.get("payload").unwrap();
        prop_assert!(pooled.ptr_eq(&again));
        prop_assert_eq!(again.downcast::<Payload>().unwrap().value, base);
    }
}
