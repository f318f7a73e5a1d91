//! Registry tests against real component types

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use httpmux_client::{
    AssemblyError, ComponentKey, ComponentKind, ObjectMapper, Registrar, Registry,
};
use pretty_assertions::assert_eq;
use tests::{collaborators, default_collaborators, ClientSettings, Settings};

#[test]
fn test_second_builder_is_never_invoked() {
    let registry = Registry::new();
    let calls = AtomicUsize::new(0);
    let key = ComponentKey::global(ComponentKind::ObjectMapper);

    let first = registry
        .register(key.clone(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(ObjectMapper::new("first"))
        })
        .unwrap();
    let second = registry
        .register(key, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(ObjectMapper::new("second"))
        })
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.name(), "first");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_key_of_another_type_is_a_mismatch() {
    let registry = Registry::new();
    let key = ComponentKey::client("orders", ComponentKind::ObjectMapper);
    registry
        .register(key.clone(), || Ok(ObjectMapper::new("orders")))
        .unwrap();

    let err = registry
        .register(key, || Ok(String::from("not a mapper")))
        .unwrap_err();

    assert!(matches!(
        err,
        AssemblyError::TypeMismatch { ref name, .. } if name == "ordersObjectMapper"
    ));
}

#[test]
fn test_component_names_follow_client_id() {
    let settings = Settings::default()
        .with_client("order-service", ClientSettings::default())
        .with_client("billing", ClientSettings::default());
    let collaborators = default_collaborators();
    let registry = Registry::new();

    Registrar::new(&registry, &settings, &collaborators)
        .register()
        .unwrap();

    let names = registry.names();
    assert!(names.contains(&"orderServiceHttpClient".to_string()));
    assert!(names.contains(&"orderServiceSyncTemplate".to_string()));
    assert!(names.contains(&"billingAsyncTemplate".to_string()));
    assert_eq!(
        names.iter().filter(|n| n.as_str() == "taskExecutor").count(),
        1
    );
    registry.teardown();
}

#[test]
fn test_repeated_pass_builds_nothing_new() {
    let settings = Settings::default()
        .with_client("orders", ClientSettings::default())
        .with_client("billing", ClientSettings::default());
    let collaborators = default_collaborators();
    let registry = Registry::new();
    let registrar = Registrar::new(&registry, &settings, &collaborators);

    let first = registrar.register().unwrap();
    let count = registry.len();
    let second = registrar.register().unwrap();

    assert_eq!(registry.len(), count);
    assert!(Arc::ptr_eq(&first["orders"].http, &second["orders"].http));
    assert!(Arc::ptr_eq(
        &first["billing"].sync_template,
        &second["billing"].sync_template
    ));
    registry.teardown();
}

#[test]
fn test_provided_mapper_wins_over_default() {
    let mapper = Arc::new(ObjectMapper::new("custom"));
    let collaborators = collaborators()
        .with_client_object_mapper("orders", mapper.clone())
        .build()
        .unwrap();
    let settings = Settings::default().with_client("orders", ClientSettings::default());
    let registry = Registry::new();

    let clients = Registrar::new(&registry, &settings, &collaborators)
        .register()
        .unwrap();

    let stored = registry
        .get::<ObjectMapper>(&ComponentKey::client("orders", ComponentKind::ObjectMapper))
        .unwrap();
    assert!(Arc::ptr_eq(&stored, &mapper));
    assert_eq!(
        clients["orders"].http.converters().json_mapper().unwrap().name(),
        "custom"
    );
    // No client needed the shared mapper
    assert!(!registry.contains(&ComponentKey::global(ComponentKind::ObjectMapper)));
    registry.teardown();
}
