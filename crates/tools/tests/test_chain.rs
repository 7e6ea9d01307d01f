//! Tests for sequential tool chains

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use armory_config::{ChainConfig, StepConfig};
use armory_tools::{ChainError, ToolChain, ToolRegistry};

fn registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register_function("double", "Repeat the input twice.", |i| Ok(i.repeat(2)));
    registry.register_function("upper", "Uppercase the input.", |i| Ok(i.to_uppercase()));
    registry.register_function("fail", "Always fails.", |_| Err("broken".into()));
    registry
}

#[test]
fn test_double_then_upper() {
    let chain = ToolChain::new("demo", "double then upper")
        .add_step("double", "{input}", "d")
        .add_step("upper", "{d}", "u");

    let context = chain.execute(&registry(), "ab").unwrap();

    assert_eq!(context.len(), 3);
    assert_eq!(context.get("input"), Some("ab"));
    assert_eq!(context.get("d"), Some("abab"));
    assert_eq!(context.get("u"), Some("ABAB"));
    assert_eq!(context.last_output(), Some("ABAB"));
    assert_eq!(context.input(), "ab");
}

#[test]
fn test_context_visible_to_later_templates() {
    let mut registry = registry();
    registry.register_function("echo", "Echo.", |i| Ok(i.to_string()));

    let chain = ToolChain::new("vis", "")
        .add_step("upper", "{input}", "a")
        .add_step("echo", "{a}-more", "b");

    let context = chain.execute(&registry, "x").unwrap();
    assert_eq!(context.get("b"), Some("X-more"));
}

#[test]
fn test_failed_step_does_not_halt_chain() {
    let chain = ToolChain::new("failing", "")
        .add_step("fail", "{input}", "f")
        .add_step("upper", "{f}", "u")
        .add_step("missing_tool", "{input}", "m");

    let context = chain.execute(&registry(), "q").unwrap();

    assert_eq!(context.get("f"), Some("error executing tool 'fail': broken"));
    assert_eq!(context.get("u"), Some("ERROR EXECUTING TOOL 'FAIL': BROKEN"));
    assert_eq!(context.get("m"), Some("error: tool 'missing_tool' not found"));
}

#[test]
fn test_unresolved_placeholder_is_fatal() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut registry = registry();
    registry.register_function("count", "Count calls.", move |i| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(i.to_string())
    });

    let chain = ToolChain::new("broken", "")
        .add_step("count", "{input}", "a")
        .add_step("count", "{later}", "b")
        .add_step("count", "{a}", "c");

    let err = chain.execute(&registry, "x").unwrap_err();

    assert_eq!(
        err,
        ChainError::UnresolvedPlaceholder {
            step: 1,
            tool: "count".to_string(),
            key: "later".to_string(),
        }
    );
    assert!(err.to_string().contains("{later}"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_malformed_template_is_fatal() {
    let chain = ToolChain::new("bad", "").add_step("upper", "{input", "u");

    let err = chain.execute(&registry(), "x").unwrap_err();
    assert!(matches!(err, ChainError::MalformedTemplate { step: 0, .. }));
}

#[test]
fn test_reserved_output_key_rejected_before_any_step() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut registry = registry();
    registry.register_function("count", "Count calls.", move |i| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(i.to_string())
    });

    let chain = ToolChain::new("rebind", "")
        .add_step("count", "{input}", "a")
        .add_step("count", "{a}", "input")
        .add_step("count", "{input}", "b");

    let err = chain.execute(&registry, "x").unwrap_err();

    assert_eq!(
        err,
        ChainError::ReservedOutputKey {
            step: 1,
            tool: "count".to_string(),
        }
    );
    assert!(err.to_string().contains("'input' is reserved"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_output_key_reuse_overwrites() {
    let chain = ToolChain::new("reuse", "")
        .add_step("double", "{input}", "v")
        .add_step("upper", "{v}", "v");

    let context = chain.execute(&registry(), "ab").unwrap();
    assert_eq!(context.get("v"), Some("ABAB"));
    assert_eq!(context.len(), 2);
}

#[test]
fn test_chain_is_deterministic() {
    let chain = ToolChain::new("det", "")
        .add_step("double", "{input}", "d")
        .add_step("upper", "{d}/{input}", "u");
    let registry = registry();

    let first = chain.execute(&registry, "ab").unwrap();
    let second = chain.execute(&registry, "ab").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_literal_template_and_empty_chain() {
    let chain = ToolChain::new("literal", "").add_step("upper", "2 + 2", "r");
    let context = chain.execute(&registry(), "ignored").unwrap();
    assert_eq!(context.get("r"), Some("2 + 2"));

    let empty = ToolChain::new("empty", "");
    assert!(empty.is_empty());
    let context = empty.execute(&registry(), "x").unwrap();
    assert_eq!(context.last_output(), None);
    assert_eq!(context.into_map().len(), 1);
}

#[test]
fn test_push_step_and_accessors() {
    let mut chain = ToolChain::new("named", "A description");
    chain.push_step("upper", "{input}", "u");

    assert_eq!(chain.name(), "named");
    assert_eq!(chain.description(), "A description");
    assert_eq!(chain.len(), 1);
    assert_eq!(chain.steps()[0].output_key, "u");
}

#[test]
fn test_from_config() {
    let config = ChainConfig {
        name: "configured".to_string(),
        description: "from config".to_string(),
        steps: vec![
            StepConfig::new("double", "{input}", "d"),
            StepConfig::new("upper", "{d}", "u"),
        ],
    };

    let chain = ToolChain::from_config(&config);
    assert_eq!(chain.name(), "configured");
    assert_eq!(chain.len(), 2);

    let context = chain.execute(&registry(), "ab").unwrap();
    assert_eq!(context.last_output(), Some("ABAB"));
}

#[test]
fn test_context_serializes_as_map() {
    let chain = ToolChain::new("json", "").add_step("double", "{input}", "d");
    let context = chain.execute(&registry(), "ab").unwrap();

    let value = serde_json::to_value(&context).unwrap();
    assert_eq!(value["input"], "ab");
    assert_eq!(value["d"], "abab");
}
