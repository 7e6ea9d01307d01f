//! Built-in tools

pub mod calculator;

pub use calculator::CalculatorTool;

use crate::registry::ToolRegistry;

/// Register the built-in calculator and text functions
pub fn register_builtin_tools(registry: &mut ToolRegistry) {
    registry.register(CalculatorTool::new());

    registry.register_function("echo", "Return the input unchanged.", |input| {
        Ok(input.to_string())
    });
    registry.register_function("upper", "Convert the input to uppercase.", |input| {
        Ok(input.to_uppercase())
    });
    registry.register_function("lower", "Convert the input to lowercase.", |input| {
        Ok(input.to_lowercase())
    });
    registry.register_function("reverse", "Reverse the characters of the input.", |input| {
        Ok(input.chars().rev().collect())
    });
    registry.register_function(
        "word_count",
        "Count whitespace-separated words in the input.",
        |input| Ok(input.split_whitespace().count().to_string()),
    );
}
