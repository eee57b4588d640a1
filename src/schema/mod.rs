/// Contract compilation and checking on top of the jsonschema crate
///
/// Action contracts are stored as plain JSON Schema documents in the catalog
/// and compiled once when the catalog registry loads. Checking a value is pure
/// and side-effect-free; a compiled contract is reused across requests.

use jsonschema::JSONSchema;
use serde_json::Value;
use thiserror::Error;

/// Failure to compile a schema document
///
/// Distinct from a validation failure: a compile error means the schema itself
/// is malformed, which is a defect in the catalog, not in the checked value.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema failed to compile: {0}")]
    Compile(String),
}

/// A single rule violation found while checking a value
#[derive(Debug, Clone, serde::Serialize, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer to the offending location ("" for the root)
    pub path: String,
    pub message: String,
}

/// Result of checking a value against a compiled contract
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub ok: bool,
    /// Ordered list of violations; empty when `ok`
    pub violations: Vec<Violation>,
}

impl CheckOutcome {
    /// One-line summary of all violations, for error messages and logs
    pub fn summary(&self) -> String {
        self.violations
            .iter()
            .map(|v| {
                if v.path.is_empty() {
                    v.message.clone()
                } else {
                    format!("{}: {}", v.path, v.message)
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A compiled, reusable machine-checkable contract
pub struct Contract {
    /// Source schema document, kept for display and re-serialization
    schema: Value,
    compiled: JSONSchema,
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract").field("schema", &self.schema).finish()
    }
}

impl Contract {
    /// Compile a JSON Schema document into a reusable contract
    ///
    /// Format assertions (email, etc.) are enabled because the catalog
    /// contracts rely on them.
    pub fn compile(schema: Value) -> Result<Self, SchemaError> {
        let compiled = JSONSchema::options()
            .should_validate_formats(true)
            .compile(&schema)
            .map_err(|e| SchemaError::Compile(e.to_string()))?;

        Ok(Self { schema, compiled })
    }

    /// The source schema document this contract was compiled from
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Check a value against this contract
    ///
    /// All violations are collected (not just the first), each with the JSON
    /// pointer of the offending location.
    pub fn check(&self, value: &Value) -> CheckOutcome {
        match self.compiled.validate(value) {
            Ok(()) => CheckOutcome {
                ok: true,
                violations: Vec::new(),
            },
            Err(errors) => {
                let violations = errors
                    .map(|e| Violation {
                        path: e.instance_path.to_string(),
                        message: e.to_string(),
                    })
                    .collect();
                CheckOutcome {
                    ok: false,
                    violations,
                }
            }
        }
    }

    /// Shortcut for callers that only need a pass/fail answer
    pub fn is_valid(&self, value: &Value) -> bool {
        self.compiled.is_valid(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "orderId": { "type": "string", "minLength": 1 },
                "total": { "type": "number", "exclusiveMinimum": 0 },
                "currency": { "type": "string", "minLength": 3, "maxLength": 3 },
                "email": { "type": "string", "format": "email" },
                "items": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "sku": { "type": "string" },
                            "quantity": { "type": "integer", "exclusiveMinimum": 0 }
                        },
                        "required": ["sku", "quantity"]
                    }
                },
                "status": { "const": "fulfilled" }
            },
            "required": ["orderId", "total", "currency", "items"]
        })
    }

    #[test]
    fn malformed_schema_is_a_compile_error() {
        // "type" must be a string or array of strings, not a number
        let result = Contract::compile(json!({ "type": 42 }));
        assert!(matches!(result, Err(SchemaError::Compile(_))));
    }

    #[test]
    fn conforming_value_passes() {
        let contract = Contract::compile(order_schema()).unwrap();
        let outcome = contract.check(&json!({
            "orderId": "ORDER-84322",
            "total": 2450,
            "currency": "USD",
            "email": "john@example.com",
            "items": [{ "sku": "OAK-DT-001", "quantity": 1 }],
            "status": "fulfilled"
        }));
        assert!(outcome.ok, "unexpected violations: {}", outcome.summary());
    }

    #[test]
    fn violations_carry_paths() {
        let contract = Contract::compile(order_schema()).unwrap();
        let outcome = contract.check(&json!({
            "orderId": "",
            "total": 0,
            "currency": "USDX",
            "items": []
        }));
        assert!(!outcome.ok);
        let paths: Vec<&str> = outcome.violations.iter().map(|v| v.path.as_str()).collect();
        assert!(paths.contains(&"/orderId"));
        assert!(paths.contains(&"/total"));
        assert!(paths.contains(&"/currency"));
        assert!(paths.contains(&"/items"));
    }

    #[test]
    fn email_format_is_enforced() {
        let contract = Contract::compile(order_schema()).unwrap();
        let outcome = contract.check(&json!({
            "orderId": "ORDER-1",
            "total": 10,
            "currency": "USD",
            "email": "not-an-email",
            "items": [{ "sku": "X", "quantity": 1 }]
        }));
        assert!(!outcome.ok);
        assert!(outcome.violations.iter().any(|v| v.path == "/email"));
    }

    #[test]
    fn literal_match_is_enforced() {
        let contract = Contract::compile(order_schema()).unwrap();
        let outcome = contract.check(&json!({
            "orderId": "ORDER-1",
            "total": 10,
            "currency": "USD",
            "items": [{ "sku": "X", "quantity": 1 }],
            "status": "pending"
        }));
        assert!(!outcome.ok);
        assert!(outcome.violations.iter().any(|v| v.path == "/status"));
    }

    #[test]
    fn compiled_contract_is_reusable() {
        let contract = Contract::compile(order_schema()).unwrap();
        let good = json!({
            "orderId": "ORDER-1",
            "total": 1,
            "currency": "EUR",
            "items": [{ "sku": "X", "quantity": 2 }]
        });
        for _ in 0..3 {
            assert!(contract.check(&good).ok);
        }
    }
}
