/// Built-in connector and action definitions
///
/// Source contracts are authored here directly in the checkable JSON Schema
/// form the schema module compiles, so no lowering happens on the request
/// path. Each entry carries example payloads that must validate against its
/// own contracts (covered by tests).

use serde_json::json;

use crate::catalog::types::{ActionCatalogEntry, ActionExamples, ActionType};

/// Connectors seeded at startup, as (key, display name) pairs
pub fn builtin_connectors() -> Vec<(&'static str, &'static str)> {
    vec![
        ("shopify", "Shopify"),
        ("stripe", "Stripe"),
        ("netsuite", "NetSuite"),
        ("shippo", "Shippo"),
    ]
}

/// Action catalog entries seeded at startup
pub fn builtin_actions() -> Vec<ActionCatalogEntry> {
    vec![
        shopify_order_paid(),
        shopify_fulfill_order(),
        stripe_verify_payment(),
        netsuite_create_sales_order(),
        shippo_create_shipment(),
    ]
}

fn shopify_order_paid() -> ActionCatalogEntry {
    ActionCatalogEntry {
        key: "shopify.order_paid".into(),
        action_type: ActionType::Trigger,
        connector_key: "shopify".into(),
        title: "Shopify: Order Paid".into(),
        description: "Triggered when a customer completes payment for an order in Shopify."
            .into(),
        input_contract: None,
        output_contract: Some(json!({
            "type": "object",
            "properties": {
                "orderId": { "type": "string", "minLength": 1 },
                "total": { "type": "number", "exclusiveMinimum": 0 },
                "currency": { "type": "string", "minLength": 3, "maxLength": 3 },
                "items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "sku": { "type": "string" },
                            "name": { "type": "string" },
                            "quantity": { "type": "integer", "exclusiveMinimum": 0 },
                            "unitPrice": { "type": "number", "exclusiveMinimum": 0 }
                        },
                        "required": ["sku", "name", "quantity", "unitPrice"]
                    }
                },
                "customer": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "name": { "type": "string" },
                        "email": { "type": "string", "format": "email" }
                    },
                    "required": ["id", "name", "email"]
                },
                "shippingAddress": { "type": "string", "minLength": 5 }
            },
            "required": ["orderId", "total", "currency", "items", "customer", "shippingAddress"]
        })),
        examples: Some(ActionExamples {
            input: None,
            output: Some(json!({
                "orderId": "ORDER-84322",
                "total": 2450,
                "currency": "USD",
                "items": [
                    {
                        "sku": "OAK-DT-001",
                        "name": "Solid Oak Dining Table",
                        "quantity": 1,
                        "unitPrice": 2450
                    }
                ],
                "customer": {
                    "id": "CUST-932",
                    "name": "John Doe",
                    "email": "john@example.com"
                },
                "shippingAddress": "123 Main St, Austin, TX"
            })),
        }),
    }
}

fn shopify_fulfill_order() -> ActionCatalogEntry {
    ActionCatalogEntry {
        key: "shopify.fulfill_order".into(),
        action_type: ActionType::Action,
        connector_key: "shopify".into(),
        title: "Shopify: Fulfill Order".into(),
        description: "Marks a Shopify order fulfilled with tracking.".into(),
        input_contract: Some(json!({
            "type": "object",
            "properties": {
                "orderId": { "type": "string", "minLength": 1 },
                "trackingNumber": { "type": "string", "minLength": 1 },
                "carrier": { "type": "string", "minLength": 1 }
            },
            "required": ["orderId", "trackingNumber", "carrier"]
        })),
        output_contract: Some(json!({
            "type": "object",
            "properties": {
                "fulfillmentId": { "type": "string", "minLength": 1 },
                "status": { "const": "fulfilled" }
            },
            "required": ["fulfillmentId", "status"]
        })),
        examples: Some(ActionExamples {
            input: Some(json!({
                "orderId": "ORDER-84322",
                "trackingNumber": "1Z999AA10123456784",
                "carrier": "UPS"
            })),
            output: Some(json!({
                "fulfillmentId": "FUL-001",
                "status": "fulfilled"
            })),
        }),
    }
}

fn stripe_verify_payment() -> ActionCatalogEntry {
    ActionCatalogEntry {
        key: "stripe.verify_payment".into(),
        action_type: ActionType::Action,
        connector_key: "stripe".into(),
        title: "Stripe: Verify Payment".into(),
        description:
            "Validates a Stripe Payment Intent status, amount, and currency before fulfillment."
                .into(),
        input_contract: Some(json!({
            "type": "object",
            "properties": {
                "paymentIntentId": { "type": "string", "minLength": 1 },
                // Minor units, e.g. 245000 for $2,450.00
                "amountExpectedMinor": { "type": "integer", "minimum": 0 },
                "currency": { "type": "string", "pattern": "^[a-z]{3}$" },
                "orderId": { "type": "string" }
            },
            "required": ["paymentIntentId", "amountExpectedMinor", "currency"]
        })),
        output_contract: Some(json!({
            "type": "object",
            "properties": {
                "verified": { "type": "boolean" },
                "status": { "type": "string" },
                // Present only when verified = false
                "reason": { "type": "string" }
            },
            "required": ["verified", "status"]
        })),
        examples: Some(ActionExamples {
            input: Some(json!({
                "paymentIntentId": "pi_3QF1abcXYZ123456789",
                "amountExpectedMinor": 245000,
                "currency": "usd",
                "orderId": "ORDER-84322"
            })),
            output: Some(json!({
                "verified": true,
                "status": "succeeded"
            })),
        }),
    }
}

fn netsuite_create_sales_order() -> ActionCatalogEntry {
    ActionCatalogEntry {
        key: "netsuite.create_sales_order".into(),
        action_type: ActionType::Action,
        connector_key: "netsuite".into(),
        title: "NetSuite: Create Sales Order".into(),
        description: "Creates a sales order in NetSuite from a paid storefront order.".into(),
        input_contract: Some(json!({
            "type": "object",
            "properties": {
                "externalOrderId": { "type": "string", "minLength": 1 },
                "currency": { "type": "string", "minLength": 3, "maxLength": 3 },
                "customer": {
                    "type": "object",
                    "properties": {
                        "email": { "type": "string", "format": "email" },
                        "name": { "type": "string" }
                    },
                    "required": ["email"]
                },
                "items": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "sku": { "type": "string", "minLength": 1 },
                            "quantity": { "type": "integer", "exclusiveMinimum": 0 },
                            "unitPrice": { "type": "number", "minimum": 0 }
                        },
                        "required": ["sku", "quantity", "unitPrice"]
                    }
                }
            },
            "required": ["externalOrderId", "currency", "customer", "items"]
        })),
        output_contract: Some(json!({
            "type": "object",
            "properties": {
                "salesOrderId": { "type": "string", "minLength": 1 },
                "status": { "const": "created" }
            },
            "required": ["salesOrderId", "status"]
        })),
        examples: Some(ActionExamples {
            input: Some(json!({
                "externalOrderId": "ORDER-84322",
                "currency": "USD",
                "customer": { "email": "john@example.com", "name": "John Doe" },
                "items": [{ "sku": "OAK-DT-001", "quantity": 1, "unitPrice": 2450 }]
            })),
            output: Some(json!({
                "salesOrderId": "NS-SO-100045",
                "status": "created"
            })),
        }),
    }
}

fn shippo_create_shipment() -> ActionCatalogEntry {
    ActionCatalogEntry {
        key: "shippo.create_shipment".into(),
        action_type: ActionType::Action,
        connector_key: "shippo".into(),
        title: "Shippo: Create Shipment".into(),
        description: "Purchases a shipping label and returns tracking details.".into(),
        input_contract: Some(json!({
            "type": "object",
            "properties": {
                "orderId": { "type": "string" },
                "shippingAddress": { "type": "string", "minLength": 5 },
                "items": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "sku": { "type": "string", "minLength": 1 },
                            "quantity": { "type": "integer", "exclusiveMinimum": 0 }
                        },
                        "required": ["sku", "quantity"]
                    }
                },
                "serviceLevel": { "type": "string" }
            },
            "required": ["shippingAddress", "items"]
        })),
        output_contract: Some(json!({
            "type": "object",
            "properties": {
                "trackingNumber": { "type": "string", "minLength": 1 },
                "carrier": { "type": "string", "minLength": 1 },
                "labelUrl": { "type": "string", "minLength": 1 },
                "status": { "const": "label_purchased" }
            },
            "required": ["trackingNumber", "carrier", "labelUrl", "status"]
        })),
        examples: Some(ActionExamples {
            input: Some(json!({
                "orderId": "ORDER-84322",
                "shippingAddress": "123 Main St, Austin, TX 78701, US",
                "items": [{ "sku": "OAK-DT-001", "quantity": 1 }],
                "serviceLevel": "ground"
            })),
            output: Some(json!({
                "trackingNumber": "1Z999AA10123456784",
                "carrier": "UPS",
                "labelUrl": "https://labels.example.com/label_7d1a2b3c4d.pdf",
                "status": "label_purchased"
            })),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Contract;

    /// Every seeded example must validate against its own contract
    #[test]
    fn examples_conform_to_their_contracts() {
        for entry in builtin_actions() {
            let examples = entry.examples.as_ref().expect("seed entries carry examples");

            if let Some(schema) = &entry.input_contract {
                let contract = Contract::compile(schema.clone())
                    .unwrap_or_else(|e| panic!("{}: input contract: {e}", entry.key));
                let input = examples
                    .input
                    .as_ref()
                    .unwrap_or_else(|| panic!("{}: missing input example", entry.key));
                let outcome = contract.check(input);
                assert!(outcome.ok, "{}: input example: {}", entry.key, outcome.summary());
            }

            if let Some(schema) = &entry.output_contract {
                let contract = Contract::compile(schema.clone())
                    .unwrap_or_else(|e| panic!("{}: output contract: {e}", entry.key));
                let output = examples
                    .output
                    .as_ref()
                    .unwrap_or_else(|| panic!("{}: missing output example", entry.key));
                let outcome = contract.check(output);
                assert!(outcome.ok, "{}: output example: {}", entry.key, outcome.summary());
            }
        }
    }

    #[test]
    fn triggers_have_no_input_contract() {
        for entry in builtin_actions() {
            if entry.action_type == ActionType::Trigger {
                assert!(entry.input_contract.is_none(), "{}", entry.key);
            } else {
                assert!(entry.input_contract.is_some(), "{}", entry.key);
            }
        }
    }

    #[test]
    fn every_action_belongs_to_a_seeded_connector() {
        let connectors: Vec<&str> = builtin_connectors().iter().map(|(k, _)| *k).collect();
        for entry in builtin_actions() {
            assert!(
                connectors.contains(&entry.connector_key.as_str()),
                "{} references unknown connector {}",
                entry.key,
                entry.connector_key
            );
        }
    }
}
