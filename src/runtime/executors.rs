/// Executor registry and mock connector executors
///
/// Action keys form a closed enumeration, so registry construction is an
/// exhaustive match rather than an open-ended string lookup. Each registered
/// executor carries a synthetic example input used for schema-gated dry runs.
/// The connector behaviors themselves are mocks returning predictable data.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;

/// The closed set of executable/triggerable catalog actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKey {
    ShopifyOrderPaid,
    ShopifyFulfillOrder,
    StripeVerifyPayment,
    NetsuiteCreateSalesOrder,
    ShippoCreateShipment,
}

impl ActionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKey::ShopifyOrderPaid => "shopify.order_paid",
            ActionKey::ShopifyFulfillOrder => "shopify.fulfill_order",
            ActionKey::StripeVerifyPayment => "stripe.verify_payment",
            ActionKey::NetsuiteCreateSalesOrder => "netsuite.create_sales_order",
            ActionKey::ShippoCreateShipment => "shippo.create_shipment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "shopify.order_paid" => Some(ActionKey::ShopifyOrderPaid),
            "shopify.fulfill_order" => Some(ActionKey::ShopifyFulfillOrder),
            "stripe.verify_payment" => Some(ActionKey::StripeVerifyPayment),
            "netsuite.create_sales_order" => Some(ActionKey::NetsuiteCreateSalesOrder),
            "shippo.create_shipment" => Some(ActionKey::ShippoCreateShipment),
            _ => None,
        }
    }
}

/// The capability an executor exposes to the engine
///
/// Input has already passed the action's input contract when `run` is called;
/// output is contract-checked by the engine afterwards.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn run(&self, input: &Value) -> anyhow::Result<Value>;
}

/// An executor together with the synthetic input used for dry runs
pub struct RegisteredExecutor {
    pub executor: Box<dyn StepExecutor>,
    pub example_input: Value,
}

/// Registry binding action keys to executors
///
/// Trigger actions are deliberately absent: they start workflows, they are
/// not executed. Catalog entries without a registered executor are
/// planning-only stubs.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<ActionKey, RegisteredExecutor>,
}

impl ExecutorRegistry {
    /// Empty registry; useful for tests and custom wiring
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry covering all built-in executable actions
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            ActionKey::StripeVerifyPayment,
            Box::new(StripeVerifyPayment),
            // Deliberately not a "pi_" intent id: the dry run exercises the
            // executor's failure path, which the output contract permits
            json!({
                "paymentIntentId": "tok_visa_0042",
                "amountExpectedMinor": 245000,
                "currency": "usd",
                "orderId": "ORDER-84322"
            }),
        );
        registry.register(
            ActionKey::ShopifyFulfillOrder,
            Box::new(ShopifyFulfillOrder),
            json!({
                "orderId": "ORDER-84322",
                "trackingNumber": "1Z999AA10123456784",
                "carrier": "UPS"
            }),
        );
        registry.register(
            ActionKey::NetsuiteCreateSalesOrder,
            Box::new(NetsuiteCreateSalesOrder),
            json!({
                "externalOrderId": "ORDER-84322",
                "currency": "USD",
                "customer": { "email": "john@example.com", "name": "John Doe" },
                "items": [{ "sku": "OAK-DT-001", "quantity": 1, "unitPrice": 2450 }]
            }),
        );
        registry.register(
            ActionKey::ShippoCreateShipment,
            Box::new(ShippoCreateShipment),
            json!({
                "orderId": "ORDER-84322",
                "shippingAddress": "123 Main St, Austin, TX 78701, US",
                "items": [{ "sku": "OAK-DT-001", "quantity": 1 }],
                "serviceLevel": "ground"
            }),
        );
        registry
    }

    pub fn register(
        &mut self,
        key: ActionKey,
        executor: Box<dyn StepExecutor>,
        example_input: Value,
    ) {
        self.executors
            .insert(key, RegisteredExecutor { executor, example_input });
    }

    /// Resolve the executor bound to an action key, if any
    pub fn lookup(&self, action_key: &str) -> Option<&RegisteredExecutor> {
        ActionKey::parse(action_key).and_then(|key| self.executors.get(&key))
    }
}

/// Mock Stripe payment verification
///
/// Verifies iff the intent id looks like a real PaymentIntent ("pi_" prefix)
/// and the expected minor amount is positive.
pub struct StripeVerifyPayment;

#[async_trait]
impl StepExecutor for StripeVerifyPayment {
    async fn run(&self, input: &Value) -> anyhow::Result<Value> {
        let intent_id = input
            .get("paymentIntentId")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let amount = input
            .get("amountExpectedMinor")
            .and_then(|v| v.as_i64())
            .unwrap_or_default();

        let verified = intent_id.starts_with("pi_") && amount > 0;
        tracing::info!("[mock] Verifying Stripe payment {intent_id}: verified={verified}");

        if verified {
            Ok(json!({ "verified": true, "status": "succeeded" }))
        } else {
            Ok(json!({
                "verified": false,
                "status": "failed",
                "reason": "Invalid payment intent or amount"
            }))
        }
    }
}

/// Mock Shopify order fulfillment
pub struct ShopifyFulfillOrder;

#[async_trait]
impl StepExecutor for ShopifyFulfillOrder {
    async fn run(&self, input: &Value) -> anyhow::Result<Value> {
        tracing::info!(
            "[mock] Fulfilling Shopify order {}",
            input.get("orderId").and_then(|v| v.as_str()).unwrap_or("?")
        );
        Ok(json!({ "fulfillmentId": "FUL-001", "status": "fulfilled" }))
    }
}

/// Mock NetSuite sales-order creation
pub struct NetsuiteCreateSalesOrder;

#[async_trait]
impl StepExecutor for NetsuiteCreateSalesOrder {
    async fn run(&self, input: &Value) -> anyhow::Result<Value> {
        tracing::info!(
            "[mock] Creating NetSuite sales order for {}",
            input
                .get("externalOrderId")
                .and_then(|v| v.as_str())
                .unwrap_or("?")
        );
        Ok(json!({ "salesOrderId": "NS-SO-100045", "status": "created" }))
    }
}

/// Mock Shippo shipment creation
pub struct ShippoCreateShipment;

#[async_trait]
impl StepExecutor for ShippoCreateShipment {
    async fn run(&self, input: &Value) -> anyhow::Result<Value> {
        tracing::info!("[mock] Creating Shippo shipment");
        Ok(json!({
            "trackingNumber": "1Z999AA10123456784",
            "carrier": "UPS",
            "labelUrl": "https://labels.example.com/label_7d1a2b3c4d.pdf",
            "status": "label_purchased"
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_keys_round_trip() {
        for key in [
            ActionKey::ShopifyOrderPaid,
            ActionKey::ShopifyFulfillOrder,
            ActionKey::StripeVerifyPayment,
            ActionKey::NetsuiteCreateSalesOrder,
            ActionKey::ShippoCreateShipment,
        ] {
            assert_eq!(ActionKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(ActionKey::parse("acme.unknown_action"), None);
    }

    #[test]
    fn triggers_have_no_executor() {
        let registry = ExecutorRegistry::builtin();
        assert!(registry.lookup("shopify.order_paid").is_none());
        assert!(registry.lookup("stripe.verify_payment").is_some());
    }

    #[tokio::test]
    async fn stripe_mock_rejects_non_intent_ids() {
        let registry = ExecutorRegistry::builtin();
        let registered = registry.lookup("stripe.verify_payment").unwrap();

        let output = registered
            .executor
            .run(&registered.example_input)
            .await
            .unwrap();
        assert_eq!(output["verified"], json!(false));
        assert_eq!(output["status"], json!("failed"));
        assert!(output["reason"].is_string());
    }

    #[tokio::test]
    async fn stripe_mock_verifies_real_looking_intents() {
        let output = StripeVerifyPayment
            .run(&json!({
                "paymentIntentId": "pi_3QF1abcXYZ123456789",
                "amountExpectedMinor": 245000,
                "currency": "usd"
            }))
            .await
            .unwrap();
        assert_eq!(output["verified"], json!(true));
        assert_eq!(output["status"], json!("succeeded"));
    }
}
