/// Plan generation and validation pipeline
///
/// A natural-language prompt goes to the reasoning service (client), a
/// structured plan is extracted from the free-form reply (extract), and the
/// untrusted result is checked against the catalog (validator). Only a
/// `ValidatedPlan` crosses into persistence - that type is the trust boundary
/// between LLM output and stored data.

pub mod client;
pub mod extract;
pub mod generator;
pub mod types;
pub mod validator;

pub use client::{AnthropicClient, ClientError, CompletionRequest, ReasoningClient};
pub use generator::{PlanGenerator, PlanGeneratorConfig};
pub use types::{PlanResponse, PlanStep};
pub use validator::{validate_plan, ValidatedPlan, ValidatedStep};
