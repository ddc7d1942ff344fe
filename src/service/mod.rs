pub mod guard;
pub mod send;

// Re-export the workflow so callers can use `crate::service::SendWorkflow`
pub use guard::SendGuard;
pub use send::{PaymentRequest, SendFailure, SendSettings, SendStage, SendState, SendWorkflow};
