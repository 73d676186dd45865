use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("config error: {0}")]
    Config(String),

    #[error("membership error: {0}")]
    Membership(#[from] dao_membership::MembershipError),

    #[error("scenario step {step} failed: {message}")]
    StepFailed { step: usize, message: String },
}
