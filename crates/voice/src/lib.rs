pub mod api;
pub mod intake;

pub use api::{
    HttpVoiceApi, VoiceAgent, VoiceApi, VoiceError, VoicePhoneNumber, WebCallSession,
    WEBHOOK_SIGNATURE_HEADER,
};
pub use intake::{
    mint_web_call, provision_intake_agent, IntakeStatus, ProvisionOutcome, INTAKE_SCRIPT,
};
pub use intake::intake_status;
