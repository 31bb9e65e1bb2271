pub mod config;
pub mod domain;
pub mod errors;
pub mod extraction;
pub mod screening;
pub mod tool;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::donor::{
    BloodType, Donor, DonorId, DonorStatus, IntakeMethod, Sex, TissueCondition, TissueType,
};
pub use domain::guideline::{GuidelineId, ScreeningGuideline};
pub use domain::notification::{Notification, NotificationId};
pub use domain::partner::{Partner, PartnerId};
pub use domain::screening::{Concern, ScreeningResult, ScreeningResultId, Severity, Verdict};
pub use domain::transcript::{CallTranscript, TranscriptId};
pub use errors::{ApiErrorKind, DomainError};
pub use extraction::{ExtractedIntake, TranscriptTurn};
pub use screening::{Evaluation, GuidelineSection};
pub use tool::{ArgumentError, ToolSpec};
