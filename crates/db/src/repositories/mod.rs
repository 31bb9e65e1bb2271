use async_trait::async_trait;
use thiserror::Error;

use donorway_core::domain::donor::{Donor, DonorId};
use donorway_core::domain::guideline::ScreeningGuideline;
use donorway_core::domain::notification::Notification;
use donorway_core::domain::partner::{Partner, PartnerId};
use donorway_core::domain::screening::ScreeningResult;
use donorway_core::domain::transcript::CallTranscript;

pub mod donor;
pub mod guideline;
pub mod notification;
pub mod partner;
pub mod screening_result;
pub mod transcript;

pub use donor::SqlDonorRepository;
pub use guideline::SqlGuidelineRepository;
pub use notification::SqlNotificationRepository;
pub use partner::SqlPartnerRepository;
pub use screening_result::SqlScreeningResultRepository;
pub use transcript::SqlTranscriptRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait DonorRepository: Send + Sync {
    async fn find_by_id(&self, id: &DonorId) -> Result<Option<Donor>, RepositoryError>;
    async fn save(&self, donor: Donor) -> Result<(), RepositoryError>;
    async fn list_for_partner(&self, partner_id: &PartnerId)
        -> Result<Vec<Donor>, RepositoryError>;
}

#[async_trait]
pub trait PartnerRepository: Send + Sync {
    async fn find_by_id(&self, id: &PartnerId) -> Result<Option<Partner>, RepositoryError>;
    /// Case-insensitive slug lookup restricted to active partners.
    async fn find_active_by_slug(&self, slug: &str) -> Result<Option<Partner>, RepositoryError>;
    async fn save(&self, partner: Partner) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait GuidelineRepository: Send + Sync {
    /// Active guidelines in prompt order: `sort_order` ascending, title as
    /// tiebreak, so identical data always yields an identical prompt.
    async fn list_active(&self) -> Result<Vec<ScreeningGuideline>, RepositoryError>;
    async fn save(&self, guideline: ScreeningGuideline) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ScreeningResultRepository: Send + Sync {
    /// Plain insert. Results are append-only; there is no update path.
    async fn insert(&self, result: ScreeningResult) -> Result<(), RepositoryError>;
    async fn list_for_donor(
        &self,
        donor_id: &DonorId,
    ) -> Result<Vec<ScreeningResult>, RepositoryError>;
}

#[async_trait]
pub trait TranscriptRepository: Send + Sync {
    async fn insert(&self, transcript: CallTranscript) -> Result<(), RepositoryError>;
    async fn list_for_donor(
        &self,
        donor_id: &DonorId,
    ) -> Result<Vec<CallTranscript>, RepositoryError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: Notification) -> Result<(), RepositoryError>;
    async fn list_for_recipient(
        &self,
        recipient: &str,
    ) -> Result<Vec<Notification>, RepositoryError>;
}
