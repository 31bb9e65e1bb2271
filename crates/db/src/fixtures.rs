//! Demo seed data and small insert helpers shared by tests.

use chrono::Utc;

use donorway_core::domain::guideline::{GuidelineId, ScreeningGuideline};
use donorway_core::domain::partner::{Partner, PartnerId};

use crate::repositories::{
    GuidelineRepository, PartnerRepository, RepositoryError, SqlGuidelineRepository,
    SqlPartnerRepository,
};
use crate::DbPool;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub partners: usize,
    pub guidelines: usize,
}

struct SeedPartner {
    name: &'static str,
    slug: &'static str,
    contact_email: &'static str,
}

struct SeedGuideline {
    title: &'static str,
    category: &'static str,
    content: &'static str,
    sort_order: i64,
}

const SEED_PARTNERS: &[SeedPartner] = &[
    SeedPartner {
        name: "Acme Tissue Recovery",
        slug: "acme-tissue",
        contact_email: "ops@acme-tissue.example",
    },
    SeedPartner {
        name: "Lakeside Donor Network",
        slug: "lakeside-donor",
        contact_email: "intake@lakeside-donor.example",
    },
];

const SEED_GUIDELINES: &[SeedGuideline] = &[
    SeedGuideline {
        title: "Age limits",
        category: "medical",
        content: "Reject donors under 2 or over 80 years of age.",
        sort_order: 1,
    },
    SeedGuideline {
        title: "Consent documentation",
        category: "regulatory",
        content: "Consent must be explicitly documented before any tissue is released.",
        sort_order: 2,
    },
    SeedGuideline {
        title: "Infection screening",
        category: "medical",
        content: "Flag any mention of sepsis, hepatitis, or HIV for review.",
        sort_order: 3,
    },
];

/// Seeds demo partners and guidelines. Idempotent per slug/title: rows are
/// upserted by a stable id derived from the seed entry.
pub async fn seed_demo_data(pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
    let partners = SqlPartnerRepository::new(pool.clone());
    let guidelines = SqlGuidelineRepository::new(pool.clone());
    let now = Utc::now();

    for seed in SEED_PARTNERS {
        partners
            .save(Partner {
                id: PartnerId(format!("seed-partner-{}", seed.slug)),
                name: seed.name.to_string(),
                slug: seed.slug.to_string(),
                contact_email: Some(seed.contact_email.to_string()),
                is_active: true,
                created_at: now,
            })
            .await?;
    }

    for (index, seed) in SEED_GUIDELINES.iter().enumerate() {
        guidelines
            .save(ScreeningGuideline {
                id: GuidelineId(format!("seed-guideline-{index}")),
                title: seed.title.to_string(),
                category: seed.category.to_string(),
                content: seed.content.to_string(),
                is_active: true,
                sort_order: seed.sort_order,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }

    Ok(SeedSummary { partners: SEED_PARTNERS.len(), guidelines: SEED_GUIDELINES.len() })
}

/// Insert a partner row directly, bypassing the repository. Test helper.
pub async fn insert_partner(pool: &DbPool, id: &str, slug: &str, is_active: bool) {
    sqlx::query(
        "INSERT INTO partner (id, name, slug, contact_email, is_active, created_at)
         VALUES (?, ?, ?, NULL, ?, ?)",
    )
    .bind(id)
    .bind(format!("Partner {id}"))
    .bind(slug)
    .bind(is_active)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .expect("insert partner fixture");
}

/// Insert a minimal draft donor row so FK constraints are satisfied. Test helper.
pub async fn insert_donor(pool: &DbPool, id: &str, partner_id: &str) {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO donor (id, partner_id, status, intake_method, created_at, updated_at)
         VALUES (?, ?, 'draft', 'manual', ?, ?)",
    )
    .bind(id)
    .bind(partner_id)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .expect("insert donor fixture");
}
