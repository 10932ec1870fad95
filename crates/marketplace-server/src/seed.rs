//! Demo dataset for local runs.
//!
//! With `seed.demo_data: true` the server fills an empty store with a
//! handful of clients, contractors, contracts, and jobs, paid and unpaid,
//! so every endpoint has something to return. A store that already holds
//! profiles is left alone.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

use marketplace_core::{MarketError, Marketplace};
use marketplace_types::{
    Contract, ContractStatus, NewContract, NewJob, NewProfile, Profile, ProfileKind,
};

/// First name, last name, profession, balance in cents, kind.
const PROFILES: &[(&str, &str, &str, i64, ProfileKind)] = &[
    ("Harry", "Potter", "Wizard", 115_000, ProfileKind::Client),
    ("Mr", "Robot", "Hacker", 23_111, ProfileKind::Client),
    ("John", "Snow", "Knows nothing", 45_130, ProfileKind::Client),
    ("Ash", "Kethcum", "Pokemon master", 130, ProfileKind::Client),
    ("John", "Lenon", "Musician", 6_400, ProfileKind::Contractor),
    ("Linus", "Torvalds", "Programmer", 121_400, ProfileKind::Contractor),
    ("Alan", "Turing", "Programmer", 2_200, ProfileKind::Contractor),
    ("Aragorn", "II Elessar Telcontarion", "Fighter", 31_400, ProfileKind::Contractor),
];

/// Client and contractor as 1-based positions in [`PROFILES`], status.
const CONTRACTS: &[(usize, usize, ContractStatus)] = &[
    (1, 5, ContractStatus::Terminated),
    (1, 6, ContractStatus::InProgress),
    (2, 6, ContractStatus::InProgress),
    (2, 7, ContractStatus::InProgress),
    (3, 8, ContractStatus::New),
    (3, 7, ContractStatus::InProgress),
    (4, 7, ContractStatus::InProgress),
    (4, 6, ContractStatus::InProgress),
    (4, 8, ContractStatus::InProgress),
];

/// Price in whole units, 1-based contract position, payment day in
/// August 2020 if paid.
const JOBS: &[(i64, usize, Option<u32>)] = &[
    (200, 1, None),
    (201, 2, None),
    (202, 3, None),
    (200, 4, None),
    (200, 7, None),
    (2020, 7, Some(15)),
    (200, 2, Some(15)),
    (200, 3, Some(16)),
    (200, 1, Some(17)),
    (200, 5, Some(17)),
    (21, 1, Some(10)),
    (21, 2, Some(15)),
    (121, 3, Some(15)),
    (121, 3, Some(14)),
];

/// What [`seed_demo`] inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Profiles inserted.
    pub profiles: usize,
    /// Contracts inserted.
    pub contracts: usize,
    /// Jobs inserted.
    pub jobs: usize,
}

/// Insert the demo dataset if the store has no profiles yet.
///
/// # Errors
///
/// Returns the first store error encountered.
pub async fn seed_demo<S: Marketplace>(store: &S) -> Result<SeedSummary, MarketError> {
    if !store.is_empty().await? {
        info!("Store already has data, skipping demo seed");
        return Ok(SeedSummary::default());
    }

    let mut profiles: Vec<Profile> = Vec::with_capacity(PROFILES.len());
    for &(first_name, last_name, profession, cents, kind) in PROFILES {
        let profile = store
            .create_profile(NewProfile {
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
                profession: profession.to_owned(),
                balance: Decimal::new(cents, 2),
                kind,
            })
            .await?;
        profiles.push(profile);
    }

    let mut contracts: Vec<Contract> = Vec::with_capacity(CONTRACTS.len());
    for (n, &(client, contractor, status)) in CONTRACTS.iter().enumerate() {
        let contract = store
            .create_contract(NewContract {
                terms: format!("demo contract {}", n.saturating_add(1)),
                status,
                client_id: nth(&profiles, client)?.id,
                contractor_id: nth(&profiles, contractor)?.id,
            })
            .await?;
        contracts.push(contract);
    }

    for &(price, contract, paid_on) in JOBS {
        let payment_date = paid_on.map(august_2020).transpose()?;
        store
            .create_job(NewJob {
                description: "work".to_owned(),
                price: Decimal::new(price, 0),
                paid: payment_date.map(|_| true),
                payment_date,
                contract_id: nth(&contracts, contract)?.id,
            })
            .await?;
    }

    let summary = SeedSummary {
        profiles: profiles.len(),
        contracts: contracts.len(),
        jobs: JOBS.len(),
    };
    info!(
        profiles = summary.profiles,
        contracts = summary.contracts,
        jobs = summary.jobs,
        "Demo data seeded"
    );
    Ok(summary)
}

/// The item at a 1-based position.
fn nth<T>(items: &[T], position: usize) -> Result<&T, MarketError> {
    position
        .checked_sub(1)
        .and_then(|i| items.get(i))
        .ok_or_else(|| MarketError::internal(format!("demo data refers to missing row {position}")))
}

fn august_2020(day: u32) -> Result<DateTime<Utc>, MarketError> {
    NaiveDate::from_ymd_opt(2020, 8, day)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| MarketError::internal(format!("invalid demo payment day {day}")))
}
