//! Visibility rules for contracts and jobs.
//!
//! A profile only ever sees contracts it is a party to, as client or as
//! contractor. A contract the caller is not party to is reported exactly
//! like one that does not exist.

use serde::Deserialize;

use marketplace_types::{Contract, ContractStatus, Job, ProfileId};

/// Which contracts count as active when listing unpaid jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveContractFilter {
    /// Every contract that is not terminated (`new` or `in_progress`).
    #[default]
    NotTerminated,
    /// Only contracts currently `in_progress`.
    InProgressOnly,
}

impl ActiveContractFilter {
    /// Whether a contract with this status passes the filter.
    pub const fn admits(self, status: ContractStatus) -> bool {
        match self {
            Self::NotTerminated => status.is_open(),
            Self::InProgressOnly => matches!(status, ContractStatus::InProgress),
        }
    }

    /// The statuses that pass the filter, for building SQL predicates.
    pub const fn statuses(self) -> &'static [ContractStatus] {
        match self {
            Self::NotTerminated => &[ContractStatus::New, ContractStatus::InProgress],
            Self::InProgressOnly => &[ContractStatus::InProgress],
        }
    }
}

/// The contract if `caller` is party to it.
pub fn visible_contract(contract: &Contract, caller: ProfileId) -> Option<&Contract> {
    contract.involves(caller).then_some(contract)
}

/// Whether a contract belongs in the caller's contract list.
pub fn is_listed_contract(contract: &Contract, caller: ProfileId) -> bool {
    contract.involves(caller) && contract.status.is_open()
}

/// Whether a job belongs in the caller's unpaid list, given its contract.
pub fn is_listed_unpaid_job(
    job: &Job,
    contract: &Contract,
    caller: ProfileId,
    filter: ActiveContractFilter,
) -> bool {
    !job.paid && contract.involves(caller) && filter.admits(contract.status)
}
