//! # Collaborators — Where the Vault Meets the Outside World
//!
//! The engine deliberately does not implement identity, authorization,
//! pausing, or asset custody. Those concerns arrive through five narrow
//! traits, and the engine consumes exactly the observable behavior the
//! traits promise — nothing more:
//!
//! - [`AllowlistOracle`] — is this identity permitted to participate at all?
//! - [`RoleOracle`] — does this identity hold the approver or config role?
//! - [`AssetLedger`] — move the reference asset between parties. A refusal
//!   aborts the whole vault operation; there is no partial commit.
//! - [`PauseFlag`] — the operational kill switch. Gates normal flows and is
//!   the sole enabler of the emergency-withdraw path.
//! - [`OperatorRegistry`] — delegated claim rights: an owner can authorize
//!   another identity to claim on their behalf.
//!
//! The in-memory implementations below are real, not mocks: the node binary
//! runs on them, the demo runs on them, and the tests run on them. They
//! hand out cloneable shared handles so an admin surface can mutate
//! membership or flip the pause switch while the vault holds its own
//! reference.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::config::Amount;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Capabilities checked through the [`RoleOracle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// May approve, reject, and fast-path claim requests.
    Approver,
    /// May change vault parameters, custodian, allowlist reference, and
    /// drive the emergency path.
    Config,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Approver => write!(f, "approver"),
            Role::Config => write!(f, "config"),
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Membership oracle consulted before accepting any request, claim,
/// receiver, or transfer destination.
pub trait AllowlistOracle: Send + Sync {
    /// Whether the identity is permitted to hold shares and move assets.
    fn is_member(&self, identity: &str) -> bool;
}

/// Capability checks for admin-gated operations.
pub trait RoleOracle: Send + Sync {
    /// Whether the identity holds the given role.
    fn has_role(&self, identity: &str, role: Role) -> bool;
}

/// External custody ledger that moves the reference asset on instruction.
pub trait AssetLedger: Send + Sync {
    /// Moves `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// [`TransferError`] when the ledger refuses; the vault aborts the
    /// surrounding operation without committing any state.
    fn transfer(&mut self, from: &str, to: &str, amount: Amount) -> Result<(), TransferError>;
}

/// Operational-mode flag.
pub trait PauseFlag: Send + Sync {
    /// Whether the vault is paused. Pausing blocks normal flows and
    /// enables emergency withdrawals.
    fn is_paused(&self) -> bool;
}

/// Delegated claim rights, settable by the owning identity.
pub trait OperatorRegistry: Send + Sync {
    /// Whether `operator` may act (claim) on behalf of `owner`.
    fn is_operator(&self, owner: &str, operator: &str) -> bool;

    /// Grants or revokes `operator`'s rights over `owner`'s requests.
    fn set_operator(&mut self, owner: &str, operator: &str, authorized: bool);
}

// ---------------------------------------------------------------------------
// Transfer Errors
// ---------------------------------------------------------------------------

/// Refusals from the asset ledger.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The source account cannot cover the transfer.
    #[error("{account} holds {balance} asset units, transfer needs {required}")]
    InsufficientFunds {
        /// The account that fell short.
        account: String,
        /// Its balance at refusal time.
        balance: Amount,
        /// What the transfer needed.
        required: Amount,
    },

    /// The ledger refused for a reason of its own.
    #[error("asset transfer of {amount} from {from} to {to} refused: {reason}")]
    Refused {
        /// Source account.
        from: String,
        /// Destination account.
        to: String,
        /// Amount that was to move.
        amount: Amount,
        /// The ledger's stated reason.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// In-Memory Allowlist
// ---------------------------------------------------------------------------

/// Shared-handle membership set.
#[derive(Clone, Debug, Default)]
pub struct Allowlist {
    members: Arc<RwLock<HashSet<String>>>,
}

impl Allowlist {
    /// Creates an empty allowlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allowlist seeded with members.
    pub fn with_members<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: HashSet<String> = members.into_iter().map(Into::into).collect();
        Self { members: Arc::new(RwLock::new(set)) }
    }

    /// Adds a member. Visible immediately through every handle.
    pub fn add(&self, identity: &str) {
        self.members.write().insert(identity.to_string());
    }

    /// Removes a member.
    pub fn remove(&self, identity: &str) {
        self.members.write().remove(identity);
    }

    /// Snapshot of the current membership, sorted for stable output.
    pub fn members(&self) -> Vec<String> {
        let mut list: Vec<String> = self.members.read().iter().cloned().collect();
        list.sort();
        list
    }
}

impl AllowlistOracle for Allowlist {
    fn is_member(&self, identity: &str) -> bool {
        self.members.read().contains(identity)
    }
}

// ---------------------------------------------------------------------------
// In-Memory Role Table
// ---------------------------------------------------------------------------

/// Shared-handle role grants.
#[derive(Clone, Debug, Default)]
pub struct RoleTable {
    grants: Arc<RwLock<HashMap<String, HashSet<Role>>>>,
}

impl RoleTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants a role to an identity.
    pub fn grant(&self, identity: &str, role: Role) {
        self.grants.write().entry(identity.to_string()).or_default().insert(role);
    }

    /// Revokes a role from an identity.
    pub fn revoke(&self, identity: &str, role: Role) {
        if let Some(roles) = self.grants.write().get_mut(identity) {
            roles.remove(&role);
        }
    }
}

impl RoleOracle for RoleTable {
    fn has_role(&self, identity: &str, role: Role) -> bool {
        self.grants
            .read()
            .get(identity)
            .map(|roles| roles.contains(&role))
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// In-Memory Asset Ledger
// ---------------------------------------------------------------------------

/// Shared-handle asset custody book.
#[derive(Clone, Debug, Default)]
pub struct AssetBook {
    balances: Arc<RwLock<HashMap<String, Amount>>>,
}

impl AssetBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Funds an account out of thin air. Bootstrap helper for tests, the
    /// demo, and node startup; saturates rather than erroring.
    pub fn deposit(&self, account: &str, amount: Amount) {
        let mut balances = self.balances.write();
        let entry = balances.entry(account.to_string()).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// An account's balance. Unknown accounts hold zero.
    pub fn balance_of(&self, account: &str) -> Amount {
        self.balances.read().get(account).copied().unwrap_or(0)
    }
}

impl AssetLedger for AssetBook {
    fn transfer(&mut self, from: &str, to: &str, amount: Amount) -> Result<(), TransferError> {
        let mut balances = self.balances.write();
        let from_balance = balances.get(from).copied().unwrap_or(0);
        let from_remaining =
            from_balance
                .checked_sub(amount)
                .ok_or_else(|| TransferError::InsufficientFunds {
                    account: from.to_string(),
                    balance: from_balance,
                    required: amount,
                })?;
        let to_balance = balances.get(to).copied().unwrap_or(0);
        let to_updated = to_balance.checked_add(amount).ok_or_else(|| TransferError::Refused {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            reason: "destination balance overflow".to_string(),
        })?;
        balances.insert(from.to_string(), from_remaining);
        balances.insert(to.to_string(), to_updated);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pause Switch
// ---------------------------------------------------------------------------

/// Shared-handle pause flag.
#[derive(Clone, Debug, Default)]
pub struct PauseSwitch {
    paused: Arc<AtomicBool>,
}

impl PauseSwitch {
    /// Creates an unpaused switch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the switch. Visible immediately through every handle.
    pub fn set(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }
}

impl PauseFlag for PauseSwitch {
    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Operator Table
// ---------------------------------------------------------------------------

/// Owner → authorized operators. Owned by the vault and mutated through its
/// set-operator operation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OperatorTable {
    operators: HashMap<String, HashSet<String>>,
}

impl OperatorTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }
}

impl OperatorRegistry for OperatorTable {
    fn is_operator(&self, owner: &str, operator: &str) -> bool {
        self.operators
            .get(owner)
            .map(|set| set.contains(operator))
            .unwrap_or(false)
    }

    fn set_operator(&mut self, owner: &str, operator: &str, authorized: bool) {
        if authorized {
            self.operators
                .entry(owner.to_string())
                .or_default()
                .insert(operator.to_string());
        } else if let Some(set) = self.operators.get_mut(owner) {
            set.remove(operator);
            if set.is_empty() {
                self.operators.remove(owner);
            }
        }
    }
}
