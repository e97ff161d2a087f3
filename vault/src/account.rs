//! # Vault Account — Aggregate Root
//!
//! The central orchestrator. Every public operation in this module is a
//! complete, serialized state transition: it admits the caller, stages all
//! fallible work, and only then commits mutations to the books.
//!
//! ## Architecture
//!
//! ```text
//!  investors / approvers / operators
//!              |
//!              v
//!      +---------------+     allowlist / roles / pause
//!      | VaultAccount  | <-- (read-only collaborator queries)
//!      +---------------+
//!        |    |    |  \
//!        |    |    |   '--> asset ledger (custody transfers)
//!        v    v    v
//!   InvestmentBook  WithdrawalBook        (request lifecycles)
//!   ShareBook  CommitmentBook  ReservationBook  RefundBook
//! ```
//!
//! ## Design Principles
//!
//! 1. **Stage, then commit.** Each operation computes every fallible piece
//!    -- admission checks, share math, guard checks -- against immutable
//!    state first. A refusal at any point leaves the books exactly as they
//!    were; there is no partial application to undo.
//!
//! 2. **External transfers go first in the commit.** When an operation pays
//!    out through the asset ledger, the transfer is the first committed
//!    step: a refusal from the ledger aborts the operation with the vault's
//!    own accounting untouched. The mutations that follow are covered by
//!    the staging checks. `&mut self` makes re-entry through the ledger
//!    impossible while a commit is in flight.
//!
//! 3. **Time is a parameter.** Operations that depend on elapsed time take
//!    an explicit `now`; the engine never reads a clock. Accrued value is
//!    computed lazily from the last materialized snapshot and only written
//!    back when an operation commits.
//!
//! 4. **No deletion.** Request records, once created, stay in their books
//!    forever as the audit trail; identifiers are never reusable.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::accrual::{self, AccrualError};
use crate::collaborators::{
    AllowlistOracle, AssetLedger, OperatorRegistry, PauseFlag, Role, RoleOracle,
};
use crate::config::{Amount, RateMicrobip, Timestamp, VaultParams};
use crate::conversion::{self, Rounding};
use crate::error::VaultError;
use crate::events::{EventKind, VaultEvent};
use crate::holdings::{
    CommitmentBook, HoldingsError, RefundBook, ReservationBook, ShareBook,
};
use crate::ledger::{
    InvestmentBook, InvestmentRequest, LedgerError, WithdrawalBook, WithdrawalRequest,
};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The external services a vault is wired to at construction.
pub struct Collaborators {
    /// Membership oracle for investors, receivers, and transfer targets.
    pub allowlist: Box<dyn AllowlistOracle>,
    /// Role checks for approver- and config-gated operations.
    pub roles: Box<dyn RoleOracle>,
    /// Custody ledger that moves the reference asset.
    pub assets: Box<dyn AssetLedger>,
    /// Operational-mode flag.
    pub pause: Box<dyn PauseFlag>,
    /// Delegated claim rights.
    pub operators: Box<dyn OperatorRegistry>,
}

// ---------------------------------------------------------------------------
// Initiator
// ---------------------------------------------------------------------------

/// Who is driving a claim, resolved once at the call boundary.
///
/// An approver acts as [`Initiator::Admin`] and bypasses the ownership
/// check; anyone else is a [`Initiator::Holder`] and must be the request's
/// investor or one of their registered operators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Initiator {
    /// A caller holding the approver role.
    Admin,
    /// An ordinary identity acting for itself or as an operator.
    Holder(String),
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Serializable snapshot of the vault's aggregate state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VaultView {
    /// Custody account the reference asset moves through.
    pub custodian: String,
    /// Outstanding share supply.
    pub total_shares: Amount,
    /// Last materialized managed total.
    pub stored_total_value: Amount,
    /// Managed total with accrual applied up to the query time.
    pub current_total_value: Amount,
    /// When the stored total was last materialized.
    pub value_updated_at: Timestamp,
    /// Operational parameters.
    pub params: VaultParams,
    /// Whether the pause flag is set.
    pub paused: bool,
    /// Investment requests ever recorded.
    pub investment_requests: usize,
    /// Withdrawal requests ever recorded.
    pub withdrawal_requests: usize,
    /// Events recorded over the vault's lifetime.
    pub event_count: usize,
}

/// Serializable snapshot of one holder's position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HolderView {
    /// The holder.
    pub identity: String,
    /// Share balance.
    pub shares: Amount,
    /// Shares locked under an active commitment at the query time.
    pub committed_shares: Amount,
    /// Commitment expiry, `0` when no commitment is active.
    pub committed_until: Timestamp,
    /// Shares reserved by approved-but-unclaimed withdrawals.
    pub reserved_shares: Amount,
    /// Shares free of commitments and reservations.
    pub spendable_shares: Amount,
    /// Asset refund awaiting a claim.
    pub pending_refund: Amount,
    /// Floor asset value of the full share balance.
    pub asset_value: Amount,
}

// ---------------------------------------------------------------------------
// Staged Claims
// ---------------------------------------------------------------------------

/// Everything an investment claim will commit, computed up front.
struct StagedInvestmentClaim {
    investor: String,
    amount: Amount,
    committed_until: Timestamp,
    minted: Amount,
    updated_value: Amount,
}

/// Everything a withdrawal claim will commit, computed up front.
struct StagedWithdrawalClaim {
    investor: String,
    shares: Amount,
    payout: Amount,
    updated_value: Amount,
}

// ---------------------------------------------------------------------------
// VaultAccount
// ---------------------------------------------------------------------------

/// The aggregate root: share supply, accrued value, request books, holder
/// books, and the collaborator wiring.
pub struct VaultAccount {
    params: VaultParams,
    custodian: String,
    share_decimals: u8,
    asset_decimals: u8,
    total_value: Amount,
    value_updated_at: Timestamp,
    shares: ShareBook,
    investments: InvestmentBook,
    withdrawals: WithdrawalBook,
    commitments: CommitmentBook,
    reservations: ReservationBook,
    refunds: RefundBook,
    collaborators: Collaborators,
    events: Vec<VaultEvent>,
}

impl VaultAccount {
    /// Creates a vault with no shares, no value, and empty books.
    ///
    /// # Errors
    ///
    /// [`VaultError::EmptyIdentity`] for a blank custodian and
    /// [`VaultError::InvalidBounds`] for inverted parameter bounds.
    pub fn new(
        params: VaultParams,
        custodian: impl Into<String>,
        share_decimals: u8,
        asset_decimals: u8,
        collaborators: Collaborators,
    ) -> Result<Self, VaultError> {
        let custodian = custodian.into();
        Self::ensure_identity(&custodian)?;
        Self::ensure_params(&params)?;
        info!(custodian = %custodian, share_decimals, asset_decimals, "vault account created");
        Ok(Self {
            params,
            custodian,
            share_decimals,
            asset_decimals,
            total_value: 0,
            value_updated_at: 0,
            shares: ShareBook::new(),
            investments: InvestmentBook::new(),
            withdrawals: WithdrawalBook::new(),
            commitments: CommitmentBook::new(),
            reservations: ReservationBook::new(),
            refunds: RefundBook::new(),
            collaborators,
            events: Vec::new(),
        })
    }

    // -- investment lifecycle ------------------------------------------------

    /// Records an investment request and moves the amount into custody.
    ///
    /// `committed_until` carries into the eventual claim: a value still in
    /// the future at claim time locks the minted shares until then. `0`
    /// means no lock.
    ///
    /// # Errors
    ///
    /// Admission failures (pause, membership, closed vault, bounds,
    /// duplicate id), a growth-guard refusal against the current accrued
    /// total, or a refused custody transfer. A failure anywhere leaves no
    /// trace of the request.
    pub fn request_investment(
        &mut self,
        caller: &str,
        id: &str,
        amount: Amount,
        committed_until: Timestamp,
        now: Timestamp,
    ) -> Result<&InvestmentRequest, VaultError> {
        self.ensure_not_paused()?;
        Self::ensure_identity(caller)?;
        self.ensure_member(caller)?;
        self.ensure_open()?;
        if id.is_empty() {
            return Err(LedgerError::EmptyId.into());
        }
        if self.investments.contains(id) {
            return Err(LedgerError::DuplicateId { id: id.to_string() }.into());
        }
        Self::ensure_within(amount, self.params.min_investment, self.params.max_investment)?;
        let current = self.current_value(now)?;
        let admitted = current
            .checked_add(amount)
            .ok_or(AccrualError::Overflow { context: "admitted total" })?;
        self.ensure_growth_allowed(current, admitted)?;

        // Escrow before recording; a refused transfer leaves no trace.
        self.collaborators.assets.transfer(caller, &self.custodian, amount)?;

        self.investments.create(id, caller, amount, committed_until)?;
        self.record(EventKind::InvestmentRequested {
            id: id.to_string(),
            investor: caller.to_string(),
            amount,
            committed_until,
        });
        debug!(id, investor = caller, amount = %amount, "investment requested");
        Ok(self.investments.get(id)?)
    }

    /// Approves a pending investment request. Approver role required.
    ///
    /// # Errors
    ///
    /// Role and lifecycle guards; approving twice fails rather than being
    /// silently idempotent.
    pub fn approve_investment(
        &mut self,
        caller: &str,
        id: &str,
    ) -> Result<&InvestmentRequest, VaultError> {
        self.ensure_not_paused()?;
        Self::ensure_identity(caller)?;
        self.ensure_role(caller, Role::Approver)?;
        self.investments.approve(id)?;
        self.record(EventKind::InvestmentApproved { id: id.to_string() });
        debug!(id, approver = caller, "investment approved");
        Ok(self.investments.get(id)?)
    }

    /// Claims an approved investment: mints floor-rounded shares to
    /// `receiver` and admits the escrowed amount into the managed total.
    ///
    /// Approver-role callers claim on anyone's behalf; other callers must
    /// be the investor or a registered operator of the investor.
    ///
    /// # Errors
    ///
    /// Lifecycle guards, ownership resolution, receiver membership, share
    /// math overflow, or a growth-guard refusal.
    pub fn claim_investment(
        &mut self,
        caller: &str,
        id: &str,
        receiver: &str,
        now: Timestamp,
    ) -> Result<&InvestmentRequest, VaultError> {
        self.ensure_not_paused()?;
        Self::ensure_identity(caller)?;
        Self::ensure_identity(receiver)?;
        {
            let request = self.investments.get(id)?;
            request.ensure_claimable()?;
            let initiator = self.resolve_initiator(caller);
            self.ensure_may_claim(&initiator, &request.investor)?;
        }
        let staged = self.stage_investment_claim(id, receiver, now)?;
        self.commit_investment_claim(id, receiver, staged, now)?;
        Ok(self.investments.get(id)?)
    }

    /// Privileged fast path: approves and immediately claims an investment
    /// as admin initiator. Approver role required.
    ///
    /// The claim is staged before the approval lands, so a claim-side
    /// refusal (guard, membership, math) leaves the request unapproved.
    ///
    /// # Errors
    ///
    /// Same surface as [`VaultAccount::approve_investment`] plus
    /// [`VaultAccount::claim_investment`].
    pub fn approve_then_claim_investment(
        &mut self,
        caller: &str,
        id: &str,
        receiver: &str,
        now: Timestamp,
    ) -> Result<&InvestmentRequest, VaultError> {
        self.ensure_not_paused()?;
        Self::ensure_identity(caller)?;
        Self::ensure_identity(receiver)?;
        self.ensure_role(caller, Role::Approver)?;
        {
            let request = self.investments.get(id)?;
            if request.claimed {
                return Err(LedgerError::AlreadyClaimed { id: id.to_string() }.into());
            }
            if request.rejected {
                return Err(LedgerError::AlreadyRejected { id: id.to_string() }.into());
            }
            if request.approved {
                return Err(LedgerError::AlreadyApproved { id: id.to_string() }.into());
            }
        }
        let staged = self.stage_investment_claim(id, receiver, now)?;
        self.investments.approve(id)?;
        self.record(EventKind::InvestmentApproved { id: id.to_string() });
        self.commit_investment_claim(id, receiver, staged, now)?;
        Ok(self.investments.get(id)?)
    }

    /// Rejects an investment request and credits the escrowed amount to the
    /// investor's pending refund. Approver role required.
    ///
    /// An approved-but-unclaimed request can still be rejected; a claimed
    /// or already-rejected one cannot.
    ///
    /// # Errors
    ///
    /// Role and lifecycle guards, or refund-counter overflow.
    pub fn reject_investment(
        &mut self,
        caller: &str,
        id: &str,
    ) -> Result<&InvestmentRequest, VaultError> {
        self.ensure_not_paused()?;
        Self::ensure_identity(caller)?;
        self.ensure_role(caller, Role::Approver)?;
        let (investor, amount) = {
            let request = self.investments.get(id)?;
            if request.claimed {
                return Err(LedgerError::AlreadyClaimed { id: id.to_string() }.into());
            }
            if request.rejected {
                return Err(LedgerError::AlreadyRejected { id: id.to_string() }.into());
            }
            (request.investor.clone(), request.amount)
        };
        self.refunds.credit(&investor, amount)?;
        self.investments.reject(id)?;
        self.record(EventKind::InvestmentRejected {
            id: id.to_string(),
            investor: investor.clone(),
            refund: amount,
        });
        info!(id, investor = %investor, refund = %amount, "investment rejected");
        Ok(self.investments.get(id)?)
    }

    // -- withdrawal lifecycle ------------------------------------------------

    /// Records a withdrawal request, freezing its ceiling-rounded share
    /// cost at today's ratio.
    ///
    /// The frozen share count is what approval reserves and what the claim
    /// eventually burns, regardless of how the ratio drifts in between.
    ///
    /// # Errors
    ///
    /// Admission failures, [`VaultError::NoLiquidity`] when no ratio
    /// exists, or holdings refusals when the caller's balance cannot cover
    /// the shares on top of active commitments and reservations.
    pub fn request_withdrawal(
        &mut self,
        caller: &str,
        id: &str,
        amount: Amount,
        now: Timestamp,
    ) -> Result<&WithdrawalRequest, VaultError> {
        self.ensure_not_paused()?;
        Self::ensure_identity(caller)?;
        self.ensure_member(caller)?;
        self.ensure_open()?;
        if id.is_empty() {
            return Err(LedgerError::EmptyId.into());
        }
        if self.withdrawals.contains(id) {
            return Err(LedgerError::DuplicateId { id: id.to_string() }.into());
        }
        Self::ensure_within(amount, self.params.min_withdrawal, self.params.max_withdrawal)?;
        let current = self.current_value(now)?;
        let total_shares = self.shares.total();
        if total_shares == 0 || current == 0 {
            return Err(VaultError::NoLiquidity);
        }
        let needed = conversion::shares_from_assets(amount, total_shares, current, Rounding::Ceil)?;
        let balance = self.shares.balance_of(caller);
        if balance < needed {
            return Err(HoldingsError::InsufficientShares {
                holder: caller.to_string(),
                balance,
                required: needed,
            }
            .into());
        }
        self.commitments.ensure_can_reduce(caller, balance, needed, now)?;
        let reserved = self.reservations.reserved(caller);
        let available = balance.saturating_sub(reserved);
        if available < needed {
            return Err(HoldingsError::ReservedBalance {
                holder: caller.to_string(),
                reserved,
                available,
                required: needed,
            }
            .into());
        }

        self.withdrawals.create(id, caller, amount, needed)?;
        self.record(EventKind::WithdrawalRequested {
            id: id.to_string(),
            investor: caller.to_string(),
            amount,
            shares: needed,
        });
        debug!(id, investor = caller, amount = %amount, shares = %needed, "withdrawal requested");
        Ok(self.withdrawals.get(id)?)
    }

    /// Records a withdrawal request and hands back just the frozen share
    /// cost. Equivalent to [`VaultAccount::request_withdrawal`] for callers
    /// that only care about the number.
    pub fn request_withdrawal_shares(
        &mut self,
        caller: &str,
        id: &str,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount, VaultError> {
        Ok(self.request_withdrawal(caller, id, amount, now)?.shares)
    }

    /// Approves a pending withdrawal and reserves its frozen shares against
    /// the investor. Approver role required.
    ///
    /// # Errors
    ///
    /// Role and lifecycle guards, or reservation-counter overflow.
    pub fn approve_withdrawal(
        &mut self,
        caller: &str,
        id: &str,
    ) -> Result<&WithdrawalRequest, VaultError> {
        self.ensure_not_paused()?;
        Self::ensure_identity(caller)?;
        self.ensure_role(caller, Role::Approver)?;
        let (investor, shares) = {
            let request = self.withdrawals.get(id)?;
            if request.claimed {
                return Err(LedgerError::AlreadyClaimed { id: id.to_string() }.into());
            }
            if request.rejected {
                return Err(LedgerError::AlreadyRejected { id: id.to_string() }.into());
            }
            if request.approved {
                return Err(LedgerError::AlreadyApproved { id: id.to_string() }.into());
            }
            (request.investor.clone(), request.shares)
        };
        self.reservations.reserve(&investor, shares)?;
        self.withdrawals.approve(id)?;
        self.record(EventKind::WithdrawalApproved {
            id: id.to_string(),
            shares_reserved: shares,
        });
        debug!(id, approver = caller, shares = %shares, "withdrawal approved");
        Ok(self.withdrawals.get(id)?)
    }

    /// Claims an approved withdrawal: burns the frozen shares, pays their
    /// floor value out of custody, and shrinks the managed total.
    ///
    /// The payout is priced at claim-time ratios against the share count
    /// frozen at request time.
    ///
    /// # Errors
    ///
    /// Lifecycle and ownership guards, [`VaultError::ZeroPayout`] when the
    /// shares floor to nothing, holdings refusals, or a refused custody
    /// transfer.
    pub fn claim_withdrawal(
        &mut self,
        caller: &str,
        id: &str,
        now: Timestamp,
    ) -> Result<&WithdrawalRequest, VaultError> {
        self.ensure_not_paused()?;
        Self::ensure_identity(caller)?;
        {
            let request = self.withdrawals.get(id)?;
            request.ensure_claimable()?;
            let initiator = self.resolve_initiator(caller);
            self.ensure_may_claim(&initiator, &request.investor)?;
        }
        let staged = self.stage_withdrawal_claim(id, now)?;
        self.commit_withdrawal_claim(id, staged, now)?;
        Ok(self.withdrawals.get(id)?)
    }

    /// Privileged fast path: approves and immediately claims a withdrawal
    /// as admin initiator. Approver role required.
    ///
    /// # Errors
    ///
    /// Same surface as [`VaultAccount::approve_withdrawal`] plus
    /// [`VaultAccount::claim_withdrawal`].
    pub fn approve_then_claim_withdrawal(
        &mut self,
        caller: &str,
        id: &str,
        now: Timestamp,
    ) -> Result<&WithdrawalRequest, VaultError> {
        self.ensure_not_paused()?;
        Self::ensure_identity(caller)?;
        self.ensure_role(caller, Role::Approver)?;
        let (investor, shares) = {
            let request = self.withdrawals.get(id)?;
            if request.claimed {
                return Err(LedgerError::AlreadyClaimed { id: id.to_string() }.into());
            }
            if request.rejected {
                return Err(LedgerError::AlreadyRejected { id: id.to_string() }.into());
            }
            if request.approved {
                return Err(LedgerError::AlreadyApproved { id: id.to_string() }.into());
            }
            (request.investor.clone(), request.shares)
        };
        let staged = self.stage_withdrawal_claim(id, now)?;
        self.reservations.reserve(&investor, shares)?;
        self.withdrawals.approve(id)?;
        self.record(EventKind::WithdrawalApproved {
            id: id.to_string(),
            shares_reserved: shares,
        });
        self.commit_withdrawal_claim(id, staged, now)?;
        Ok(self.withdrawals.get(id)?)
    }

    /// Rejects a withdrawal request, releasing its reservation when it had
    /// been approved. Approver role required.
    ///
    /// The id stays closed forever; the investor resubmits under a new one.
    ///
    /// # Errors
    ///
    /// Role and lifecycle guards.
    pub fn reject_withdrawal(
        &mut self,
        caller: &str,
        id: &str,
    ) -> Result<&WithdrawalRequest, VaultError> {
        self.ensure_not_paused()?;
        Self::ensure_identity(caller)?;
        self.ensure_role(caller, Role::Approver)?;
        let (investor, shares, was_approved) = {
            let request = self.withdrawals.get(id)?;
            request.ensure_rejectable()?;
            (request.investor.clone(), request.shares, request.approved)
        };
        if was_approved {
            self.reservations.release(&investor, shares)?;
        }
        self.withdrawals.reject(id)?;
        self.record(EventKind::WithdrawalRejected {
            id: id.to_string(),
            investor: investor.clone(),
            shares_released: if was_approved { shares } else { 0 },
        });
        info!(id, investor = %investor, "withdrawal rejected");
        Ok(self.withdrawals.get(id)?)
    }

    // -- refunds and emergency ----------------------------------------------

    /// Pays out the caller's pending refund from custody and zeroes it.
    ///
    /// # Errors
    ///
    /// [`VaultError::NoRefund`] when nothing is pending, or a refused
    /// custody transfer (which leaves the refund claimable).
    pub fn claim_refund(&mut self, caller: &str) -> Result<Amount, VaultError> {
        self.ensure_not_paused()?;
        Self::ensure_identity(caller)?;
        self.ensure_member(caller)?;
        let pending = self.refunds.pending(caller);
        if pending == 0 {
            return Err(VaultError::NoRefund { identity: caller.to_string() });
        }
        self.collaborators.assets.transfer(&self.custodian, caller, pending)?;
        let taken = self.refunds.take(caller);
        self.record(EventKind::RefundClaimed {
            investor: caller.to_string(),
            amount: taken,
        });
        info!(investor = caller, amount = %taken, "refund claimed");
        Ok(taken)
    }

    /// Break-glass path, operable only while paused: burns the
    /// ceiling-rounded share equivalent of `amount` from `user` and moves
    /// `amount` from custody to them, bypassing the request flow entirely.
    /// Config role required.
    ///
    /// Returns the number of shares burned.
    ///
    /// # Errors
    ///
    /// [`VaultError::NotPaused`] outside pause, role and membership guards,
    /// [`VaultError::NoLiquidity`] with no ratio, holdings refusals, or a
    /// refused custody transfer.
    pub fn emergency_withdraw(
        &mut self,
        caller: &str,
        user: &str,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount, VaultError> {
        self.ensure_paused()?;
        Self::ensure_identity(caller)?;
        Self::ensure_identity(user)?;
        self.ensure_role(caller, Role::Config)?;
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }
        self.ensure_member(user)?;
        let current = self.current_value(now)?;
        let total_shares = self.shares.total();
        if total_shares == 0 || current == 0 {
            return Err(VaultError::NoLiquidity);
        }
        let needed = conversion::shares_from_assets(amount, total_shares, current, Rounding::Ceil)?;
        let balance = self.shares.balance_of(user);
        if balance < needed {
            return Err(HoldingsError::InsufficientShares {
                holder: user.to_string(),
                balance,
                required: needed,
            }
            .into());
        }
        self.commitments.ensure_can_reduce(user, balance, needed, now)?;
        // Managed total drops by the amount moved, floored at zero.
        let updated = current.saturating_sub(amount);

        self.collaborators.assets.transfer(&self.custodian, user, amount)?;
        self.shares.burn(user, needed)?;
        self.total_value = updated;
        self.value_updated_at = now;
        self.record(EventKind::EmergencyWithdrawal {
            destination: user.to_string(),
            amount,
            shares_burned: needed,
        });
        warn!(destination = user, amount = %amount, shares = %needed, "emergency withdrawal executed");
        Ok(needed)
    }

    // -- transfers and operators ---------------------------------------------

    /// Moves shares directly between holders, honoring commitments.
    ///
    /// The destination must be allowlisted; the sender's post-transfer
    /// balance must still cover any active commitment. Reserved shares are
    /// not checked here -- the reservation invariant is enforced where
    /// reservations are set.
    ///
    /// # Errors
    ///
    /// Admission failures plus holdings refusals.
    pub fn transfer_shares(
        &mut self,
        caller: &str,
        to: &str,
        shares: Amount,
        now: Timestamp,
    ) -> Result<(), VaultError> {
        self.ensure_not_paused()?;
        Self::ensure_identity(caller)?;
        Self::ensure_identity(to)?;
        if shares == 0 {
            return Err(VaultError::ZeroAmount);
        }
        self.ensure_member(to)?;
        let balance = self.shares.balance_of(caller);
        if balance < shares {
            return Err(HoldingsError::InsufficientShares {
                holder: caller.to_string(),
                balance,
                required: shares,
            }
            .into());
        }
        self.commitments.ensure_can_reduce(caller, balance, shares, now)?;
        self.shares.transfer(caller, to, shares)?;
        self.record(EventKind::SharesTransferred {
            from: caller.to_string(),
            to: to.to_string(),
            shares,
        });
        debug!(from = caller, to, shares = %shares, "shares transferred");
        Ok(())
    }

    /// Grants or revokes an operator's right to claim on the caller's
    /// behalf. Unlike the normal flows, this stays available while paused.
    ///
    /// # Errors
    ///
    /// [`VaultError::EmptyIdentity`] on blank identities.
    pub fn set_operator(
        &mut self,
        caller: &str,
        operator: &str,
        authorized: bool,
    ) -> Result<(), VaultError> {
        Self::ensure_identity(caller)?;
        Self::ensure_identity(operator)?;
        self.collaborators.operators.set_operator(caller, operator, authorized);
        self.record(EventKind::OperatorSet {
            owner: caller.to_string(),
            operator: operator.to_string(),
            authorized,
        });
        debug!(owner = caller, operator, authorized, "operator updated");
        Ok(())
    }

    /// Whether `operator` may claim on behalf of `owner`.
    pub fn is_operator(&self, owner: &str, operator: &str) -> bool {
        self.collaborators.operators.is_operator(owner, operator)
    }

    // -- administration ------------------------------------------------------

    /// Replaces the managed total outright, subject to the growth guard
    /// against the current accrued value. Config role required.
    ///
    /// Available while paused; the emergency path depends on the total
    /// staying correctable.
    ///
    /// # Errors
    ///
    /// Role guard or [`VaultError::GrowthLimitExceeded`].
    pub fn update_total_value(
        &mut self,
        caller: &str,
        new_value: Amount,
        now: Timestamp,
    ) -> Result<Amount, VaultError> {
        Self::ensure_identity(caller)?;
        self.ensure_role(caller, Role::Config)?;
        let current = self.current_value(now)?;
        self.ensure_growth_allowed(current, new_value)?;
        self.total_value = new_value;
        self.value_updated_at = now;
        self.record(EventKind::TotalValueSet { previous: current, updated: new_value });
        info!(previous = %current, updated = %new_value, "managed total replaced");
        Ok(new_value)
    }

    /// Changes the daily yield rate, settling accrual at the outgoing rate
    /// first so the change never applies retroactively. Config role
    /// required.
    ///
    /// # Errors
    ///
    /// Role guard or accrual overflow while settling.
    pub fn set_daily_yield_rate(
        &mut self,
        caller: &str,
        rate: RateMicrobip,
        now: Timestamp,
    ) -> Result<(), VaultError> {
        Self::ensure_identity(caller)?;
        self.ensure_role(caller, Role::Config)?;
        let settled = self.current_value(now)?;
        let previous = self.params.daily_yield_rate;
        self.total_value = settled;
        self.value_updated_at = now;
        self.params.daily_yield_rate = rate;
        self.record(EventKind::RateChanged { previous, updated: rate, settled_total: settled });
        info!(previous, updated = rate, "daily yield rate changed");
        Ok(())
    }

    /// Sets the investment bounds. Config role required.
    ///
    /// # Errors
    ///
    /// Role guard or [`VaultError::InvalidBounds`].
    pub fn set_investment_bounds(
        &mut self,
        caller: &str,
        min: Amount,
        max: Amount,
    ) -> Result<(), VaultError> {
        Self::ensure_identity(caller)?;
        self.ensure_role(caller, Role::Config)?;
        if min > max {
            return Err(VaultError::InvalidBounds { min, max });
        }
        self.params.min_investment = min;
        self.params.max_investment = max;
        self.record(EventKind::ParamsUpdated { params: self.params.clone() });
        info!(min = %min, max = %max, "investment bounds updated");
        Ok(())
    }

    /// Sets the withdrawal bounds. Config role required.
    ///
    /// # Errors
    ///
    /// Role guard or [`VaultError::InvalidBounds`].
    pub fn set_withdrawal_bounds(
        &mut self,
        caller: &str,
        min: Amount,
        max: Amount,
    ) -> Result<(), VaultError> {
        Self::ensure_identity(caller)?;
        self.ensure_role(caller, Role::Config)?;
        if min > max {
            return Err(VaultError::InvalidBounds { min, max });
        }
        self.params.min_withdrawal = min;
        self.params.max_withdrawal = max;
        self.record(EventKind::ParamsUpdated { params: self.params.clone() });
        info!(min = %min, max = %max, "withdrawal bounds updated");
        Ok(())
    }

    /// Sets the growth-guard factor; `0` disables the guard. Config role
    /// required.
    ///
    /// # Errors
    ///
    /// Role guard.
    pub fn set_growth_guard(&mut self, caller: &str, factor: u64) -> Result<(), VaultError> {
        Self::ensure_identity(caller)?;
        self.ensure_role(caller, Role::Config)?;
        self.params.growth_guard_factor = factor;
        self.record(EventKind::ParamsUpdated { params: self.params.clone() });
        info!(factor, "growth guard updated");
        Ok(())
    }

    /// Opens or closes the vault to new requests. Config role required.
    ///
    /// # Errors
    ///
    /// Role guard.
    pub fn set_open(&mut self, caller: &str, open: bool) -> Result<(), VaultError> {
        Self::ensure_identity(caller)?;
        self.ensure_role(caller, Role::Config)?;
        self.params.is_open = open;
        self.record(EventKind::ParamsUpdated { params: self.params.clone() });
        info!(open, "vault open flag updated");
        Ok(())
    }

    /// Changes the custody account future transfers run through. Config
    /// role required.
    ///
    /// # Errors
    ///
    /// Role guard or [`VaultError::EmptyIdentity`].
    pub fn set_custodian(&mut self, caller: &str, custodian: &str) -> Result<(), VaultError> {
        Self::ensure_identity(caller)?;
        Self::ensure_identity(custodian)?;
        self.ensure_role(caller, Role::Config)?;
        let previous = std::mem::replace(&mut self.custodian, custodian.to_string());
        self.record(EventKind::CustodianChanged {
            previous,
            updated: custodian.to_string(),
        });
        info!(custodian, "custodian changed");
        Ok(())
    }

    /// Replaces the allowlist oracle. Config role required.
    ///
    /// # Errors
    ///
    /// Role guard.
    pub fn set_allowlist(
        &mut self,
        caller: &str,
        allowlist: Box<dyn AllowlistOracle>,
    ) -> Result<(), VaultError> {
        Self::ensure_identity(caller)?;
        self.ensure_role(caller, Role::Config)?;
        self.collaborators.allowlist = allowlist;
        info!("allowlist reference replaced");
        Ok(())
    }

    // -- conversions and previews --------------------------------------------

    /// Floor shares for an asset amount at current ratios, with the
    /// decimal-offset bootstrap when no ratio exists.
    ///
    /// # Errors
    ///
    /// Accrual or conversion overflow.
    pub fn convert_to_shares(&self, assets: Amount, now: Timestamp) -> Result<Amount, VaultError> {
        let current = self.current_value(now)?;
        self.deposit_shares(assets, current)
    }

    /// Floor asset value of a share amount at current ratios. Zero while no
    /// shares exist.
    ///
    /// # Errors
    ///
    /// Accrual or conversion overflow.
    pub fn convert_to_assets(&self, shares: Amount, now: Timestamp) -> Result<Amount, VaultError> {
        let current = self.current_value(now)?;
        Ok(conversion::assets_from_shares(
            shares,
            self.shares.total(),
            current,
            Rounding::Floor,
        )?)
    }

    /// Shares an investment claim of `assets` would mint right now.
    ///
    /// # Errors
    ///
    /// Accrual or conversion overflow.
    pub fn preview_deposit(&self, assets: Amount, now: Timestamp) -> Result<Amount, VaultError> {
        self.convert_to_shares(assets, now)
    }

    /// Assets required to mint `shares`, rounded against the investor.
    ///
    /// # Errors
    ///
    /// Accrual or conversion overflow.
    pub fn preview_mint(&self, shares: Amount, now: Timestamp) -> Result<Amount, VaultError> {
        let current = self.current_value(now)?;
        let total_shares = self.shares.total();
        if total_shares == 0 || current == 0 {
            return Ok(conversion::unscale_by_offset(shares, self.offset())?);
        }
        Ok(conversion::assets_from_shares(shares, total_shares, current, Rounding::Ceil)?)
    }

    /// Shares a withdrawal request of `assets` would freeze right now.
    ///
    /// # Errors
    ///
    /// [`VaultError::NoLiquidity`] when no ratio exists, mirroring the
    /// request itself.
    pub fn preview_withdraw(&self, assets: Amount, now: Timestamp) -> Result<Amount, VaultError> {
        let current = self.current_value(now)?;
        let total_shares = self.shares.total();
        if total_shares == 0 || current == 0 {
            return Err(VaultError::NoLiquidity);
        }
        Ok(conversion::shares_from_assets(assets, total_shares, current, Rounding::Ceil)?)
    }

    /// Assets a claim burning `shares` would pay out right now.
    ///
    /// # Errors
    ///
    /// Accrual or conversion overflow.
    pub fn preview_redeem(&self, shares: Amount, now: Timestamp) -> Result<Amount, VaultError> {
        self.convert_to_assets(shares, now)
    }

    /// The largest investment `identity` could request right now: the
    /// configured maximum capped by growth-guard headroom, or zero when the
    /// vault is closed, paused, the identity is not a member, or the cap
    /// falls below the configured minimum.
    ///
    /// # Errors
    ///
    /// Accrual overflow.
    pub fn max_deposit(&self, identity: &str, now: Timestamp) -> Result<Amount, VaultError> {
        if !self.params.is_open
            || self.is_paused()
            || !self.collaborators.allowlist.is_member(identity)
        {
            return Ok(0);
        }
        let current = self.current_value(now)?;
        let cap = if self.params.growth_guard_factor == 0 || current == 0 {
            self.params.max_investment
        } else {
            let headroom = accrual::max_allowed_tvl(current, self.params.growth_guard_factor)
                .saturating_sub(current);
            self.params.max_investment.min(headroom)
        };
        if cap < self.params.min_investment {
            return Ok(0);
        }
        Ok(cap)
    }

    /// Share equivalent of [`VaultAccount::max_deposit`].
    ///
    /// # Errors
    ///
    /// Accrual or conversion overflow.
    pub fn max_mint(&self, identity: &str, now: Timestamp) -> Result<Amount, VaultError> {
        let cap = self.max_deposit(identity, now)?;
        if cap == 0 {
            return Ok(0);
        }
        let current = self.current_value(now)?;
        self.deposit_shares(cap, current)
    }

    /// The largest withdrawal `holder` could request right now: the floor
    /// value of their shares outside commitments and reservations, capped
    /// by the configured maximum, or zero under the same conditions as
    /// [`VaultAccount::max_deposit`].
    ///
    /// # Errors
    ///
    /// Accrual or conversion overflow.
    pub fn max_withdraw(&self, holder: &str, now: Timestamp) -> Result<Amount, VaultError> {
        if !self.params.is_open
            || self.is_paused()
            || !self.collaborators.allowlist.is_member(holder)
        {
            return Ok(0);
        }
        let current = self.current_value(now)?;
        let total_shares = self.shares.total();
        if total_shares == 0 || current == 0 {
            return Ok(0);
        }
        let spendable = self.spendable_shares_of(holder, now);
        let assets =
            conversion::assets_from_shares(spendable, total_shares, current, Rounding::Floor)?;
        let cap = assets.min(self.params.max_withdrawal);
        if cap < self.params.min_withdrawal {
            return Ok(0);
        }
        Ok(cap)
    }

    /// Share equivalent of [`VaultAccount::max_withdraw`], rounded the way
    /// a request would round.
    ///
    /// # Errors
    ///
    /// Accrual or conversion overflow.
    pub fn max_redeem(&self, holder: &str, now: Timestamp) -> Result<Amount, VaultError> {
        let cap = self.max_withdraw(holder, now)?;
        if cap == 0 {
            return Ok(0);
        }
        let current = self.current_value(now)?;
        Ok(conversion::shares_from_assets(cap, self.shares.total(), current, Rounding::Ceil)?)
    }

    // -- read-only state -----------------------------------------------------

    /// Current operational parameters.
    pub fn params(&self) -> &VaultParams {
        &self.params
    }

    /// The custody account.
    pub fn custodian(&self) -> &str {
        &self.custodian
    }

    /// Outstanding share supply.
    pub fn total_shares(&self) -> Amount {
        self.shares.total()
    }

    /// A holder's share balance.
    pub fn balance_of(&self, holder: &str) -> Amount {
        self.shares.balance_of(holder)
    }

    /// Last materialized managed total.
    pub fn stored_total_value(&self) -> Amount {
        self.total_value
    }

    /// When the managed total was last materialized.
    pub fn value_updated_at(&self) -> Timestamp {
        self.value_updated_at
    }

    /// The managed total with accrual applied up to `now`. Read-only: the
    /// stored snapshot is untouched, so repeated calls agree.
    ///
    /// # Errors
    ///
    /// Accrual overflow.
    pub fn current_total_value(&self, now: Timestamp) -> Result<Amount, VaultError> {
        self.current_value(now)
    }

    /// Whether the pause flag is set.
    pub fn is_paused(&self) -> bool {
        self.collaborators.pause.is_paused()
    }

    /// A holder's shares locked under an active commitment.
    pub fn committed_shares_of(&self, holder: &str, now: Timestamp) -> Amount {
        self.commitments.active_shares(holder, now)
    }

    /// A holder's shares reserved by approved withdrawals.
    pub fn reserved_shares_of(&self, holder: &str) -> Amount {
        self.reservations.reserved(holder)
    }

    /// A holder's refund awaiting a claim.
    pub fn pending_refund_of(&self, holder: &str) -> Amount {
        self.refunds.pending(holder)
    }

    /// A holder's shares free of active commitments and reservations.
    pub fn spendable_shares_of(&self, holder: &str, now: Timestamp) -> Amount {
        let balance = self.shares.balance_of(holder);
        let committed = self.commitments.active_shares(holder, now);
        let reserved = self.reservations.reserved(holder);
        balance.saturating_sub(committed).saturating_sub(reserved)
    }

    /// Looks up an investment request.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] via [`VaultError::Ledger`].
    pub fn investment_request(&self, id: &str) -> Result<&InvestmentRequest, VaultError> {
        Ok(self.investments.get(id)?)
    }

    /// Looks up a withdrawal request.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] via [`VaultError::Ledger`].
    pub fn withdrawal_request(&self, id: &str) -> Result<&WithdrawalRequest, VaultError> {
        Ok(self.withdrawals.get(id)?)
    }

    /// The full event log, oldest first.
    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    /// Events recorded over the vault's lifetime.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// The events at and after `index`; empty when `index` is past the end.
    pub fn events_since(&self, index: usize) -> &[VaultEvent] {
        &self.events[index.min(self.events.len())..]
    }

    /// Aggregate snapshot at `now`.
    ///
    /// # Errors
    ///
    /// Accrual overflow.
    pub fn vault_view(&self, now: Timestamp) -> Result<VaultView, VaultError> {
        Ok(VaultView {
            custodian: self.custodian.clone(),
            total_shares: self.shares.total(),
            stored_total_value: self.total_value,
            current_total_value: self.current_value(now)?,
            value_updated_at: self.value_updated_at,
            params: self.params.clone(),
            paused: self.is_paused(),
            investment_requests: self.investments.len(),
            withdrawal_requests: self.withdrawals.len(),
            event_count: self.events.len(),
        })
    }

    /// One holder's position at `now`.
    ///
    /// # Errors
    ///
    /// Accrual or conversion overflow.
    pub fn holder_view(&self, holder: &str, now: Timestamp) -> Result<HolderView, VaultError> {
        let shares = self.shares.balance_of(holder);
        let committed_shares = self.commitments.active_shares(holder, now);
        let committed_until = match self.commitments.get(holder) {
            Some(commitment) if committed_shares > 0 => commitment.until,
            _ => 0,
        };
        Ok(HolderView {
            identity: holder.to_string(),
            shares,
            committed_shares,
            committed_until,
            reserved_shares: self.reservations.reserved(holder),
            spendable_shares: self.spendable_shares_of(holder, now),
            pending_refund: self.refunds.pending(holder),
            asset_value: self.convert_to_assets(shares, now)?,
        })
    }

    // -- staging internals ---------------------------------------------------

    fn stage_investment_claim(
        &self,
        id: &str,
        receiver: &str,
        now: Timestamp,
    ) -> Result<StagedInvestmentClaim, VaultError> {
        let request = self.investments.get(id)?;
        if request.claimed {
            return Err(LedgerError::AlreadyClaimed { id: id.to_string() }.into());
        }
        if request.rejected {
            return Err(LedgerError::AlreadyRejected { id: id.to_string() }.into());
        }
        self.ensure_member(receiver)?;
        let current = self.current_value(now)?;
        let minted = self.deposit_shares(request.amount, current)?;
        let updated = current
            .checked_add(request.amount)
            .ok_or(AccrualError::Overflow { context: "admitted total" })?;
        self.ensure_growth_allowed(current, updated)?;
        Ok(StagedInvestmentClaim {
            investor: request.investor.clone(),
            amount: request.amount,
            committed_until: request.committed_until,
            minted,
            updated_value: updated,
        })
    }

    fn commit_investment_claim(
        &mut self,
        id: &str,
        receiver: &str,
        staged: StagedInvestmentClaim,
        now: Timestamp,
    ) -> Result<(), VaultError> {
        self.shares.mint(receiver, staged.minted)?;
        if staged.committed_until > now {
            self.commitments.add(receiver, staged.minted, staged.committed_until)?;
        }
        self.investments.claim(id)?;
        self.total_value = staged.updated_value;
        self.value_updated_at = now;
        self.record(EventKind::InvestmentClaimed {
            id: id.to_string(),
            investor: staged.investor.clone(),
            amount: staged.amount,
            shares_minted: staged.minted,
            total_value: staged.updated_value,
        });
        info!(
            id,
            investor = %staged.investor,
            receiver,
            minted = %staged.minted,
            "investment claimed"
        );
        Ok(())
    }

    fn stage_withdrawal_claim(
        &self,
        id: &str,
        now: Timestamp,
    ) -> Result<StagedWithdrawalClaim, VaultError> {
        let request = self.withdrawals.get(id)?;
        if request.claimed {
            return Err(LedgerError::AlreadyClaimed { id: id.to_string() }.into());
        }
        if request.rejected {
            return Err(LedgerError::AlreadyRejected { id: id.to_string() }.into());
        }
        let investor = request.investor.clone();
        let shares = request.shares;
        self.ensure_member(&investor)?;
        let current = self.current_value(now)?;
        let payout =
            conversion::assets_from_shares(shares, self.shares.total(), current, Rounding::Floor)?;
        if payout == 0 {
            return Err(VaultError::ZeroPayout { shares });
        }
        let balance = self.shares.balance_of(&investor);
        if balance < shares {
            return Err(HoldingsError::InsufficientShares {
                holder: investor,
                balance,
                required: shares,
            }
            .into());
        }
        self.commitments.ensure_can_reduce(&investor, balance, shares, now)?;
        Ok(StagedWithdrawalClaim {
            investor,
            shares,
            payout,
            updated_value: current.saturating_sub(payout),
        })
    }

    fn commit_withdrawal_claim(
        &mut self,
        id: &str,
        staged: StagedWithdrawalClaim,
        now: Timestamp,
    ) -> Result<(), VaultError> {
        // Pay first: a refused transfer leaves every book untouched.
        self.collaborators
            .assets
            .transfer(&self.custodian, &staged.investor, staged.payout)?;
        self.reservations.release(&staged.investor, staged.shares)?;
        self.shares.burn(&staged.investor, staged.shares)?;
        self.withdrawals.claim(id)?;
        self.total_value = staged.updated_value;
        self.value_updated_at = now;
        self.record(EventKind::WithdrawalClaimed {
            id: id.to_string(),
            investor: staged.investor.clone(),
            amount: staged.payout,
            shares_burned: staged.shares,
            total_value: staged.updated_value,
        });
        info!(
            id,
            investor = %staged.investor,
            payout = %staged.payout,
            burned = %staged.shares,
            "withdrawal claimed"
        );
        Ok(())
    }

    // -- admission helpers ---------------------------------------------------

    fn ensure_identity(identity: &str) -> Result<(), VaultError> {
        if identity.is_empty() {
            return Err(VaultError::EmptyIdentity);
        }
        Ok(())
    }

    fn ensure_params(params: &VaultParams) -> Result<(), VaultError> {
        if params.min_investment > params.max_investment {
            return Err(VaultError::InvalidBounds {
                min: params.min_investment,
                max: params.max_investment,
            });
        }
        if params.min_withdrawal > params.max_withdrawal {
            return Err(VaultError::InvalidBounds {
                min: params.min_withdrawal,
                max: params.max_withdrawal,
            });
        }
        Ok(())
    }

    fn ensure_within(amount: Amount, min: Amount, max: Amount) -> Result<(), VaultError> {
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }
        if amount < min || amount > max {
            return Err(VaultError::OutOfBounds { amount, min, max });
        }
        Ok(())
    }

    fn ensure_not_paused(&self) -> Result<(), VaultError> {
        if self.is_paused() {
            return Err(VaultError::Paused);
        }
        Ok(())
    }

    fn ensure_paused(&self) -> Result<(), VaultError> {
        if !self.is_paused() {
            return Err(VaultError::NotPaused);
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), VaultError> {
        if !self.params.is_open {
            return Err(VaultError::Closed);
        }
        Ok(())
    }

    fn ensure_member(&self, identity: &str) -> Result<(), VaultError> {
        if !self.collaborators.allowlist.is_member(identity) {
            return Err(VaultError::NotAllowlisted { identity: identity.to_string() });
        }
        Ok(())
    }

    fn ensure_role(&self, caller: &str, role: Role) -> Result<(), VaultError> {
        if !self.collaborators.roles.has_role(caller, role) {
            return Err(VaultError::MissingRole { identity: caller.to_string(), role });
        }
        Ok(())
    }

    fn ensure_growth_allowed(&self, current: Amount, proposed: Amount) -> Result<(), VaultError> {
        if self.params.growth_guard_factor == 0 || current == 0 {
            return Ok(());
        }
        let max_allowed = accrual::max_allowed_tvl(current, self.params.growth_guard_factor);
        if proposed > max_allowed {
            return Err(VaultError::GrowthLimitExceeded {
                current,
                requested: proposed,
                max_allowed,
            });
        }
        Ok(())
    }

    fn current_value(&self, now: Timestamp) -> Result<Amount, VaultError> {
        Ok(accrual::accrue(
            self.total_value,
            self.value_updated_at,
            self.params.daily_yield_rate,
            now,
        )?)
    }

    fn offset(&self) -> u32 {
        conversion::decimal_offset(self.share_decimals, self.asset_decimals)
    }

    /// Floor shares for a deposit, falling back to the decimal-offset
    /// scaling while either total is zero.
    fn deposit_shares(&self, amount: Amount, current: Amount) -> Result<Amount, VaultError> {
        let total_shares = self.shares.total();
        if total_shares == 0 || current == 0 {
            return Ok(conversion::scale_by_offset(amount, self.offset())?);
        }
        Ok(conversion::shares_from_assets(amount, total_shares, current, Rounding::Floor)?)
    }

    fn resolve_initiator(&self, caller: &str) -> Initiator {
        if self.collaborators.roles.has_role(caller, Role::Approver) {
            Initiator::Admin
        } else {
            Initiator::Holder(caller.to_string())
        }
    }

    fn ensure_may_claim(&self, initiator: &Initiator, owner: &str) -> Result<(), VaultError> {
        match initiator {
            Initiator::Admin => Ok(()),
            Initiator::Holder(caller) if caller == owner => Ok(()),
            Initiator::Holder(caller)
                if self.collaborators.operators.is_operator(owner, caller) =>
            {
                Ok(())
            }
            Initiator::Holder(caller) => Err(VaultError::NotOwnerOrOperator {
                caller: caller.clone(),
                owner: owner.to_string(),
            }),
        }
    }

    fn record(&mut self, kind: EventKind) {
        self.events.push(VaultEvent::new(kind));
    }
}
