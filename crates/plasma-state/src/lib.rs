//! # plasma-state — Exit Reconciliation
//!
//! The behaviorally critical part of the child chain: deciding, exactly
//! once per output, whether funds recorded on the child chain may be
//! released on the root chain.
//!
//! - **Exit** (`exit.rs`): the `Unclaimed → Withdrawn` state machine,
//!   its `DashMap`-backed [`ExitStore`], and the [`ExitReconciler`] that
//!   checks a spend proof against a later exit proof.
//! - **Root chain** (`root_chain.rs`): the [`RootChain`] port the
//!   settlement contract exposes, its events, and [`InMemoryRootChain`],
//!   which enforces dense header numbering and parent linkage.
//!
//! There is no challenge window. A valid request is paid out immediately.

pub mod exit;
pub mod root_chain;

pub use exit::{
    proof_hex, ExitReconciler, ExitRecord, ExitState, ExitStore, HeaderSource,
    WithdrawalAuthorization, WithdrawalRequest,
};
pub use root_chain::{
    DepositEvent, DepositReceipt, HeaderSubmittedEvent, InMemoryRootChain, RootChain,
    RootChainEvent, WithdrawEvent,
};
