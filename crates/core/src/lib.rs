//! # DRT Core
//!
//! Core logic for the drug-resistance testing intake and review programme.
//!
//! This crate contains:
//! - The intake wizard: step navigation, forward gating, draft updates and submission
//! - Collection editors for the repeatable sub-collections of a patient draft
//! - Reviewer selection and assignment dispatch with partial-failure handling
//! - The review decision form
//! - The [`ApplicationStore`] boundary and an in-memory implementation
//!
//! **No transport concerns**: how the persistence collaborator is reached (HTTP, database) is
//! the business of an [`ApplicationStore`] implementation supplied by the embedding application.
//!
//! Configuration is resolved once into a [`CoreConfig`] and shared behind an `Arc`. Logging goes
//! through `tracing`; installing a subscriber is left to the embedding application.

pub mod collection;
pub mod config;
pub mod constants;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod review;
pub mod selection;
pub mod store;
pub mod wizard;

pub use collection::{commit_entry, remove_entry, CollectionEditor, CommitOutcome};
pub use config::{CoreConfig, DispatchPolicy};
pub use directory::ReviewerDirectory;
pub use dispatch::{AssignmentDispatcher, DispatchReport};
pub use error::{CoreError, CoreResult, SelectionError, StoreError, StoreResult};
pub use gate::{check_forward, interruptions_gate, GateRefusal, WizardStep};
pub use review::ReviewForm;
pub use selection::ReviewerSelection;
pub use store::{ApplicationStore, AssignmentReceipt, InMemoryStore, SubmitReceipt};
pub use wizard::{Advance, IntakeWizard, SubmissionTicket, WizardEntry, WizardPhase};
