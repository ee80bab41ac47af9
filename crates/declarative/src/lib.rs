//! # Declarative
//!
//! A schema-driven reconciliation engine for remote resources.
//!
//! Callers describe the desired state of a remote object as a typed
//! [`Document`]. The engine diffs it against last-known state, drives the
//! type's controller through create/read/update/delete and records the
//! result as new state.
//!
//! ## Core Concepts
//!
//! - **Schema**: the typed attributes of a resource or data source type
//! - **Value**: tri-state (known / null / unknown) attribute value
//! - **ChangeSet**: per-attribute changes computed by [`diff::plan`]
//! - **Lifecycle**: the `Absent → Planned → Created → Synced → Updated → Deleted`
//!   state machine driving a [`ResourceController`]
//! - **Registry**: type name → schema + controller, sealed by
//!   [`RegistryBuilder::finalize`]
//! - **Executor**: reconciles many independent instances on a worker pool
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{
//!     Attribute, AttributeType, Document, RegistryBuilder, ResourceInstance, Schema,
//! };
//!
//! let schema = Schema::new()
//!     .with_attribute("id", Attribute::computed(AttributeType::int64()))
//!     .with_attribute("quantity", Attribute::required(AttributeType::int64()));
//!
//! let mut builder = RegistryBuilder::new();
//! builder.register_resource_type("order", schema, OrderController::new(client))?;
//! let registry = builder.finalize();
//!
//! let mut instance = ResourceInstance::new();
//! let result = registry.reconcile("order", &mut instance, &Document::new().with("quantity", 2));
//! for diagnostic in &result.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! ```
//!
//! ## Provider Traits
//!
//! - [`ResourceController`]: remote CRUD for a managed resource type
//! - [`DataSourceController`]: remote read for a data source type
//! - [`ProgressCallback`]: receives progress updates
//! - [`ConfirmCallback`]: handles user confirmations

pub mod codec;
pub mod context;
pub mod diagnostics;
pub mod diff;
pub mod document;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod planner;
pub mod registry;
pub mod schema;
pub mod types;
pub mod value;

// Re-export main types at crate root
pub use codec::UNKNOWN_SENTINEL;
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use diff::{AttributeChange, ChangeAction, ChangeSet};
pub use document::{AttributePath, Document, PathStep, Validation};
pub use error::{Error, Operation, Result};
pub use executor::{PlanReport, Preview, PreviewAction, execute, preview};
pub use lifecycle::{
    ApplyOutcome, DataSourceController, Lifecycle, LifecycleState, PendingChange, PlanAction,
    RefreshOutcome, ResourceController, ResourceInstance,
};
pub use planner::{Address, ExecutionPlan, Intent, PlannedInstance};
pub use registry::{Reconciliation, Registry, RegistryBuilder, Request, Response};
pub use schema::{Attribute, AttributeType, PrimitiveKind, Schema};
pub use types::{ApplyResult, ExecuteOptions, ExecuteSummary};
pub use value::{Known, Value, ValueKind};
