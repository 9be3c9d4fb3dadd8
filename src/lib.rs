//! Form state and validation engine
//!
//! This crate provides the recurring logic behind data-entry forms,
//! abstracted away from any UI binding:
//! - Structural field addressing for scalar, nested, and repeatable fields
//! - A declarative validation schema and an imperative rule interpreter
//!   compiled from it, guaranteed to agree on outcome
//! - Form state mutated only through defined transitions
//! - A list controller with stable row identity and error reindexing
//! - Submission orchestration against an asynchronous external collaborator
//!
//! A UI layer binds `values` / `errors` / `is_submitting` as read state and
//! `set_field` / `append` / `remove` / `submit` as the only mutators; the
//! validation strategy behind the session is interchangeable.

pub mod document;
pub mod error;
pub mod list;
pub mod path;
pub mod rules;
pub mod schema;
pub mod session;
pub mod state;
pub mod submit;

pub use document::{Address, EMAIL_PATTERN, Gender, Hobby, Registration};
pub use error::{EngineError, ErrorCategory, ErrorMap, FieldError};
pub use list::ListFieldController;
pub use path::{FieldPath, PathSegment};
pub use rules::{Rule, RuleSet};
pub use schema::{Constraint, FieldSchema, Schema, Validator};
pub use session::FormSession;
pub use state::FormState;
pub use submit::{
	EchoService, SubmissionController, SubmitError, SubmitOutcome, SubmitService,
};
