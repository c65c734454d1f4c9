//! # Analytics Intake
//!
//! A guided, conversational intake for analytics requests.
//!
//! ## Features
//!
//! - **Scripted personas**: a coordinator, an intake agent and one specialist per
//!   request type walk the requester through a fixed set of questions
//! - **Structured validation**: every problem with the requester's details is
//!   reported in one pass
//! - **Summarized records**: each finished request is recapped by Gemini and
//!   written to a timestamped JSON file

pub mod agent;
pub mod clock;
pub mod config;
pub mod conversation;
pub mod request;
pub mod samples;
pub mod session;
pub mod storage;
pub mod summary;
pub mod ui;
pub mod validation;

pub use config::Config;
pub use request::{AnalyticsRequest, BasicInfo, RequestType};
pub use storage::{PersistOutcome, RequestStore};
pub use validation::{validate_basic_info, ValidationResult, Validator};
