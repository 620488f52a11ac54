//! Grammar execution engine
//!
//! ```text
//! Program / Cx ──Instruction──▶ Evaluator ──Outcome──▶ Program / Cx
//!                                  │
//!            ┌─────────────────────┼──────────────────────┐
//!            ▼                     ▼                      ▼
//!         frames               states                  tree
//!   (start/end/throw)   (branch/accept/reject)   (fork/merge/append)
//!                                                         │
//!                                                         ▼
//!                                                      emitter ──▶ Emitted
//! ```
//!
//! Match failure is not an error: it rejects a branch. [`EngineError`] is
//! reserved for programs that break the instruction contract.

mod emit;
mod errors;
mod evaluate;
mod facade;
mod frame;
mod instruction;
mod spans;
mod stack;
mod state;

pub use errors::{EngineError, ErrorContext, ErrorKind};
pub use evaluate::{Evaluator, Program, Script};
pub use facade::{FrameHandle, FrameView, StateHandle, StateView};
pub use frame::{FrameKind, FrameOutcome};
pub use instruction::{
    Effects, Emitted, Failure, FrameOptions, Instruction, MatchTarget, NodeMatcher, Options,
    Outcome, PropertyMatcher, Success, WriteEffect,
};
pub use spans::SpanKind;
pub use stack::Stack;
pub use state::Status;
