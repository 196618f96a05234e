//! Agent Loop (Observe-Think-Act) execution mode.
//!
//! `browser-use` style iterative agent execution where the LLM is consulted
//! at each step to decide the next action based on current browser state,
//! rather than generating a complete plan upfront.
//!
//! # Architecture
//!
//! ```text
//! while !done && steps < max:
//!     state = collect_state()  // fresh DOM/AX projection from CDP
//!     decision = call_llm()    // model decides based on state + history
//!     result = multi_act()     // execute the decided actions
//!     if result.is_done: break
//! ```
//!
//! # Key Components
//!
//! - [`AgentLoopConfig`]: tunables for step budgets, history, vision, timeouts
//! - [`MessageManager`]: renders the rolling prompt each step
//! - [`AgentOrchestrator`]: runs the step loop end to end

pub mod config;
pub mod message_manager;
pub mod orchestrator;
pub mod rerun;
pub mod state_collector;
pub mod types;
pub mod url_shortener;
pub mod variable_detection;

pub use config::AgentLoopConfig;
pub use message_manager::{redact_for_storage, MessageManager, StepInfo};
pub use orchestrator::{AgentOrchestrator, RunOutcome};
pub use rerun::{RecordedStep, RerunManager, RerunOutcome};
pub use state_collector::collect_state;
pub use types::{
    AgentAction, AgentHistoryEntry, BrowserStateSummary, IndexedBrowserState, StepDecision,
    StepExecutionResult, StepMetadata, TabInfo,
};
pub use url_shortener::UrlShortener;
pub use variable_detection::{detect_variables, DetectedVariable, VariableKind};
