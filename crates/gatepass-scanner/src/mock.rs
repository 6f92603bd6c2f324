//! Test doubles for the decoding boundary.
//!
//! Compiled for this crate's tests and, behind the `test-util` feature, for
//! downstream test suites. Device mocks live in `gatepass_hardware::mock`.

use gatepass_core::SymbolFormat;
use gatepass_hardware::types::Frame;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::decoder::{DecodeHints, EngineError, Symbol, SymbolEngine};

/// Symbol engine that replays queued outcomes.
///
/// Returns `NotFound` once the queue is empty.
#[derive(Debug, Default)]
pub struct ScriptedSymbolEngine {
    script: Mutex<VecDeque<std::result::Result<Symbol, EngineError>>>,
    last_hints: Mutex<Option<DecodeHints>>,
    calls: AtomicUsize,
}

impl ScriptedSymbolEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_symbol(&self, text: impl Into<String>, format: SymbolFormat) {
        self.push(Ok(Symbol::new(text, format)));
    }

    pub fn push_error(&self, error: EngineError) {
        self.push(Err(error));
    }

    fn push(&self, outcome: std::result::Result<Symbol, EngineError>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
    }

    /// Number of decode calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_hints(&self) -> Option<DecodeHints> {
        self.last_hints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SymbolEngine for ScriptedSymbolEngine {
    fn decode(&self, _frame: &Frame, hints: &DecodeHints) -> std::result::Result<Symbol, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_hints
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(hints.clone());

        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Err(EngineError::NotFound))
    }
}
