//! Inputs sent to the server but not yet reflected in a snapshot

use lagsim_core::Input;
use std::collections::VecDeque;

/// Locally predicted inputs awaiting server acknowledgement
///
/// Inputs are kept in sequence order (oldest first), which is also the order
/// they were emitted in.
#[derive(Debug, Clone, Default)]
pub struct PendingInputs {
    inputs: VecDeque<Input>,
    last_acknowledged: Option<u64>,
}

impl PendingInputs {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a freshly emitted input
    pub fn push(&mut self, input: Input) {
        self.inputs.push_back(input);
    }

    /// Drop every input with sequence number `<= sequence_number`
    ///
    /// Returns how many inputs were dropped.
    pub fn acknowledge(&mut self, sequence_number: u64) -> usize {
        self.last_acknowledged = Some(sequence_number);
        let before = self.inputs.len();
        self.inputs.retain(|input| input.sequence_number > sequence_number);
        before - self.inputs.len()
    }

    /// Pending inputs in sequence order
    pub fn iter(&self) -> impl Iterator<Item = &Input> {
        self.inputs.iter()
    }

    /// Sequence number of the oldest pending input
    pub fn oldest(&self) -> Option<u64> {
        self.inputs.front().map(|i| i.sequence_number)
    }

    /// Sequence number of the newest pending input
    pub fn newest(&self) -> Option<u64> {
        self.inputs.back().map(|i| i.sequence_number)
    }

    /// Last acknowledgement seen
    pub fn last_acknowledged(&self) -> Option<u64> {
        self.last_acknowledged
    }

    /// Get the number of pending inputs
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}
