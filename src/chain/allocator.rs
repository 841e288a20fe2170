//! Slot Allocation
//!
//! Hands out chain slots to concurrent games exactly once each.
//!
//! The allocator owns the chain in *reveal order*: construction reverses
//! the generation-order sequence so that `reveal[k] = h[n-1-k]`. Slots are
//! issued from reveal index 0 upward, meaning the last generated digest is
//! played first. Every later reveal therefore hashes forward into an
//! earlier one, which is what makes past outcomes tamper-evident.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::error;

use super::ChainError;
use crate::core::hash::ChainHash;

/// A contiguous run of reveal slots owned by one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotClaim {
    /// First reveal index in the claim.
    pub start: usize,
    /// Chain elements at `[start, start + len)`.
    pub elements: Vec<ChainHash>,
}

impl SlotClaim {
    /// One past the last claimed index.
    pub fn end(&self) -> usize {
        self.start + self.elements.len()
    }
}

/// Owns the reveal-ordered chain and the cursor over it.
///
/// The chain is immutable after construction and shared freely; the
/// cursor is the only mutable state and only [`ChainAllocator::claim`]
/// advances it.
pub struct ChainAllocator {
    chain: Arc<[ChainHash]>,
    cursor: AtomicUsize,
}

impl std::fmt::Debug for ChainAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainAllocator")
            .field("length", &self.chain.len())
            .field("cursor", &self.cursor())
            .finish()
    }
}

impl ChainAllocator {
    /// Take ownership of a generation-order chain and reverse it for reveal.
    pub fn new(mut generated: Vec<ChainHash>) -> Self {
        generated.reverse();
        Self::from_reveal_order(generated)
    }

    /// Build from a chain that is already in reveal order.
    pub fn from_reveal_order(revealed: Vec<ChainHash>) -> Self {
        Self {
            chain: revealed.into(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Claim `count` consecutive slots.
    ///
    /// Bounds check and advance form one atomic step: concurrent claims
    /// never overlap and are never split. On exhaustion the cursor is
    /// left where it was.
    pub fn claim(&self, count: usize) -> Result<SlotClaim, ChainError> {
        let length = self.chain.len();

        let start = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cursor| {
                cursor.checked_add(count).filter(|end| *end <= length)
            })
            .map_err(|cursor| {
                error!(cursor, length, requested = count, "Commitment chain exhausted");
                ChainError::Exhausted { requested: count, cursor, length }
            })?;

        Ok(SlotClaim {
            start,
            elements: self.chain[start..start + count].to_vec(),
        })
    }

    /// Next unused reveal index.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Slots not yet issued.
    pub fn remaining(&self) -> usize {
        self.chain.len() - self.cursor()
    }

    /// Total chain length.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// True if the chain has no elements.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Element at a reveal index, issued or not.
    pub fn element(&self, index: usize) -> Option<&ChainHash> {
        self.chain.get(index)
    }

    /// Shared handle to the full reveal-ordered chain.
    ///
    /// Read-only; reading it never consumes slots.
    pub fn chain(&self) -> Arc<[ChainHash]> {
        Arc::clone(&self.chain)
    }
}
