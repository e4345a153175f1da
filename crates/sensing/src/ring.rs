//! Fixed-capacity CSI sample store with block eviction.
//!
//! Storage is a single boxed slice allocated at construction; `append`
//! never allocates. When an incoming batch would overflow, the oldest
//! `evict_block` values are dropped in one shift and whatever still does
//! not fit is truncated.
//!
//! A batch larger than `evict_block` plus the free headroom loses its tail.
//! Steady-state batches are smaller than the eviction block, so this only
//! bounds data loss for oversized deliveries.

use std::fmt;

use contracts::ContractError;

/// Scalar CSI history in arrival order
pub struct SampleRing {
    buf: Box<[i16]>,
    len: usize,
    evict_block: usize,
    evictions: u64,
    truncated: u64,
}

impl fmt::Debug for SampleRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleRing")
            .field("len", &self.len)
            .field("capacity", &self.buf.len())
            .field("evict_block", &self.evict_block)
            .field("evictions", &self.evictions)
            .field("truncated", &self.truncated)
            .finish()
    }
}

impl SampleRing {
    /// Create a ring holding `capacity` values.
    ///
    /// # Errors
    /// `evict_block` must be in `1..capacity`.
    pub fn new(capacity: usize, evict_block: usize) -> Result<Self, ContractError> {
        if capacity == 0 {
            return Err(ContractError::config_validation(
                "ring.capacity",
                "capacity must be > 0",
            ));
        }
        if evict_block == 0 || evict_block >= capacity {
            return Err(ContractError::config_validation(
                "ring.evict_block",
                format!("evict_block ({evict_block}) must be in 1..{capacity}"),
            ));
        }

        Ok(Self {
            buf: vec![0i16; capacity].into_boxed_slice(),
            len: 0,
            evict_block,
            evictions: 0,
            truncated: 0,
        })
    }

    /// Append raw 8-bit CSI values, widening to i16.
    #[inline]
    pub fn append(&mut self, values: &[i8]) {
        self.make_room(values.len());

        let free = self.buf.len() - self.len;
        let take = values.len().min(free);
        for (slot, &v) in self.buf[self.len..self.len + take].iter_mut().zip(values) {
            *slot = i16::from(v);
        }
        self.len += take;
        self.truncated += (values.len() - take) as u64;
    }

    /// Append 16-bit CSI values.
    #[inline]
    pub fn append_i16(&mut self, values: &[i16]) {
        self.make_room(values.len());

        let free = self.buf.len() - self.len;
        let take = values.len().min(free);
        self.buf[self.len..self.len + take].copy_from_slice(&values[..take]);
        self.len += take;
        self.truncated += (values.len() - take) as u64;
    }

    /// Drop the oldest block if `incoming` values would overflow.
    #[inline]
    fn make_room(&mut self, incoming: usize) {
        if self.len + incoming <= self.buf.len() {
            return;
        }

        let drop = self.evict_block.min(self.len);
        self.buf.copy_within(drop..self.len, 0);
        self.len -= drop;
        self.evictions += 1;
    }

    /// Current contents, oldest first
    #[inline]
    pub fn snapshot(&self) -> &[i16] {
        &self.buf[..self.len]
    }

    /// Copy current contents into a caller-owned buffer.
    ///
    /// Reuses `out`'s allocation; no allocation happens once `out` has
    /// reached `capacity()`.
    #[inline]
    pub fn copy_into(&self, out: &mut Vec<i16>) {
        out.clear();
        out.extend_from_slice(self.snapshot());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn evict_block(&self) -> usize {
        self.evict_block
    }

    /// Number of block evictions so far
    #[inline]
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Number of values discarded because they did not fit
    #[inline]
    pub fn truncated(&self) -> u64 {
        self.truncated
    }
}
