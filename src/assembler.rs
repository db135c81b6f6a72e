//! Reassembly of out-of-order completions into an ordered transcript.
//!
//! Workers finish in whatever order the service allows, but the transcript must
//! read top to bottom in chunk order. The assembler buffers completions and
//! flushes a block to the writer only once every earlier index has resolved, so
//! the physical file is always in strict ascending index order no matter how
//! parallel the run was.

use std::collections::BTreeMap;
use std::io::Write;

use crate::chunk::ChunkResult;
use crate::error::{Error, Result};

/// A stateful transcript writer fed results in completion order.
///
/// Design:
/// - We stream output directly to a `Write` implementation so long runs never
///   hold the whole transcript in memory beyond the out-of-order window.
/// - Multi-chunk runs label each block `[Chunk i/N - <name>]`; single-chunk
///   runs emit the bare text.
/// - Failed chunks occupy their index (ordering still advances past them) but
///   produce no text block; their error lives in the metadata artifact.
pub struct TranscriptAssembler<W: Write> {
    w: W,

    /// Count of chunks in this run; indices must be `0..total`.
    total: usize,

    /// Completed results waiting for every earlier index to resolve.
    pending: BTreeMap<usize, ChunkResult>,

    /// The next index to be written.
    next_index: usize,

    /// Once closed, no further pushes are allowed.
    closed: bool,
}

impl<W: Write> TranscriptAssembler<W> {
    pub fn new(w: W, total: usize) -> Self {
        Self {
            w,
            total,
            pending: BTreeMap::new(),
            next_index: 0,
            closed: false,
        }
    }

    /// Accept one completed result, flushing any now-contiguous prefix.
    ///
    /// Each index may be pushed exactly once; a duplicate or out-of-range index
    /// is a bug in the dispatcher and surfaces as an error here.
    pub fn push(&mut self, result: ChunkResult) -> Result<()> {
        if self.closed {
            return Err(Error::msg("cannot push result: assembler is already closed"));
        }
        if result.index >= self.total {
            return Err(Error::msg(format!(
                "chunk index {} out of range for a {}-chunk run",
                result.index, self.total
            )));
        }
        if result.index < self.next_index || self.pending.contains_key(&result.index) {
            return Err(Error::msg(format!(
                "duplicate result for chunk index {}",
                result.index
            )));
        }

        self.pending.insert(result.index, result);
        self.flush_ready()
    }

    /// Finalize the transcript and flush the underlying writer.
    ///
    /// Errors if any index never arrived, since that breaks the run's
    /// one-result-per-chunk identity guarantee. Idempotent once successful.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if self.next_index != self.total {
            return Err(Error::msg(format!(
                "transcript incomplete: {} of {} chunks resolved",
                self.next_index, self.total
            )));
        }
        self.w.flush()?;
        self.closed = true;
        Ok(())
    }

    fn flush_ready(&mut self) -> Result<()> {
        while let Some(result) = self.pending.remove(&self.next_index) {
            self.write_block(&result)?;
            self.next_index += 1;
        }
        Ok(())
    }

    fn write_block(&mut self, result: &ChunkResult) -> Result<()> {
        let Some(text) = result.text.as_deref() else {
            // Failed chunk: recorded in the metadata, absent from the transcript.
            return Ok(());
        };

        // Single-chunk runs get the bare text; every block ends with a blank
        // line either way.
        if self.total > 1 {
            writeln!(
                self.w,
                "[Chunk {}/{} - {}]",
                result.index + 1,
                self.total,
                result.label
            )?;
        }
        writeln!(self.w, "{}\n", text.trim())?;

        // Flush per block so the file on disk tracks run progress.
        self.w.flush()?;
        Ok(())
    }
}
