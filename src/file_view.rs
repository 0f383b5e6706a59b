//! Bounded file view: seekable input plus one reusable scan buffer.
//!
//! # Scope
//! This module owns the only file handle in the engine and every byte that
//! moves between the file and the rest of the system goes through its single
//! scan buffer. Nothing here materializes the input: searches, line/char
//! boundary queries, and range emission all work in bounded chunks.
//!
//! # Invariants
//! - The scan buffer is allocated once at open and never grows.
//! - All returned positions lie in `[0, size]`.
//! - Char stepping is permissive: malformed UTF-8 never fails, it only
//!   affects how far one step moves.
//!
//! # Search semantics
//! - Forward: one bounded read of up to [`FWD_WIN`] bytes at the window
//!   start; the leftmost occurrence wins.
//! - Backward: fixed [`BK_BLK`]-sized blocks from the window end down,
//!   overlapping by `clamp(needle_len - 1, OVERLAP_MIN, OVERLAP_MAX)` so a
//!   match straddling a block seam is not missed; the rightmost occurrence
//!   across all blocks wins, and every block is visited.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use memchr::{memchr, memmem, memrchr};

use crate::error::EngineError;

/// Forward search window: one bounded read per forward search.
pub const FWD_WIN: usize = 1 << 20;
/// Block size for backward block scans.
pub const BK_BLK: usize = 64 * 1024;
/// Minimum block overlap for backward search.
pub const OVERLAP_MIN: usize = 16;
/// Maximum block overlap for backward search.
pub const OVERLAP_MAX: usize = 4096;

/// Search direction within a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dir {
    Fwd,
    Bwd,
}

const fn scan_buf_cap() -> usize {
    if FWD_WIN > BK_BLK + OVERLAP_MAX {
        FWD_WIN
    } else {
        BK_BLK + OVERLAP_MAX
    }
}

fn is_cont_byte(b: u8) -> bool {
    (b & 0xC0) == 0x80
}

/// Sequence width from a UTF-8 lead byte; 0 for an invalid lead.
fn utf8_len_from_lead(b: u8) -> usize {
    if b & 0x80 == 0x00 {
        1
    } else if b & 0xE0 == 0xC0 {
        2
    } else if b & 0xF0 == 0xE0 {
        3
    } else if b & 0xF8 == 0xF0 {
        4
    } else {
        0
    }
}

/// Seekable input with a cached size and one reusable scan buffer.
pub struct FileView {
    file: File,
    size: i64,
    buf: Box<[u8]>,
}

impl FileView {
    /// Open a file on disk.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::from_file(File::open(path)?)
    }

    /// Wrap an already-open file. The size is computed once here; the file
    /// is assumed not to change length while the view is alive.
    pub fn from_file(mut file: File) -> io::Result<Self> {
        let size = file.seek(SeekFrom::End(0))?;
        file.rewind()?;
        let size = i64::try_from(size)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "file too large"))?;
        Ok(FileView {
            file,
            size,
            buf: vec![0u8; scan_buf_cap()].into_boxed_slice(),
        })
    }

    /// Spool stdin to an unnamed temp file so the input is seekable.
    pub fn from_stdin() -> io::Result<Self> {
        let mut spool = tempfile::tempfile()?;
        io::copy(&mut io::stdin().lock(), &mut spool)?;
        spool.rewind()?;
        Self::from_file(spool)
    }

    /// Total input size in bytes, computed once at open.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Read exactly `[pos, pos + len)` into the scan buffer.
    ///
    /// Callers must have clamped the range into `[0, size]` and `len` must
    /// fit the buffer.
    fn read_into(&mut self, pos: i64, len: usize) -> io::Result<&[u8]> {
        debug_assert!(pos >= 0 && pos + len as i64 <= self.size);
        debug_assert!(len <= self.buf.len());
        self.file.seek(SeekFrom::Start(pos as u64))?;
        self.file.read_exact(&mut self.buf[..len])?;
        Ok(&self.buf[..len])
    }

    /// Copy `[start, end)` from the file to `out` in buffer-sized chunks.
    ///
    /// `start >= end` and out-of-range requests are silent no-ops; callers
    /// are expected to have already clamped.
    pub fn emit(&mut self, start: i64, end: i64, out: &mut dyn Write) -> Result<(), EngineError> {
        let start = start.clamp(0, self.size);
        let end = end.clamp(0, self.size);
        if start >= end {
            return Ok(());
        }

        let mut pos = start;
        while pos < end {
            let len = ((end - pos) as usize).min(self.buf.len());
            self.read_into(pos, len)?;
            out.write_all(&self.buf[..len]).map_err(EngineError::Io)?;
            pos += len as i64;
        }
        Ok(())
    }

    /// Position just after the nearest `\n` strictly before `pos`, or 0.
    ///
    /// Line content including its terminator is `[line_start, line_end)`.
    pub fn line_start(&mut self, pos: i64) -> Result<i64, EngineError> {
        if pos <= 0 {
            return Ok(0);
        }
        let mut hi = pos.min(self.size);
        while hi > 0 {
            let lo = (hi - BK_BLK as i64).max(0);
            let chunk = self.read_into(lo, (hi - lo) as usize)?;
            if let Some(i) = memrchr(b'\n', chunk) {
                return Ok(lo + i as i64 + 1);
            }
            hi = lo;
        }
        Ok(0)
    }

    /// Position just after the next `\n` at or after `pos`, or `size`.
    pub fn line_end(&mut self, pos: i64) -> Result<i64, EngineError> {
        if pos < 0 {
            return Ok(0);
        }
        if pos >= self.size {
            return Ok(self.size);
        }
        let mut lo = pos;
        while lo < self.size {
            let hi = (lo + BK_BLK as i64).min(self.size);
            let chunk = self.read_into(lo, (hi - lo) as usize)?;
            if let Some(i) = memchr(b'\n', chunk) {
                return Ok(lo + i as i64 + 1);
            }
            lo = hi;
        }
        Ok(self.size)
    }

    /// Walk `delta` line boundaries from `start`, clamping at BOF/EOF.
    ///
    /// `start` is typically a line start but any position in `[0, size]` is
    /// accepted; forward steps land on successive line starts.
    pub fn step_lines(&mut self, start: i64, delta: i64) -> Result<i64, EngineError> {
        if start < 0 || start > self.size {
            return Err(EngineError::LocResolve("line step origin out of bounds"));
        }
        let mut current = start;
        if delta > 0 {
            for _ in 0..delta {
                let line_end = self.line_end(current)?;
                if line_end >= self.size {
                    return Ok(self.size);
                }
                current = line_end;
            }
        } else {
            for _ in 0..-delta {
                if current == 0 {
                    return Ok(0);
                }
                current = self.line_start(current - 1)?;
            }
        }
        Ok(current)
    }

    /// Snap `pos` to the start of the UTF-8 code point containing it.
    ///
    /// Permissive: a malformed byte counts as its own char, and a run of
    /// continuation bytes longer than a sequence snaps to the nearest lead.
    pub fn char_start(&mut self, pos: i64) -> Result<i64, EngineError> {
        if pos <= 0 {
            return Ok(0);
        }
        if pos >= self.size {
            return Ok(self.size);
        }

        // A lead byte is at most 3 bytes back from any in-sequence position.
        let lo = (pos - 3).max(0);
        let chunk = self.read_into(lo, (pos - lo + 1) as usize)?;
        for k in 0..chunk.len() {
            let b = chunk[chunk.len() - 1 - k];
            if !is_cont_byte(b) {
                return Ok(pos - k as i64);
            }
        }
        Ok(lo)
    }

    /// Step `delta` code points from `start` (itself a char boundary),
    /// clamping at file bounds. Never fails on malformed content.
    pub fn step_chars(&mut self, start: i64, delta: i64) -> Result<i64, EngineError> {
        let mut cur = start.clamp(0, self.size);

        if delta >= 0 {
            for _ in 0..delta {
                if cur >= self.size {
                    return Ok(self.size);
                }
                let hi = (cur + 4).min(self.size);
                let chunk = self.read_into(cur, (hi - cur) as usize)?;
                if chunk.is_empty() {
                    return Ok(cur);
                }
                let len = utf8_len_from_lead(chunk[0]);
                if len == 0 {
                    cur += 1;
                } else if len <= chunk.len() && chunk[1..len].iter().all(|&b| is_cont_byte(b)) {
                    cur += len as i64;
                } else {
                    // Truncated or malformed sequence: step one byte.
                    cur += 1;
                }
            }
        } else {
            for _ in 0..-delta {
                if cur <= 0 {
                    return Ok(0);
                }
                cur = self.char_start(cur - 1)?;
            }
        }
        Ok(cur)
    }

    /// Find `needle` inside `[win_lo, win_hi)`.
    ///
    /// Forward returns the leftmost match, backward the rightmost. Returns
    /// the absolute `[start, end)` of the match.
    pub fn find_window(
        &mut self,
        win_lo: i64,
        win_hi: i64,
        needle: &[u8],
        dir: Dir,
    ) -> Result<(i64, i64), EngineError> {
        if needle.is_empty() {
            return Err(EngineError::BadNeedle);
        }
        let win_lo = win_lo.clamp(0, self.size);
        let win_hi = win_hi.clamp(0, self.size);
        if win_lo >= win_hi {
            return Err(EngineError::NoMatch);
        }

        match dir {
            Dir::Fwd => {
                let len = ((win_hi - win_lo) as usize).min(FWD_WIN);
                let chunk = self.read_into(win_lo, len)?;
                match memmem::find(chunk, needle) {
                    Some(i) => {
                        let ms = win_lo + i as i64;
                        Ok((ms, ms + needle.len() as i64))
                    }
                    None => Err(EngineError::NoMatch),
                }
            }
            Dir::Bwd => self.find_backward(win_lo, win_hi, needle),
        }
    }

    fn find_backward(
        &mut self,
        win_lo: i64,
        win_hi: i64,
        needle: &[u8],
    ) -> Result<(i64, i64), EngineError> {
        let nlen = needle.len();
        let overlap = (nlen - 1).clamp(OVERLAP_MIN, OVERLAP_MAX);
        let step = (BK_BLK - overlap) as i64;
        let finder = memmem::Finder::new(needle);

        // Rightmost match over the whole window. Blocks nearer win_hi are
        // visited first, and the scan walks every block down to win_lo.
        let mut best: Option<(i64, i64)> = None;
        let mut pos = win_hi;
        while pos > win_lo {
            let block_hi = pos;
            let block_lo = (block_hi - BK_BLK as i64).max(win_lo);
            let block = self.read_into(block_lo, (block_hi - block_lo) as usize)?;

            for i in finder.find_iter(block) {
                let ms = block_lo + i as i64;
                let me = ms + nlen as i64;
                if ms < win_lo || me > win_hi {
                    continue;
                }
                if best.map_or(true, |(b, _)| ms > b) {
                    best = Some((ms, me));
                }
            }
            pos -= step;
        }

        best.ok_or(EngineError::NoMatch)
    }
}
