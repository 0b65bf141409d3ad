//! The incremental codec engine and its construction surface.
//!
//! A [`CodecEngine`] owns one coding stream in one of five modes: `.xz`
//! encoder, `.xz` decoder, auto-detecting decoder, raw encoder, raw
//! decoder. All modes share the byte-in/byte-out transform surface; the
//! mode only decides how the stream is initialised and which options are
//! meaningful.

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bitflags::bitflags;

use crate::check::CheckKind;
use crate::error::{Error, Result, Status};
use crate::ffi;
use crate::filter::{FilterChain, RawChain};
use crate::stream::Stream;

/// Default scratch buffer capacity used by the transform loop, in bytes.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 256 * 1024;

/// Smallest accepted scratch capacity, in bytes.
pub const MIN_SCRATCH_CAPACITY: usize = 4 * 1024;

/// Consecutive zero-progress coding steps tolerated before the transform
/// gives up with `BufError`.
const MAX_STALLS: usize = 2;

/// Coding action requested from a transform step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Consume input and produce output as convenient (`LZMA_RUN`).
    Run,
    /// Flush pending output without resetting coder state
    /// (`LZMA_SYNC_FLUSH`).
    SyncFlush,
    /// Flush and finalise the current block so a decoder can restart at
    /// the boundary (`LZMA_FULL_FLUSH`).
    FullFlush,
    /// Finalise the whole stream (`LZMA_FINISH`).
    Finish,
}

impl From<Action> for liblzma_sys::lzma_action {
    fn from(action: Action) -> Self {
        match action {
            Action::Run => liblzma_sys::LZMA_RUN,
            Action::SyncFlush => liblzma_sys::LZMA_SYNC_FLUSH,
            Action::FullFlush => liblzma_sys::LZMA_FULL_FLUSH,
            Action::Finish => liblzma_sys::LZMA_FINISH,
        }
    }
}

bitflags! {
    /// Behaviour flags for the `.xz` and auto-detecting decoders.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DecoderFlags: u32 {
        /// Report [`Notice::NoCheck`] when the stream carries no
        /// integrity check.
        const TELL_NO_CHECK = 0x01;

        /// Report [`Notice::UnsupportedCheck`] when the stream's check
        /// cannot be verified by this build.
        const TELL_UNSUPPORTED_CHECK = 0x02;

        /// Report [`Notice::CheckKnown`] as soon as the check kind is
        /// known, so [`CodecEngine::check_kind`] becomes meaningful.
        const TELL_ANY_CHECK = 0x04;

        /// Decode concatenated streams as one, instead of stopping at the
        /// first stream's end.
        const CONCATENATED = 0x08;

        /// Decode without verifying the integrity check.
        const IGNORE_CHECK = 0x10;
    }
}

/// Options for the two container decoders.
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// Memory usage cap in bytes; exceeding it fails decoding with
    /// [`Error::MemlimitError`]. Defaults to no effective limit.
    pub memlimit: u64,
    /// Decoder behaviour flags.
    pub flags: DecoderFlags,
}

impl DecoderOptions {
    pub fn new() -> Self {
        DecoderOptions::default()
    }

    /// Set the memory usage cap, in bytes.
    pub fn memlimit(mut self, memlimit: u64) -> Self {
        self.memlimit = memlimit;
        self
    }

    /// Set the decoder behaviour flags.
    pub fn flags(mut self, flags: DecoderFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            memlimit: u64::MAX,
            flags: DecoderFlags::empty(),
        }
    }
}

/// Non-fatal condition reported by a decoder, pending until taken with
/// [`CodecEngine::take_notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The stream carries no integrity check.
    NoCheck,
    /// The stream's check kind cannot be verified by this build; decoding
    /// continues without verification.
    UnsupportedCheck,
    /// The check kind is now known; [`CodecEngine::check_kind`] reports it.
    CheckKnown,
}

/// Lifecycle of an engine. Transforms are legal in `Ready`, `Coding` and
/// `Flushing`; the other states reject them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Uninitialized,
    Ready,
    Coding,
    Flushing,
    Finished,
    Errored,
}

/// Shared construction knobs for all five engine modes.
///
/// ```
/// use lzstream::{EngineBuilder, FilterChain, CheckKind};
///
/// let chain = FilterChain::lzma2_default()?;
/// let engine = EngineBuilder::new()
///     .scratch_capacity(64 * 1024)
///     .encoder(chain, CheckKind::default())?;
/// # let _ = engine;
/// # Ok::<(), lzstream::Error>(())
/// ```
#[derive(Default)]
pub struct EngineBuilder {
    scratch_capacity: Option<usize>,
    reclaim: Option<Arc<dyn Fn() + Send + Sync>>,
    interrupt: Option<Arc<AtomicBool>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        EngineBuilder::default()
    }

    /// Scratch buffer capacity for the transform loop, in bytes.
    ///
    /// Values are clamped to `MIN_SCRATCH_CAPACITY..=DEFAULT_SCRATCH_CAPACITY`.
    pub fn scratch_capacity(mut self, capacity: usize) -> Self {
        self.scratch_capacity =
            Some(capacity.clamp(MIN_SCRATCH_CAPACITY, DEFAULT_SCRATCH_CAPACITY));
        self
    }

    /// Hook invoked between allocation attempts when coder setup hits a
    /// memory error. Typically drops caches or otherwise frees memory.
    pub fn reclaim_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.reclaim = Some(Arc::new(hook));
        self
    }

    /// Cooperative cancellation flag, polled once per coding step.
    ///
    /// When observed set, the running transform fails with
    /// [`Error::Interrupted`] and the engine becomes unusable.
    pub fn interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Build a `.xz` stream encoder over `chain` with the given check.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OptionsError`] for an empty or otherwise invalid
    /// chain and [`Error::MemError`] when allocation fails after the
    /// retry pass.
    pub fn encoder(&self, chain: FilterChain, check: CheckKind) -> Result<CodecEngine> {
        if chain.is_empty() {
            return Err(Error::OptionsError);
        }
        let raw = chain.prepare();
        let mut stream = Stream::new();
        ffi::retry_alloc(self.reclaim.as_deref(), || {
            ffi::stream_encoder(&mut stream, raw.as_ptr(), check.into())
        })?;
        Ok(self.assemble(stream, Some(raw), u64::MAX))
    }

    /// Build a strict `.xz` stream decoder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OptionsError`] for unknown flags and
    /// [`Error::MemError`] when allocation fails after the retry pass.
    pub fn decoder(&self, options: &DecoderOptions) -> Result<CodecEngine> {
        let mut stream = Stream::new();
        ffi::retry_alloc(self.reclaim.as_deref(), || {
            ffi::stream_decoder(&mut stream, options.memlimit, options.flags.bits())
        })?;
        Ok(self.assemble(stream, None, options.memlimit))
    }

    /// Build a decoder that detects `.xz` and legacy `.lzma` input by
    /// sniffing the header bytes.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`EngineBuilder::decoder`].
    pub fn auto_decoder(&self, options: &DecoderOptions) -> Result<CodecEngine> {
        let mut stream = Stream::new();
        ffi::retry_alloc(self.reclaim.as_deref(), || {
            ffi::auto_decoder(&mut stream, options.memlimit, options.flags.bits())
        })?;
        Ok(self.assemble(stream, None, options.memlimit))
    }

    /// Build a headerless encoder over `chain`.
    ///
    /// The output carries no container framing, no check and no filter
    /// metadata; decoding requires the identical chain on the other side.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`EngineBuilder::encoder`].
    pub fn raw_encoder(&self, chain: FilterChain) -> Result<CodecEngine> {
        if chain.is_empty() {
            return Err(Error::OptionsError);
        }
        let raw = chain.prepare();
        let mut stream = Stream::new();
        ffi::retry_alloc(self.reclaim.as_deref(), || {
            ffi::raw_encoder(&mut stream, raw.as_ptr())
        })?;
        Ok(self.assemble(stream, Some(raw), u64::MAX))
    }

    /// Build a headerless decoder over `chain`, which must match the
    /// encoding side exactly.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`EngineBuilder::encoder`].
    pub fn raw_decoder(&self, chain: FilterChain) -> Result<CodecEngine> {
        if chain.is_empty() {
            return Err(Error::OptionsError);
        }
        let raw = chain.prepare();
        let mut stream = Stream::new();
        ffi::retry_alloc(self.reclaim.as_deref(), || {
            ffi::raw_decoder(&mut stream, raw.as_ptr())
        })?;
        Ok(self.assemble(stream, Some(raw), u64::MAX))
    }

    fn assemble(&self, stream: Stream, chain: Option<RawChain>, memlimit: u64) -> CodecEngine {
        CodecEngine {
            state: State::Ready,
            stream: Some(stream),
            _chain: chain,
            scratch_capacity: self.scratch_capacity.unwrap_or(DEFAULT_SCRATCH_CAPACITY),
            interrupt: self.interrupt.clone(),
            notice: None,
            memlimit,
            stream_ended: false,
        }
    }
}

/// An incremental coding stream in one of the five modes.
///
/// The engine is strictly byte-in/byte-out: callers feed input slices and
/// receive output buffers, with no I/O attached. Bytes buffered inside the
/// coder across calls are emitted, in order, by later calls: repeated
/// [`CodecEngine::update`] calls followed by one [`CodecEngine::finish`]
/// produce exactly the whole coded stream.
pub struct CodecEngine {
    state: State,
    stream: Option<Stream>,
    // Keeps the option blocks referenced by the coder alive. Field order
    // matters: the stream (and its lzma_end) goes first on drop.
    _chain: Option<RawChain>,
    scratch_capacity: usize,
    interrupt: Option<Arc<AtomicBool>>,
    notice: Option<Notice>,
    memlimit: u64,
    stream_ended: bool,
}

// SAFETY: the engine owns its stream and option blocks outright; liblzma
// coders have no thread affinity. &CodecEngine exposes only read-only
// queries, and all mutation goes through &mut self.
unsafe impl Send for CodecEngine {}

impl CodecEngine {
    /// `.xz` encoder with default construction knobs.
    pub fn encoder(chain: FilterChain, check: CheckKind) -> Result<Self> {
        EngineBuilder::new().encoder(chain, check)
    }

    /// Strict `.xz` decoder with default construction knobs.
    pub fn decoder(options: &DecoderOptions) -> Result<Self> {
        EngineBuilder::new().decoder(options)
    }

    /// Auto-detecting decoder with default construction knobs.
    pub fn auto_decoder(options: &DecoderOptions) -> Result<Self> {
        EngineBuilder::new().auto_decoder(options)
    }

    /// Headerless encoder with default construction knobs.
    pub fn raw_encoder(chain: FilterChain) -> Result<Self> {
        EngineBuilder::new().raw_encoder(chain)
    }

    /// Headerless decoder with default construction knobs.
    pub fn raw_decoder(chain: FilterChain) -> Result<Self> {
        EngineBuilder::new().raw_decoder(chain)
    }

    /// Feed `input` and collect all output the coder can produce now.
    ///
    /// The call consumes the whole input slice. Output the coder buffers
    /// internally is emitted by later calls in order, so callers lose no
    /// bytes by streaming.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after [`CodecEngine::finish`],
    /// [`Error::Interrupted`] when the cancellation flag fires, and the
    /// mapped coder error otherwise. Any error other than
    /// `NotInitialized` leaves the engine unusable; further calls fail
    /// fast with [`Error::ProgError`].
    pub fn transform(&mut self, input: &[u8], action: Action) -> Result<Vec<u8>> {
        match self.state {
            State::Uninitialized => return Err(Error::NotInitialized),
            State::Errored => return Err(Error::ProgError),
            State::Finished => return Err(Error::ProgError),
            State::Ready | State::Coding | State::Flushing => {}
        }
        self.state = match action {
            Action::Run => State::Coding,
            Action::SyncFlush | Action::FullFlush | Action::Finish => State::Flushing,
        };

        let mut produced = Vec::new();
        let mut scratch = vec![0u8; self.scratch_capacity];
        let mut pending = input;
        let mut stalls = 0usize;

        loop {
            if let Some(flag) = &self.interrupt {
                if flag.load(Ordering::Relaxed) {
                    self.state = State::Errored;
                    return Err(Error::Interrupted);
                }
            }

            let (consumed, written, status) = self.step(pending, &mut scratch, action);
            pending = &pending[consumed..];
            produced.extend_from_slice(&scratch[..written]);
            if consumed == 0 && written == 0 {
                stalls += 1;
            } else {
                stalls = 0;
            }

            match status {
                Status::Ok => {
                    if action == Action::Run && pending.is_empty() && written < scratch.len() {
                        break;
                    }
                    if stalls > MAX_STALLS {
                        self.state = State::Errored;
                        return Err(Error::BufError);
                    }
                }
                Status::StreamEnd => {
                    self.stream_ended = true;
                    self.state = if action == Action::Finish {
                        State::Finished
                    } else {
                        // Flush completed, or a decoder hit the stream's
                        // end mid-run; coding may continue.
                        State::Coding
                    };
                    break;
                }
                Status::NoCheck => {
                    self.notice = Some(Notice::NoCheck);
                }
                Status::UnsupportedCheck => {
                    self.notice = Some(Notice::UnsupportedCheck);
                }
                Status::GetCheck => {
                    self.notice = Some(Notice::CheckKnown);
                }
                Status::BufError => {
                    if consumed == 0 && written == 0 {
                        if action == Action::Run && pending.is_empty() {
                            // Nothing to code and nothing to drain.
                            break;
                        }
                        self.state = State::Errored;
                        return Err(Error::BufError);
                    }
                    // Progress was made; give the coder another step.
                }
                hard => {
                    self.state = State::Errored;
                    return Err(hard.into());
                }
            }
        }

        Ok(produced)
    }

    /// Feed input without flushing, shorthand for
    /// [`CodecEngine::transform`] with [`Action::Run`].
    pub fn update(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.transform(input, Action::Run)
    }

    /// Flush buffered output. A full flush additionally finalises the
    /// current block so decoding can restart at the boundary.
    pub fn flush(&mut self, full: bool) -> Result<Vec<u8>> {
        let action = if full {
            Action::FullFlush
        } else {
            Action::SyncFlush
        };
        self.transform(&[], action)
    }

    /// Finalise the stream, release the coder and return the trailing
    /// output.
    ///
    /// Afterwards the engine is uninitialised: transforms fail with
    /// [`Error::NotInitialized`] until a new engine is constructed.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        let trailing = if self.state == State::Finished {
            Vec::new()
        } else {
            self.transform(&[], Action::Finish)?
        };
        self.release();
        Ok(trailing)
    }

    /// Low-level single coding step over caller-managed buffers.
    ///
    /// Consumed bytes are drained from the front of `src`; `dest` is
    /// replaced with at most `max_dest` produced bytes. The raw status is
    /// returned untranslated, including informational values. Misuse of a
    /// released or failed engine yields [`Status::ProgError`].
    pub fn code(
        &mut self,
        src: &mut Vec<u8>,
        dest: &mut Vec<u8>,
        max_dest: usize,
        action: Action,
    ) -> Status {
        match self.state {
            State::Uninitialized | State::Errored => return Status::ProgError,
            State::Finished if action != Action::Finish => return Status::ProgError,
            _ => {}
        }
        if self.state != State::Finished {
            self.state = match action {
                Action::Run => State::Coding,
                _ => State::Flushing,
            };
        }

        dest.clear();
        dest.resize(max_dest, 0);
        let (consumed, written, status) = {
            let (input, output) = (src.as_slice(), dest.as_mut_slice());
            // src and dest are caller-owned, disjoint from self.
            let stream = match self.stream.as_mut() {
                Some(stream) => stream,
                None => return Status::ProgError,
            };
            stream.set_input(input);
            stream.set_output(output);
            let before_in = stream.avail_in();
            let before_out = stream.avail_out();
            let status = ffi::code(stream, action.into());
            (
                before_in - stream.avail_in(),
                before_out - stream.avail_out(),
                status,
            )
        };
        src.drain(..consumed);
        dest.truncate(written);

        match status {
            Status::StreamEnd => {
                self.stream_ended = true;
                self.state = if action == Action::Finish {
                    State::Finished
                } else {
                    State::Coding
                };
            }
            Status::NoCheck => self.notice = Some(Notice::NoCheck),
            Status::UnsupportedCheck => self.notice = Some(Notice::UnsupportedCheck),
            Status::GetCheck => self.notice = Some(Notice::CheckKnown),
            Status::Ok | Status::BufError => {}
            _ => self.state = State::Errored,
        }
        status
    }

    fn step(&mut self, input: &[u8], output: &mut [u8], action: Action) -> (usize, usize, Status) {
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return (0, 0, Status::ProgError),
        };
        stream.set_input(input);
        stream.set_output(output);
        let before_in = stream.avail_in();
        let before_out = stream.avail_out();
        let status = ffi::code(stream, action.into());
        (
            before_in - stream.avail_in(),
            before_out - stream.avail_out(),
            status,
        )
    }

    fn release(&mut self) {
        self.stream = None;
        self._chain = None;
        self.state = State::Uninitialized;
    }

    /// Take the pending decoder notice, if any.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Whether the coder has reached the logical end of its stream.
    pub fn stream_ended(&self) -> bool {
        self.stream_ended
    }

    /// Whether the engine failed and now rejects transforms.
    pub fn is_errored(&self) -> bool {
        self.state == State::Errored
    }

    /// The stream's check kind, once the decoder has read far enough to
    /// know it. Meaningful after [`Notice::CheckKnown`] with
    /// [`DecoderFlags::TELL_ANY_CHECK`], or after decoding completed.
    pub fn check_kind(&self) -> Option<CheckKind> {
        let stream = self.stream.as_ref()?;
        CheckKind::from_raw(ffi::get_check(stream)).ok()
    }

    /// Current coder memory usage in bytes, when a coder is live.
    pub fn memusage(&self) -> Option<u64> {
        self.stream.as_ref().map(ffi::memusage)
    }

    /// The decoder's configured memory limit, in bytes.
    pub fn memlimit(&self) -> u64 {
        self.stream
            .as_ref()
            .map(ffi::memlimit_get)
            .unwrap_or(self.memlimit)
    }

    /// Total input bytes the coder has consumed.
    pub fn total_in(&self) -> u64 {
        self.stream.as_ref().map(Stream::total_in).unwrap_or(0)
    }

    /// Total output bytes the coder has produced.
    pub fn total_out(&self) -> u64 {
        self.stream.as_ref().map(Stream::total_out).unwrap_or(0)
    }
}
