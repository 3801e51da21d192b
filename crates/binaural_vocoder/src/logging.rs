//! Realtime-safe logging.
//!
//! The audio thread may not allocate, block, or perform I/O, which rules out handing a message straight to whatever
//! logger the host installed.  It still has things worth saying: the control surface can hand it an azimuth it has to
//! throw away, and a host can call `process` before `prepare`.
//!
//! The `rt_*` macros here behave like the macros of the `log` crate, with one difference.  On a thread marked as an
//! audio thread (see [crate::is_audio_thread]) the message is formatted into a fixed-size inline buffer and pushed
//! onto a preallocated ring.  A background thread drains the ring and forwards each record to `log`.  Anywhere else the
//! macros forward to `log` directly.
//!
//! Overlong messages are truncated at a character boundary.  If the ring is full the record is dropped and counted;
//! the count rides along with the next record that does make it, so the log always says how much went missing.  The
//! timestamps the logger sees are those of forwarding, not of the event; records that sat in the ring for a noticeable
//! time say so.
use std::fmt::Arguments as FmtArgs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{park, JoinHandle};
use std::time::{Duration, Instant};

use arrayvec::ArrayString;
use thingbuf::{recycling::Recycle, ThingBuf};

// Together these reserve around `MESSAGE_BYTES * QUEUE_LENGTH` bytes up front.  The audio thread only ever says a
// handful of things per block, so this is generous.
const MESSAGE_BYTES: usize = 256;
const QUEUE_LENGTH: usize = 4096;

/// Records older than this when forwarded get a note about the delay.
const WARN_LATENCY: Duration = Duration::from_millis(250);

type InlineMessage = ArrayString<MESSAGE_BYTES>;

#[derive(Debug)]
#[allow(clippy::large_enum_variant)] // Basically a Cow, and never moved around much.
pub(crate) enum Message {
    Static(&'static str),
    Inline(InlineMessage),
}

pub(crate) struct QueuedRecord {
    /// Records this thread failed to enqueue since its last successful push.
    dropped_before: u64,
    level: log::Level,
    /// Output of `module_path!` at the call site.
    module: &'static str,
    message: Message,
    truncated: bool,
    queued_at: Instant,
}

/// Writes into an [InlineMessage] until it is full, then flags truncation and quietly discards the rest.
struct TruncatingWriter<'a> {
    buffer: &'a mut InlineMessage,
    truncated: &'a mut bool,
}

impl std::fmt::Write for TruncatingWriter<'_> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        if *self.truncated {
            return Ok(());
        }

        // ArrayString capacity is in bytes.
        if s.len() <= self.buffer.remaining_capacity() {
            self.buffer.push_str(s);
            return Ok(());
        }

        *self.truncated = true;

        // Fill what's left without splitting a character.
        for c in s.chars() {
            if self.buffer.try_push(c).is_err() {
                break;
            }
        }

        Ok(())
    }
}

/// Format a record without allocating.
pub(crate) fn format_record(level: log::Level, args: FmtArgs<'_>, module: &'static str) -> QueuedRecord {
    use std::fmt::Write;

    let mut truncated = false;

    let message = match args.as_str() {
        Some(s) => Message::Static(s),
        None => {
            let mut buffer = InlineMessage::new();
            let mut writer = TruncatingWriter {
                buffer: &mut buffer,
                truncated: &mut truncated,
            };

            // The writer never reports an error, so neither does formatting.
            let _ = write!(writer, "{}", args);
            Message::Inline(buffer)
        }
    };

    QueuedRecord {
        dropped_before: 0,
        level,
        module,
        message,
        truncated,
        queued_at: Instant::now(),
    }
}

struct RecordRecycler;

impl Recycle<QueuedRecord> for RecordRecycler {
    fn new_element(&self) -> QueuedRecord {
        QueuedRecord {
            dropped_before: 0,
            level: log::Level::Trace,
            module: module_path!(),
            message: Message::Static(""),
            truncated: false,
            queued_at: Instant::now(),
        }
    }

    fn recycle(&self, _element: &mut QueuedRecord) {
        // Slots are overwritten wholesale on the next push.
    }
}

struct Forwarder {
    thread: JoinHandle<()>,
    queue: ThingBuf<QueuedRecord, RecordRecycler>,
}

static FORWARDER_STARTED: AtomicBool = AtomicBool::new(false);

lazy_static::lazy_static! {
    static ref FORWARDER: Forwarder = {
        FORWARDER_STARTED.store(true, Ordering::Relaxed);
        Forwarder {
            // Touching FORWARDER from the spawned thread blocks until this initializer finishes, which is fine: the
            // thread has nothing to do before then.
            thread: std::thread::Builder::new()
                .name("binaural_vocoder_log".into())
                .spawn(forward_forever)
                .unwrap_or_else(|_| std::thread::spawn(forward_forever)),
            queue: ThingBuf::with_recycle(QUEUE_LENGTH, RecordRecycler),
        }
    };
}

/// Queue a record for the background thread.  Entry point for [rt_log].
pub(crate) fn enqueue(level: log::Level, args: FmtArgs<'_>, module: &'static str) {
    use std::cell::Cell;

    thread_local! {
        static DROPPED: Cell<u64> = const { Cell::new(0) };
    }

    if level > log::max_level() {
        return;
    }

    let mut record = format_record(level, args, module);
    record.dropped_before = DROPPED.get();

    match FORWARDER.queue.push(record) {
        Ok(_) => {
            DROPPED.replace(0);
            FORWARDER.thread.thread().unpark();
        }
        Err(_) => {
            DROPPED.replace(DROPPED.get() + 1);
        }
    }
}

fn forward_one(record: QueuedRecord) {
    if record.dropped_before != 0 {
        log::warn!(
            "The audio thread's log queue overflowed; {} messages were dropped",
            record.dropped_before
        );
    }

    let text = match &record.message {
        Message::Static(s) => s,
        Message::Inline(i) => i.as_str(),
    };

    let latency = record.queued_at.elapsed();
    let truncated = if record.truncated { ", truncated" } else { "" };

    if latency > WARN_LATENCY {
        log::log!(
            target: record.module,
            record.level,
            "{} (from audio thread, delayed by {:.3}s{truncated})",
            text,
            latency.as_secs_f64()
        );
    } else {
        log::log!(target: record.module, record.level, "{} (from audio thread{truncated})", text);
    }
}

fn forward_forever() {
    loop {
        while let Some(record) = FORWARDER.queue.pop() {
            forward_one(record);
        }

        // A push racing with this park leaves the thread's token set, so the park returns immediately.
        park();
    }
}

/// Like `log::log!`, but safe on the audio thread.  The target is always the calling module.
#[allow(clippy::crate_in_macro_def)] // Private to this crate.
macro_rules! rt_log {
    ($level: expr, $fmt: expr $(, $args: expr)* $(,)?) => {
        let macro_level = $level;
        if crate::is_audio_thread::is_audio_thread() {
            if macro_level <= log::max_level() {
                crate::logging::enqueue(macro_level, format_args!($fmt, $($args),*), module_path!());
            }
        } else {
            log::log!(macro_level, $fmt, $($args),*);
        }
    }
}

#[cfg(test)]
macro_rules! rt_error {
    ($($args: tt)+) => {
        rt_log!(log::Level::Error, $($args)*);
    }
}

macro_rules! rt_warn {
    ($($args: tt)+) => {
        rt_log!(log::Level::Warn, $($args)*);
    }
}

macro_rules! rt_debug {
    ($($args: tt)+) => {
        rt_log!(log::Level::Debug, $($args)*);
    }
}

/// Spawn the forwarding thread now, from a thread that is allowed to spawn threads.
///
/// Called when an engine is built and from `prepare`, so that the first message from the audio thread doesn't have to.
pub(crate) fn ensure_forwarder() {
    std::hint::black_box(FORWARDER.queue.capacity());
}

#[cfg(test)]
pub(crate) fn forwarder_started() -> bool {
    FORWARDER_STARTED.load(Ordering::Relaxed)
}
