#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

use std::cell::Cell;
use std::rc::Rc;
use std::sync::LazyLock;
use std::time::Instant;

use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Prints the time since the first test in this process called [`setup`].
struct Uptime;

impl FormatTime for Uptime {
    fn format_time(&self, w: &mut Writer<'_>) -> core::fmt::Result {
        let elapsed = START_TIME.elapsed();
        write!(w, "{:4}.{:03}s", elapsed.as_secs(), elapsed.subsec_millis())
    }
}

static SUBSCRIBER_INIT: LazyLock<()> = LazyLock::new(|| {
    let _ = *START_TIME;

    let filter = std::env::var("FIXTURES_LOG")
        .ok()
        .and_then(|s| s.parse::<Targets>().ok())
        .unwrap_or_else(|| Targets::new().with_default(tracing::Level::TRACE));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_timer(Uptime)
                .with_target(false)
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .with_test_writer()
                .compact(),
        )
        .with(filter)
        .try_init()
        .ok();
});

/// Install the test tracing subscriber, once per process.
///
/// Output is captured per test through the libtest writer. Set `FIXTURES_LOG`
/// to a target filter (for example `fixtures=debug`) to narrow it down.
pub fn setup() {
    #[allow(clippy::let_unit_value)]
    let _ = *SUBSCRIBER_INIT;
}

/// A counting generator: yields `0`, `1`, `2`, ... on successive calls.
///
/// The returned [`SequenceHandle`] observes how many values were handed out,
/// which lets a test assert how often a generator actually ran.
pub fn sequence() -> (impl FnMut() -> u32 + 'static, SequenceHandle) {
    let issued = Rc::new(Cell::new(0u32));
    let handle = SequenceHandle {
        issued: Rc::clone(&issued),
    };
    let next = move || {
        let n = issued.get();
        issued.set(n + 1);
        n
    };
    (next, handle)
}

/// Observer half of [`sequence`].
#[derive(Debug, Clone)]
pub struct SequenceHandle {
    issued: Rc<Cell<u32>>,
}

impl SequenceHandle {
    /// How many values the generator has produced so far.
    pub fn issued(&self) -> u32 {
        self.issued.get()
    }
}

/// An error type that panics when it's built, so a test can use `?` on any
/// fixture error and still get a located panic message.
#[derive(Debug)]
pub struct IPanic;

impl<E> From<E> for IPanic
where
    E: core::error::Error,
{
    #[track_caller]
    fn from(value: E) -> Self {
        panic!("from: {}: {value}", core::panic::Location::caller())
    }
}
