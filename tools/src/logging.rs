use std::sync::Mutex;

use tracing_subscriber::{prelude::*, EnvFilter, Registry};

lazy_static! {
    static ref LOG_INITIALIZED: Mutex<bool> = Mutex::new(false);
}

/// Initialize logging.  Output is only enabled if the environment variable
/// `RUST_LOG` is set to a non-empty value, in which case it is interpreted as
/// an `EnvFilter` directive (ex: `RUST_LOG=partmap=debug` to see tree build
/// statistics).  Calling this more than once is harmless.
pub fn init_logging() {
    let mut initialized = match LOG_INITIALIZED.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if *initialized {
        return;
    }
    *initialized = true;

    // Scripts tend to set RUST_LOG unconditionally, sometimes to an empty
    // value; that should not turn logging on.
    let rustlog = std::env::var("RUST_LOG").unwrap_or_default();
    if rustlog.is_empty() {
        return;
    }
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("ignoring malformed RUST_LOG {:?}: {}", rustlog, e);
            return;
        }
    };

    let layer = tracing_subscriber::fmt::layer()
        .compact()
        // Goes to stderr next to the tool's own output; ANSI and wall time
        // are just noise there.
        .with_ansi(false)
        .without_time()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    // A test harness or embedding program may already have installed one.
    let _ = Registry::default().with(layer).try_init();
}
