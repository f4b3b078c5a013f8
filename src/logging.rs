use std::sync::Mutex;
use std::time::Instant;

use env_logger::{Builder, Env, Target};

/// Global timestamp for delta calculation
static LAST_LOG: Mutex<Option<Instant>> = Mutex::new(None);

/// Initialize the logger with delta timestamps.
///
/// `RUST_LOG` wins over `default_level`. Safe to call more than once; only
/// the first call installs the logger.
pub fn init(default_level: &str) {
    let _ = Builder::from_env(Env::default().default_filter_or(default_level))
        .target(Target::Stderr)
        .format(|buf, record| {
            use std::io::Write;

            let now = Instant::now();
            let delta = match LAST_LOG.lock() {
                Ok(mut last) => {
                    let delta = last.map(|t| now.duration_since(t).as_millis()).unwrap_or(0);
                    *last = Some(now);
                    delta
                }
                Err(_) => 0,
            };

            writeln!(
                buf,
                "{} [+{} ms] [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                delta,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();
}
