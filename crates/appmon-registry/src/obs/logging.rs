use tracing_subscriber::{fmt, EnvFilter};

/// Install a fmt subscriber filtered by `RUST_LOG`. A second call (or a
/// subscriber installed by the host application) is left untouched.
pub fn init() {
    let _ = fmt().with_env_filter(EnvFilter::from_default_env()).try_init();
}
