use env_logger::Env;

/// Install `env_logger` for test runs, honoring `RUST_LOG` and defaulting to
/// `info`. Safe to call from every test.
pub fn init_test_logging() {
    if env_logger::try_init_from_env(Env::new().default_filter_or("info")).is_ok() {
        log::debug!("Test logging initialized");
    }
}
