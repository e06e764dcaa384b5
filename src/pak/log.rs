use std::fmt::Arguments;

/// Logging capability handed to the [`Manager`](super::Manager) at construction
pub trait PakLogger: Send + Sync {
    fn debug(&self, args: Arguments<'_>);
    fn info(&self, args: Arguments<'_>);
}

/// Forwards to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl PakLogger for LogFacade {
    fn debug(&self, args: Arguments<'_>) {
        log::debug!("{args}");
    }

    fn info(&self, args: Arguments<'_>) {
        log::info!("{args}");
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl PakLogger for NoopLogger {
    fn debug(&self, _: Arguments<'_>) {}
    fn info(&self, _: Arguments<'_>) {}
}
