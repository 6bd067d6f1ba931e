use serde::Serialize;

/// Where the runner surfaces skip notices and assertion failures.
///
/// A failure is never fatal: the runner keeps going after reporting one.
pub trait Reporter {
    fn log(&mut self, message: String);
    fn fail(&mut self, message: String);
}

/// Collects every message and forwards it to the `log` facade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub logs: Vec<String>,
    pub failures: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Reporter for Report {
    fn log(&mut self, message: String) {
        log::info!("{message}");
        self.logs.push(message);
    }

    fn fail(&mut self, message: String) {
        log::error!("{message}");
        self.failures.push(message);
    }
}

/// Counts failures of a single case on their way to the underlying reporter.
pub(crate) struct Tally<'a, R: ?Sized> {
    inner: &'a mut R,
    pub(crate) failures: usize,
}

impl<'a, R: Reporter + ?Sized> Tally<'a, R> {
    pub(crate) fn new(inner: &'a mut R) -> Self {
        Self { inner, failures: 0 }
    }
}

impl<R: Reporter + ?Sized> Reporter for Tally<'_, R> {
    fn log(&mut self, message: String) {
        self.inner.log(message);
    }

    fn fail(&mut self, message: String) {
        self.failures += 1;
        self.inner.fail(message);
    }
}
