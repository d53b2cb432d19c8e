use biometrics::{Collector, Counter, Moments};

pub(crate) static ENGINE_REQUESTS: Counter = Counter::new("omnimind.engine.requests");
pub(crate) static ENGINE_REQUEST_ERRORS: Counter = Counter::new("omnimind.engine.request_errors");
pub(crate) static ENGINE_REQUEST_DURATION: Moments =
    Moments::new("omnimind.engine.request_duration_seconds");

pub(crate) static SESSION_SUBMISSIONS: Counter = Counter::new("omnimind.session.submissions");
pub(crate) static SESSION_CANCELLATIONS: Counter = Counter::new("omnimind.session.cancellations");
pub(crate) static SESSION_FAILURES: Counter = Counter::new("omnimind.session.failures");
pub(crate) static SESSION_EXCHANGE_DURATION: Moments =
    Moments::new("omnimind.session.exchange_duration_seconds");

pub(crate) static UPLOADS: Counter = Counter::new("omnimind.upload.requests");
pub(crate) static UPLOAD_ERRORS: Counter = Counter::new("omnimind.upload.errors");
pub(crate) static OPEN_REQUESTS: Counter = Counter::new("omnimind.open.requests");
pub(crate) static OPEN_ERRORS: Counter = Counter::new("omnimind.open.errors");
pub(crate) static REFRESH_ERRORS: Counter = Counter::new("omnimind.refresh.errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&ENGINE_REQUESTS);
    collector.register_counter(&ENGINE_REQUEST_ERRORS);
    collector.register_moments(&ENGINE_REQUEST_DURATION);

    collector.register_counter(&SESSION_SUBMISSIONS);
    collector.register_counter(&SESSION_CANCELLATIONS);
    collector.register_counter(&SESSION_FAILURES);
    collector.register_moments(&SESSION_EXCHANGE_DURATION);

    collector.register_counter(&UPLOADS);
    collector.register_counter(&UPLOAD_ERRORS);
    collector.register_counter(&OPEN_REQUESTS);
    collector.register_counter(&OPEN_ERRORS);
    collector.register_counter(&REFRESH_ERRORS);
}
