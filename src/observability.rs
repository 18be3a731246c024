use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("chatbox.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("chatbox.client.request_errors");
pub(crate) static CLIENT_TIMEOUTS: Counter = Counter::new("chatbox.client.timeouts");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("chatbox.client.request_duration_seconds");
pub(crate) static CLIENT_HEALTH_CHECKS: Counter = Counter::new("chatbox.client.health_checks");

pub(crate) static SESSION_SUBMISSIONS: Counter = Counter::new("chatbox.session.submissions");
pub(crate) static SESSION_REJECTED: Counter = Counter::new("chatbox.session.rejected");
pub(crate) static SESSION_IGNORED: Counter = Counter::new("chatbox.session.ignored");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_TIMEOUTS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);
    collector.register_counter(&CLIENT_HEALTH_CHECKS);

    collector.register_counter(&SESSION_SUBMISSIONS);
    collector.register_counter(&SESSION_REJECTED);
    collector.register_counter(&SESSION_IGNORED);
}
