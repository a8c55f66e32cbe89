use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("finchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("finchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_ABORTS: Counter = Counter::new("finchat.client.aborts");
pub(crate) static CLIENT_REQUEST_RETRIES: Counter = Counter::new("finchat.client.retries");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("finchat.client.request_duration_seconds");
pub(crate) static CLIENT_RETRY_BACKOFF: Moments =
    Moments::new("finchat.client.retry_backoff_seconds");

pub(crate) static SESSION_LOGINS: Counter = Counter::new("finchat.session.logins");
pub(crate) static SESSION_LOGIN_FAILURES: Counter = Counter::new("finchat.session.login_failures");
pub(crate) static SESSION_LOGOUTS: Counter = Counter::new("finchat.session.logouts");
pub(crate) static SESSION_REFRESH_REJECTIONS: Counter =
    Counter::new("finchat.session.refresh_rejections");

pub(crate) static CHAT_MESSAGES: Counter = Counter::new("finchat.chat.messages");
pub(crate) static CHAT_UPLOADS: Counter = Counter::new("finchat.chat.uploads");
pub(crate) static CHAT_UPLOADS_REJECTED: Counter = Counter::new("finchat.chat.uploads_rejected");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_REQUEST_ABORTS);
    collector.register_counter(&CLIENT_REQUEST_RETRIES);
    collector.register_moments(&CLIENT_REQUEST_DURATION);
    collector.register_moments(&CLIENT_RETRY_BACKOFF);

    collector.register_counter(&SESSION_LOGINS);
    collector.register_counter(&SESSION_LOGIN_FAILURES);
    collector.register_counter(&SESSION_LOGOUTS);
    collector.register_counter(&SESSION_REFRESH_REJECTIONS);

    collector.register_counter(&CHAT_MESSAGES);
    collector.register_counter(&CHAT_UPLOADS);
    collector.register_counter(&CHAT_UPLOADS_REJECTED);
}
