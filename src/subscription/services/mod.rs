//! Application services for subscriber registration.

mod registry;

pub use registry::{
    BrowserSubscription, BrowserSubscriptionKeys, SubscribeRequest, SubscriptionService,
    SubscriptionServiceError, SubscriptionServiceResult,
};
