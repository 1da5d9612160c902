use std::any::type_name;
use std::collections::HashMap;

use async_trait::async_trait;

use super::errors::RouterError;
use super::handler::EventHandler;
use crate::schema::EventPayload;

// ============================================================================
// Event Router
// ============================================================================
//
// event type -> exactly one handler. Dispatch does no retries and does not
// swallow errors; ack/retry policy belongs to whoever called dispatch.
//
// ============================================================================

#[async_trait]
trait ErasedHandler: Send + Sync {
    fn handler_name(&self) -> &'static str;

    async fn call(
        &self,
        event_type: &str,
        payload: Box<dyn EventPayload>,
    ) -> Result<(), RouterError>;
}

struct Registered<H>(H);

#[async_trait]
impl<H: EventHandler> ErasedHandler for Registered<H> {
    fn handler_name(&self) -> &'static str {
        type_name::<H>()
    }

    async fn call(
        &self,
        event_type: &str,
        payload: Box<dyn EventPayload>,
    ) -> Result<(), RouterError> {
        let actual = payload.payload_type();
        let payload = payload
            .into_any()
            .downcast::<H::Payload>()
            .map_err(|_| RouterError::PayloadMismatch {
                event_type: event_type.to_string(),
                expected: type_name::<H::Payload>(),
                actual,
            })?;

        self.0
            .handle(*payload)
            .await
            .map_err(|source| RouterError::Handler {
                event_type: event_type.to_string(),
                source,
            })
    }
}

#[derive(Default)]
pub struct EventRouter {
    handlers: HashMap<String, Box<dyn ErasedHandler>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to its event type. A previous binding for the same type
    /// is replaced.
    pub fn register_handler<H: EventHandler>(&mut self, handler: H) {
        let event_type = handler.event_type().to_string();
        let registered = Registered(handler);
        let name = registered.handler_name();

        if let Some(previous) = self.handlers.insert(event_type.clone(), Box::new(registered)) {
            tracing::warn!(
                event_type = %event_type,
                previous = previous.handler_name(),
                handler = name,
                "Replacing existing handler registration"
            );
        } else {
            tracing::debug!(event_type = %event_type, handler = name, "Registered event handler");
        }
    }

    pub fn handles(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub async fn dispatch(
        &self,
        event_type: &str,
        payload: Box<dyn EventPayload>,
    ) -> Result<(), RouterError> {
        let handler = self
            .handlers
            .get(event_type)
            .ok_or_else(|| RouterError::NoHandler(event_type.to_string()))?;

        tracing::debug!(
            event_type = %event_type,
            handler = handler.handler_name(),
            "Dispatching event"
        );

        handler.call(event_type, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::app::{AppInstallEvent, AppUninstallEvent};
    use crate::events::HandlerError;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    struct InstallRecorder {
        label: &'static str,
        recorder: Recorder,
    }

    #[async_trait]
    impl EventHandler for InstallRecorder {
        type Payload = AppInstallEvent;

        async fn handle(&self, payload: AppInstallEvent) -> Result<(), HandlerError> {
            self.recorder
                .seen
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.label, payload.app_id));
            Ok(())
        }
    }

    struct UninstallRecorder(Recorder);

    #[async_trait]
    impl EventHandler for UninstallRecorder {
        type Payload = AppUninstallEvent;

        async fn handle(&self, payload: AppUninstallEvent) -> Result<(), HandlerError> {
            self.0.seen.lock().unwrap().push(format!("uninstall:{}", payload.app_id));
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl EventHandler for Failing {
        type Payload = AppInstallEvent;

        async fn handle(&self, _payload: AppInstallEvent) -> Result<(), HandlerError> {
            Err(HandlerError::Rejected("downstream unavailable".to_string()))
        }
    }

    fn install(app_id: &str) -> Box<dyn EventPayload> {
        Box::new(AppInstallEvent {
            app_id: app_id.to_string(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_dispatch_without_registration_fails() {
        let router = EventRouter::new();

        let err = router.dispatch("AppInstallEvent", install("a1")).await.unwrap_err();
        assert!(matches!(err, RouterError::NoHandler(t) if t == "AppInstallEvent"));
    }

    #[tokio::test]
    async fn test_dispatch_invokes_only_the_bound_handler_once() {
        let recorder = Recorder::default();
        let mut router = EventRouter::new();
        router.register_handler(InstallRecorder {
            label: "install",
            recorder: recorder.clone(),
        });
        router.register_handler(UninstallRecorder(recorder.clone()));

        router.dispatch("AppInstallEvent", install("a1")).await.unwrap();

        assert_eq!(recorder.seen(), vec!["install:a1".to_string()]);
    }

    #[tokio::test]
    async fn test_second_registration_replaces_first() {
        let recorder = Recorder::default();
        let mut router = EventRouter::new();
        router.register_handler(InstallRecorder {
            label: "first",
            recorder: recorder.clone(),
        });
        router.register_handler(InstallRecorder {
            label: "second",
            recorder: recorder.clone(),
        });

        router.dispatch("AppInstallEvent", install("a1")).await.unwrap();

        assert_eq!(recorder.seen(), vec!["second:a1".to_string()]);
        assert_eq!(router.event_types().count(), 1);
    }

    #[tokio::test]
    async fn test_handler_error_propagates_unchanged() {
        let mut router = EventRouter::new();
        router.register_handler(Failing);

        let err = router.dispatch("AppInstallEvent", install("a1")).await.unwrap_err();
        match err {
            RouterError::Handler { event_type, source } => {
                assert_eq!(event_type, "AppInstallEvent");
                assert!(matches!(
                    source,
                    HandlerError::Rejected(ref m) if m == "downstream unavailable"
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_payload_of_wrong_type_is_rejected() {
        let recorder = Recorder::default();
        let mut router = EventRouter::new();
        router.register_handler(UninstallRecorder(recorder.clone()));

        let err = router.dispatch("AppUninstallEvent", install("a1")).await.unwrap_err();

        assert!(matches!(err, RouterError::PayloadMismatch { .. }));
        assert!(recorder.seen().is_empty());
    }
}
