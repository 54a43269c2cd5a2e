//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api`. Includes a [`TraceLayer`] that logs each
/// HTTP request/response at the `DEBUG` level using the `tracing` ecosystem.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use heatkeeper_adapter_virtual::VirtualController;
    use heatkeeper_app::control_loop::{ControlHandle, ControlLoop};
    use heatkeeper_app::event_bus::NotificationBus;
    use heatkeeper_app::poller::{Poller, RefreshHandle};
    use heatkeeper_domain::id::{UserId, ZoneId};
    use heatkeeper_domain::presence::{Presence, User};
    use heatkeeper_domain::rule::{RuleConfig, ZoneConfig};
    use heatkeeper_domain::zone::Zone;
    use tokio::sync::watch;
    use tower::ServiceExt;

    fn vendor() -> Arc<VirtualController> {
        Arc::new(
            VirtualController::new()
                .with_zone(Zone::new(ZoneId::new(1), "Living room"))
                .with_user(User::new(UserId::new(10), "alice", Presence::Away)),
        )
    }

    fn zones() -> Vec<ZoneConfig> {
        vec![ZoneConfig {
            zone: "Living room".to_string(),
            rules: vec![RuleConfig::AutoAway {
                delay_secs: 7200,
                users: vec!["alice".to_string()],
            }],
        }]
    }

    /// Wire a poller and control loop the way the daemon does.
    fn running(
        shutdown: watch::Receiver<bool>,
    ) -> (ControlHandle, Arc<Poller<Arc<VirtualController>>>) {
        let vendor = vendor();
        let poller = Arc::new(Poller::new(Arc::clone(&vendor), 4));
        let subscription = poller.subscribe();
        let (control, handle) = ControlLoop::new(
            zones(),
            vendor,
            Arc::new(NotificationBus::new(16)),
            poller.refresh_handle(),
        );
        tokio::spawn(control.run(subscription.receiver, shutdown.clone()));
        {
            let poller = Arc::clone(&poller);
            tokio::spawn(async move { poller.run(Duration::from_secs(3600), shutdown).await });
        }
        (handle, poller)
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let (_tx, rx) = watch::channel(false);
        let (handle, _poller) = running(rx);
        let app = build(AppState::new(handle));

        let response = app.oneshot(request(Method::GET, "/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn should_return_report_with_pending_task() {
        let (_tx, rx) = watch::channel(false);
        let (handle, _poller) = running(rx);

        // The first poll happens right away; wait for the loop to process it.
        let mut report = handle.report().await.unwrap();
        while report.zones.is_empty() {
            tokio::task::yield_now().await;
            report = handle.report().await.unwrap();
        }
        let app = build(AppState::new(handle));

        let response = app
            .oneshot(request(Method::GET, "/api/report"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["zones"][0]["zone_name"], "Living room");
        assert_eq!(json["zones"][0]["state"]["mode"], "auto");
        assert_eq!(json["zones"][0]["scheduled"]["target"], "off");
    }

    #[tokio::test]
    async fn should_trigger_poll_when_refresh_posted() {
        let (_tx, rx) = watch::channel(false);
        let vendor = vendor();
        let poller = Arc::new(Poller::new(Arc::clone(&vendor), 4));
        let mut subscription = poller.subscribe();
        let (_control, handle) = ControlLoop::new(
            zones(),
            vendor,
            Arc::new(NotificationBus::new(16)),
            poller.refresh_handle(),
        );
        {
            let poller = Arc::clone(&poller);
            tokio::spawn(async move { poller.run(Duration::from_secs(3600), rx).await });
        }
        subscription.receiver.recv().await.unwrap();
        let app = build(AppState::new(handle));

        let response = app
            .oneshot(request(Method::POST, "/api/refresh"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(subscription.receiver.recv().await.is_some());
    }

    #[tokio::test]
    async fn should_return_503_when_control_loop_stopped() {
        let (control, handle) = ControlLoop::new(
            zones(),
            vendor(),
            Arc::new(NotificationBus::new(16)),
            RefreshHandle::default(),
        );
        drop(control);
        let app = build(AppState::new(handle));

        let response = app
            .oneshot(request(Method::GET, "/api/report"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
