use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::error;

use crate::features::commands::controller::CommandController;
use crate::shared::types::{CommandReply, CommandRequest};

#[derive(Clone)]
pub struct AppState {
    pub commands: Arc<CommandController>,
}

pub fn router(commands: Arc<CommandController>) -> Router {
    Router::new()
        .route("/v1/commands", post(handle_command))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(AppState { commands })
}

/// Command failures are reported in the reply body, so this always answers 200.
async fn handle_command(
    State(state): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> Json<CommandReply> {
    Json(state.commands.handle(request).await)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.commands.observability().render_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_controller;
    use crate::features::access_control::service::AllowAllGate;
    use crate::features::inventory::repo::InMemoryInventoryRepository;
    use crate::features::observability::controller::ObservabilityController;
    use crate::shared::config::ControlPlaneConfig;
    use amicut_core::{Edp, Instance, InstanceState};
    use axum::body::Body;
    use axum::http::Request;
    use std::collections::BTreeMap;
    use tower::ServiceExt;

    async fn app() -> Router {
        let config = ControlPlaneConfig::from_lookup(|key| match key {
            "AMICUT_BUILD_TRIGGER_URL" => Some("http://127.0.0.1:9/job/build-ami".to_string()),
            "AMICUT_INVENTORY_SNAPSHOT" => Some("/unused".to_string()),
            _ => None,
        })
        .unwrap();

        let edp = Edp::new("prod", "edx", "edxapp");
        let repo = InMemoryInventoryRepository::new();
        repo.upsert_instance(Instance {
            instance_id: "i-1".to_string(),
            state: InstanceState::Running,
            image_id: "ami-1".to_string(),
            private_dns_name: "ip-10-0-0-1.ec2.internal".to_string(),
            tags: BTreeMap::from([
                ("environment".to_string(), edp.environment.clone()),
                ("deployment".to_string(), edp.deployment.clone()),
                ("play".to_string(), edp.play.clone()),
            ]),
        })
        .await;

        let observability = ObservabilityController::with_registry().unwrap();
        let controller =
            command_controller(&config, Arc::new(repo), Arc::new(AllowAllGate), observability)
                .unwrap();
        router(controller)
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let response = app()
            .await
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_command_round_trip() {
        let app = app().await;
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/commands")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"user":"alice","text":"show prod-edx"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let reply: CommandReply = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(reply.ok);
        assert_eq!(reply.lines, vec!["Active Plays\n------------\nedxapp"]);

        let metrics = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(metrics.status(), StatusCode::OK);
        assert!(body_string(metrics)
            .await
            .contains("amicut_command_total{command=\"show_plays\",status=\"ok\"} 1"));
    }

    #[tokio::test]
    async fn test_failed_command_is_still_200_with_error_code() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/commands")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"user":"alice","text":"cut ami for prod-edx"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let reply: CommandReply = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(!reply.ok);
        assert_eq!(reply.error_code.as_deref(), Some("INVALID_COMMAND"));
    }
}
