use std::sync::Arc;
use std::time::Instant;

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::features::access_control::service::PermissionGate;
use crate::features::build_dispatch::service::{BuildDispatchService, DispatchOutcome};
use crate::features::fleet_report::service::FleetReportService;
use crate::features::observability::controller::ObservabilityController;
use crate::features::version_sets::service::VersionSetService;
use crate::shared::error::{ControlPlaneError, ControlPlaneResult};
use crate::shared::types::{BuildRequest, Command, CommandReply, CommandRequest, CutRequest};
use amicut_core::command::HELP_TEXT;
use amicut_core::report::{render_plays, render_status_table, render_tags};

const GATHERING_NOTE: &str = "Let me get what I need to build the ami...";

/// Entry point for chat commands: parse, authorize, run, reply.
pub struct CommandController {
    gate: Arc<dyn PermissionGate>,
    version_sets: Arc<VersionSetService>,
    dispatch: Arc<BuildDispatchService>,
    fleet: Arc<FleetReportService>,
    observability: Arc<ObservabilityController>,
}

impl CommandController {
    pub fn new(
        gate: Arc<dyn PermissionGate>,
        version_sets: Arc<VersionSetService>,
        dispatch: Arc<BuildDispatchService>,
        fleet: Arc<FleetReportService>,
        observability: Arc<ObservabilityController>,
    ) -> Self {
        Self {
            gate,
            version_sets,
            dispatch,
            fleet,
            observability,
        }
    }

    pub fn observability(&self) -> &Arc<ObservabilityController> {
        &self.observability
    }

    /// Never fails: every error becomes a reply with `ok == false`.
    pub async fn handle(&self, request: CommandRequest) -> CommandReply {
        let invocation_id = Uuid::new_v4();
        let span = info_span!("command", %invocation_id, user = %request.user);
        self.handle_in_span(request).instrument(span).await
    }

    async fn handle_in_span(&self, request: CommandRequest) -> CommandReply {
        let started = Instant::now();
        info!(text = %request.text, "Received command");

        let (name, reply) = match Command::parse(&request.text) {
            Ok(command) => {
                let name = command.name();
                (name, self.run(&request.user, command).await)
            }
            Err(error) => (
                "unknown",
                CommandReply::failure(Vec::new(), ControlPlaneError::from(error).into()),
            ),
        };

        if let Some(code) = &reply.error_code {
            warn!(command = name, error_code = %code, "Command failed");
        }
        self.observability.record_command(
            name,
            reply.status_label(),
            started.elapsed().as_secs_f64(),
        );
        reply
    }

    async fn run(&self, user: &str, command: Command) -> CommandReply {
        if let Some(action) = command.action() {
            if let Err(error) = self.gate.authorize(user, action) {
                return CommandReply::failure(Vec::new(), error.into());
            }
        }

        let result = match command {
            Command::Help => Ok(vec![HELP_TEXT.to_string()]),
            Command::ShowPlays {
                environment,
                deployment,
            } => self
                .fleet
                .list_active_plays(&environment, &deployment)
                .await
                .map(|plays| vec![render_plays(&plays)]),
            Command::ShowEdp(edp) => self
                .fleet
                .describe_edp(&edp)
                .await
                .map(|rows| vec![render_status_table(&rows)]),
            Command::ShowImage {
                deployment,
                image_id,
            } => {
                info!(deployment = %deployment, image_id = %image_id, "Describing image");
                self.fleet
                    .describe_image(&image_id)
                    .await
                    .map(|image| vec![render_tags(&image.tags)])
            }
            Command::CutImage(cut) => return self.cut_image(cut).await,
        };

        match result {
            Ok(lines) => CommandReply::success(lines),
            Err(error) => CommandReply::failure(Vec::new(), error.into()),
        }
    }

    async fn cut_image(&self, cut: CutRequest) -> CommandReply {
        let mut lines = vec![GATHERING_NOTE.to_string()];

        let plan = match self
            .version_sets
            .plan(&cut.destination, &cut.source, &cut.overrides)
            .await
        {
            Ok(plan) => plan,
            Err(error) => return CommandReply::failure(lines, error.into()),
        };

        lines.extend(plan.notes);
        lines.extend(
            plan.defects
                .iter()
                .map(|defect| format!("Warning: {defect}")),
        );
        match plan.request.summary(cut.verbose) {
            Ok(summary) => lines.extend(summary.lines().map(str::to_string)),
            Err(error) => {
                return CommandReply::failure(lines, ControlPlaneError::from(error).into())
            }
        }

        match self.dispatch_build(&plan.request, cut.dry_run).await {
            Ok(DispatchOutcome::Previewed { request }) => {
                lines.push(format!("Would have posted: {request}"));
                CommandReply::success(lines)
            }
            Ok(DispatchOutcome::Triggered { status }) => {
                lines.push(format!("Build triggered (status {status})"));
                let mut reply = CommandReply::success(lines);
                reply.build_triggered = true;
                reply
            }
            Ok(DispatchOutcome::Rejected { status, body }) => {
                let error = ControlPlaneError::DispatchFailure(format!(
                    "build trigger answered {status}: {body}"
                ));
                CommandReply::failure(lines, error.into())
            }
            Err(error) => CommandReply::failure(lines, error.into()),
        }
    }

    async fn dispatch_build(
        &self,
        request: &BuildRequest,
        dry_run: bool,
    ) -> ControlPlaneResult<DispatchOutcome> {
        let outcome = self.dispatch.dispatch(request, dry_run).await;
        let label = match &outcome {
            Ok(outcome) => outcome.outcome_label(),
            Err(_) => "failed",
        };
        self.observability.record_build_dispatch(label);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access_control::service::{AllowAllGate, StaticPermissionGate};
    use crate::features::build_dispatch::repo::{BuildTriggerRepository, TriggerResponse};
    use crate::features::edp_resolution::service::EdpResolverService;
    use crate::features::inventory::repo::InMemoryInventoryRepository;
    use crate::features::inventory::service::InventoryService;
    use crate::shared::config::BuildTriggerConfig;
    use amicut_core::{Edp, Image, Instance, InstanceState, LoadBalancer};
    use async_trait::async_trait;
    use reqwest::Url;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingTrigger {
        status: u16,
        calls: Mutex<Vec<Url>>,
    }

    impl RecordingTrigger {
        fn answering(status: u16) -> Arc<Self> {
            Arc::new(Self {
                status,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Url> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BuildTriggerRepository for RecordingTrigger {
        async fn trigger(&self, url: &Url) -> ControlPlaneResult<TriggerResponse> {
            self.calls.lock().unwrap().push(url.clone());
            Ok(TriggerResponse {
                status: self.status,
                body: "nope".to_string(),
            })
        }
    }

    fn instance(id: &str, edp: &Edp, image: &str) -> Instance {
        Instance {
            instance_id: id.to_string(),
            state: InstanceState::Running,
            image_id: image.to_string(),
            private_dns_name: format!("{id}.ec2.internal"),
            tags: BTreeMap::from([
                ("environment".to_string(), edp.environment.clone()),
                ("deployment".to_string(), edp.deployment.clone()),
                ("play".to_string(), edp.play.clone()),
            ]),
        }
    }

    fn image(id: &str, tags: &[(&str, &str)]) -> Image {
        Image {
            image_id: id.to_string(),
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    async fn inventory() -> Arc<InventoryService> {
        let prod = Edp::new("prod", "edx", "edxapp");
        let stage = Edp::new("stage", "edx", "edxapp");
        let split = Edp::new("prod", "edx", "forum");

        let repo = InMemoryInventoryRepository::new();
        repo.upsert_instance(instance("i-prod", &prod, "ami-7")).await;
        repo.upsert_instance(instance("i-stage", &stage, "ami-42")).await;
        repo.upsert_instance(instance("i-forum-1", &split, "ami-1")).await;
        repo.upsert_instance(instance("i-forum-2", &split, "ami-2")).await;
        repo.upsert_image(image(
            "ami-7",
            &[("version:configuration", "git@host:config abc"), ("version:a", "git@host:a 1")],
        ))
        .await;
        repo.upsert_image(image("ami-42", &[("version:configuration", "repo old")]))
            .await;
        repo.upsert_load_balancer(LoadBalancer {
            name: "edx-lb".to_string(),
            instance_ids: vec![
                "i-prod".to_string(),
                "i-stage".to_string(),
                "i-forum-1".to_string(),
                "i-forum-2".to_string(),
            ],
        })
        .await;

        Arc::new(InventoryService::new(Arc::new(repo), Duration::from_secs(1)))
    }

    async fn controller_with(
        gate: Arc<dyn PermissionGate>,
        trigger: Arc<RecordingTrigger>,
    ) -> CommandController {
        let observability = ObservabilityController::with_registry().unwrap();
        let inventory = inventory().await;
        let resolver = Arc::new(
            EdpResolverService::new(inventory.clone()).with_observability(observability.clone()),
        );
        let version_sets = Arc::new(VersionSetService::new(inventory.clone(), resolver));
        let config = BuildTriggerConfig {
            url: "https://jenkins.example.com/job/build-ami".to_string(),
            timeout: Duration::from_secs(5),
        };
        let dispatch = Arc::new(BuildDispatchService::new(trigger, &config).unwrap());
        let fleet = Arc::new(FleetReportService::new(inventory));
        CommandController::new(gate, version_sets, dispatch, fleet, observability)
    }

    fn request(text: &str) -> CommandRequest {
        CommandRequest {
            user: "alice".to_string(),
            text: text.to_string(),
        }
    }

    fn query_value(url: &Url, name: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    #[tokio::test]
    async fn test_cut_from_edp_builds_on_destination_image() {
        let trigger = RecordingTrigger::answering(200);
        let controller = controller_with(Arc::new(AllowAllGate), trigger.clone()).await;

        let reply = controller
            .handle(request("cut ami for stage-edx-edxapp from prod-edx-edxapp with a_version=9"))
            .await;

        assert!(reply.ok, "{:?}", reply.lines);
        assert!(reply.build_triggered);
        let calls = trigger.calls();
        assert_eq!(calls.len(), 1);
        let url = &calls[0];
        assert_eq!(query_value(url, "environment").as_deref(), Some("stage"));
        assert_eq!(query_value(url, "base_ami").as_deref(), Some("ami-42"));
        assert_eq!(query_value(url, "use_blessed").as_deref(), Some("false"));
        assert_eq!(query_value(url, "configuration").as_deref(), Some("abc"));
        let vars = amicut_core::tags::parse_vars(&query_value(url, "vars").unwrap()).unwrap();
        assert_eq!(vars.as_map().get("a_version").map(String::as_str), Some("9"));
        assert_eq!(vars.as_map().get("A_VERSION").map(String::as_str), Some("9"));
    }

    #[tokio::test]
    async fn test_noop_renders_request_without_calling_trigger() {
        let trigger = RecordingTrigger::answering(200);
        let controller = controller_with(Arc::new(AllowAllGate), trigger.clone()).await;

        let reply = controller.handle(request("noop cut ami for stage-edx-edxapp")).await;

        assert!(reply.ok);
        assert!(!reply.build_triggered);
        assert!(trigger.calls().is_empty());
        assert_eq!(reply.lines[0], GATHERING_NOTE);
        let preview = reply.lines.last().unwrap();
        assert!(preview.starts_with("Would have posted: POST https://jenkins.example.com/job/build-ami?"));
        assert!(preview.ends_with("use_blessed=true"));
    }

    #[tokio::test]
    async fn test_ambiguous_source_blocks_dispatch() {
        let trigger = RecordingTrigger::answering(200);
        let controller = controller_with(Arc::new(AllowAllGate), trigger.clone()).await;

        let reply = controller
            .handle(request("cut ami for stage-edx-edxapp from prod-edx-forum"))
            .await;

        assert!(!reply.ok);
        assert_eq!(reply.error_code.as_deref(), Some("AMBIGUOUS_LIVE_IMAGE"));
        assert!(reply.lines.last().unwrap().contains("ami-1, ami-2"));
        assert!(trigger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_override_rejected_without_dispatch() {
        let trigger = RecordingTrigger::answering(200);
        let controller = controller_with(Arc::new(AllowAllGate), trigger.clone()).await;

        let reply = controller
            .handle(request("cut ami for stage-edx-edxapp with a=1 =2"))
            .await;

        assert_eq!(reply.error_code.as_deref(), Some("MALFORMED_OVERRIDE"));
        assert!(trigger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_trigger_keeps_resolved_lines() {
        let trigger = RecordingTrigger::answering(500);
        let controller = controller_with(Arc::new(AllowAllGate), trigger.clone()).await;

        let reply = controller
            .handle(request("verbose cut ami for stage-edx-edxapp from ami-7"))
            .await;

        assert!(!reply.ok);
        assert!(!reply.build_triggered);
        assert_eq!(reply.error_code.as_deref(), Some("DISPATCH_FAILURE"));
        assert!(reply.lines.iter().any(|l| l == "Building ami for stage-edx-edxapp"));
        assert!(reply.lines.iter().any(|l| l == "With base ami: ami-7"));
        assert_eq!(trigger.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_permission_denied_before_any_work() {
        let trigger = RecordingTrigger::answering(200);
        let gate = Arc::new(StaticPermissionGate::new(["bob"]));
        let controller = controller_with(gate, trigger.clone()).await;

        let reply = controller.handle(request("cut ami for stage-edx-edxapp")).await;

        assert_eq!(reply.error_code.as_deref(), Some("PERMISSION_DENIED"));
        assert!(reply.lines.iter().all(|l| l != GATHERING_NOTE));
        assert!(trigger.calls().is_empty());

        let help = controller.handle(request("help")).await;
        assert!(help.ok);
    }

    #[tokio::test]
    async fn test_show_commands_render_reports() {
        let controller =
            controller_with(Arc::new(AllowAllGate), RecordingTrigger::answering(200)).await;

        let plays = controller.handle(request("show prod-edx")).await;
        assert_eq!(plays.lines, vec!["Active Plays\n------------\nedxapp\nforum"]);

        let edp = controller.handle(request("show prod-edx-edxapp")).await;
        assert!(edp.ok);
        assert!(edp.lines[0].contains("i-prod.ec2.internal"));
        assert!(edp.lines[0].contains("edx-lb"));

        let tags = controller.handle(request("show edx ami-42")).await;
        assert_eq!(tags.lines, vec!["version:configuration: repo old"]);
    }

    #[tokio::test]
    async fn test_unparseable_command_is_invalid() {
        let controller =
            controller_with(Arc::new(AllowAllGate), RecordingTrigger::answering(200)).await;

        let reply = controller.handle(request("launch the rockets")).await;
        assert_eq!(reply.error_code.as_deref(), Some("INVALID_COMMAND"));
    }

    #[tokio::test]
    async fn test_metrics_follow_commands() {
        let controller =
            controller_with(Arc::new(AllowAllGate), RecordingTrigger::answering(200)).await;

        controller.handle(request("noop cut ami for stage-edx-edxapp from prod-edx-edxapp")).await;

        let rendered = controller.observability().render_metrics().unwrap();
        assert!(rendered.contains("amicut_edp_resolution_total{outcome=\"found\"} 2"));
        assert!(rendered.contains("amicut_build_dispatch_total{outcome=\"previewed\"} 1"));
        assert!(rendered.contains("command=\"cut_ami\",status=\"ok\""));
    }
}
