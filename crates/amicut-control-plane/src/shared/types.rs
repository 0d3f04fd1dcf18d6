use serde::{Deserialize, Serialize};

pub use amicut_core::command::{BuildSource, Command, CutRequest};
pub use amicut_core::{BuildRequest, Edp, ErrorResponse, Image, Instance, LoadBalancer, VersionSet};

/// A command as forwarded by the chat front end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub user: String,
    pub text: String,
}

/// Reply rendered back to the chat front end.
///
/// `ok` is false whenever the command did not fully succeed. When a build
/// was resolved but the trigger failed, `lines` still carry the resolved
/// request and `build_triggered` stays false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    pub ok: bool,
    pub lines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub build_triggered: bool,
}

impl CommandReply {
    pub fn success(lines: Vec<String>) -> Self {
        Self {
            ok: true,
            lines,
            error_code: None,
            build_triggered: false,
        }
    }

    pub fn failure(mut lines: Vec<String>, error: ErrorResponse) -> Self {
        lines.push(error.message);
        Self {
            ok: false,
            lines,
            error_code: Some(error.error_code),
            build_triggered: false,
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.ok {
            "ok"
        } else {
            "error"
        }
    }
}
