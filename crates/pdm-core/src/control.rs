//! Control protocol between the `pdm` client commands and a running service.
//!
//! One JSON request per line, one JSON response per line. Requests are
//! tagged by `action`; responses always carry `success` and either `error`
//! or the payload fields relevant to the action.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::job::{JobId, JobSnapshot};
use crate::manager::Manager;

/// Whether this platform can terminate a running downloader.
pub const CAN_STOP_DOWNLOAD: bool = cfg!(any(unix, windows));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlRequest {
    Create {
        url: String,
    },
    SetProfile {
        id: JobId,
        profile: String,
        #[serde(default)]
        option: Option<String>,
    },
    Queue {
        id: JobId,
    },
    Start {
        id: JobId,
        profile: String,
        #[serde(default)]
        option: Option<String>,
    },
    Stop {
        id: JobId,
    },
    ChangeDestination {
        id: JobId,
        #[serde(default)]
        destination: Option<String>,
    },
    List,
    Get {
        id: JobId,
    },
    Profiles,
}

/// Names a client can pass to `start` and `destination`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub profiles: Vec<String>,
    pub options: Vec<String>,
    pub destinations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<JobId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<JobSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<Vec<JobSnapshot>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Catalog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_stop: Option<bool>,
}

impl ControlResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn err(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

/// Apply one request to the manager.
pub fn handle_request(manager: &Manager, request: ControlRequest) -> ControlResponse {
    tracing::debug!(?request, "control request");
    let result = match request {
        ControlRequest::Create { url } => {
            let id = manager.create(&url);
            Ok(ControlResponse {
                id: Some(id),
                ..ControlResponse::ok(format!("created download {id}"))
            })
        }
        ControlRequest::SetProfile {
            id,
            profile,
            option,
        } => manager
            .set_profile_and_option(id, &profile, option.as_deref())
            .map(|()| ControlResponse::ok(format!("download {id} will use '{profile}'"))),
        ControlRequest::Queue { id } => manager
            .queue(id)
            .map(|()| ControlResponse::ok(format!("download {id} queued"))),
        ControlRequest::Start {
            id,
            profile,
            option,
        } => manager
            .start(id, &profile, option.as_deref())
            .map(|()| ControlResponse::ok(format!("download {id} queued with '{profile}'"))),
        ControlRequest::Stop { id } => manager
            .stop(id)
            .map(|()| ControlResponse::ok(format!("stopping download {id}"))),
        ControlRequest::ChangeDestination { id, destination } => manager
            .change_destination(id, destination.as_deref())
            .map(|()| {
                ControlResponse::ok(match destination {
                    Some(name) => format!("download {id} will be moved to '{name}'"),
                    None => format!("download {id} will stay in the download directory"),
                })
            }),
        ControlRequest::List => Ok(ControlResponse {
            success: true,
            jobs: Some(manager.snapshot()),
            can_stop: Some(CAN_STOP_DOWNLOAD),
            ..ControlResponse::default()
        }),
        ControlRequest::Get { id } => manager.snapshot_job(id).map(|job| ControlResponse {
            success: true,
            job: Some(job),
            can_stop: Some(CAN_STOP_DOWNLOAD),
            ..ControlResponse::default()
        }),
        ControlRequest::Profiles => {
            let cfg = manager.config();
            Ok(ControlResponse {
                success: true,
                catalog: Some(Catalog {
                    profiles: cfg.profiles.iter().map(|p| p.name.clone()).collect(),
                    options: cfg.download_options.iter().map(|o| o.name.clone()).collect(),
                    destinations: cfg.destinations.iter().map(|d| d.name.clone()).collect(),
                }),
                ..ControlResponse::default()
            })
        }
    };
    result.unwrap_or_else(|e| {
        tracing::debug!("control request rejected: {e}");
        ControlResponse::err(e)
    })
}

/// Decode one request line, apply it, and encode the response line.
pub fn handle_line(manager: &Manager, line: &str) -> String {
    let response = match serde_json::from_str::<ControlRequest>(line) {
        Ok(request) => handle_request(manager, request),
        Err(e) => ControlResponse::err(format!("invalid request: {e}")),
    };
    serde_json::to_string(&response).unwrap_or_else(|e| {
        tracing::warn!("encode control response: {e}");
        r#"{"success":false,"error":"internal encoding error"}"#.to_string()
    })
}

/// Default path for the control socket: `~/.local/state/pdm/control.sock`.
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    let dir = xdg::BaseDirectories::with_prefix("pdm")?.get_state_home();
    Ok(dir.join("control.sock"))
}
