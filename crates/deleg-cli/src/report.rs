// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Human and JSON renderings of command output.

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use deleg_core::{
    Authorization, CallOutcome, Capability, Decision, EventRecord, Labels, RegistryEvent,
};
use serde_json::{json, Value};

use crate::script::{StepReport, StepResult};

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

/// Table of suffixes of `name`, most specific first.
pub fn hierarchy_table(name: &Labels) -> Table {
    let labels: Vec<String> = name
        .iter()
        .map(|l| String::from_utf8_lossy(l).into_owned())
        .collect();
    let mut table = table(&["Offset", "Suffix", "Node"]);
    for (offset, node) in name.hierarchy().suffixes() {
        let suffix = if offset == labels.len() {
            ".".to_owned()
        } else {
            labels[offset..].join(".")
        };
        table.add_row(vec![offset.to_string(), suffix, node.to_string()]);
    }
    table
}

/// Capability table.
pub fn capabilities_table(capabilities: &[Capability]) -> Table {
    let mut table = table(&["Interface", "Capability"]);
    for cap in capabilities {
        table.add_row(vec![cap.id.to_string(), cap.name.to_owned()]);
    }
    table
}

/// Capabilities as JSON.
pub fn capabilities_json(capabilities: &[Capability]) -> Value {
    capabilities
        .iter()
        .map(|cap| json!({ "id": cap.id, "name": cap.name }))
        .collect()
}

fn describe_authorization(auth: &Authorization) -> String {
    match auth.decision {
        Decision::Approved { offset } => {
            format!("approved at {} (offset {offset})", auth.decided_at)
        }
        Decision::Owner => "owner".to_owned(),
        Decision::Denied => "denied".to_owned(),
    }
}

fn describe_result(result: &StepResult) -> String {
    match result {
        StepResult::Written { authorization } => {
            format!("written ({})", describe_authorization(authorization))
        }
        StepResult::Cleared { version } => format!("cleared, version {version}"),
        StepResult::Approval { node, approved } => {
            let verb = if *approved { "granted" } else { "revoked" };
            format!("{verb} at {node}")
        }
        StepResult::Batch { outcomes } => {
            let cleared = outcomes
                .iter()
                .filter(|o| matches!(o, CallOutcome::Cleared { .. }))
                .count();
            format!("batch committed ({} calls, {cleared} clears)", outcomes.len())
        }
        StepResult::Authorization { authorization } => {
            format!("{}: {}", authorization.node, describe_authorization(authorization))
        }
        StepResult::Record { payload, text, .. } => match text {
            Some(text) => format!("{text:?}"),
            None if payload == "0x" => "(unset)".to_owned(),
            None => payload.clone(),
        },
    }
}

/// One row per step.
pub fn steps_table(reports: &[StepReport]) -> Table {
    let mut table = table(&["Step", "Op", "Name", "Status", "Result"]);
    for report in reports {
        let (status, detail) = match &report.outcome {
            Ok(result) => ("ok", describe_result(result)),
            Err(err) => ("failed", err.to_string()),
        };
        table.add_row(vec![
            report.index.to_string(),
            report.op.to_owned(),
            report.name.clone().unwrap_or_default(),
            status.to_owned(),
            detail,
        ]);
    }
    table
}

/// One row per committed event.
pub fn events_table(events: &[EventRecord]) -> Table {
    let mut table = table(&["Tx", "Event", "Node"]);
    for record in events {
        let detail = match &record.event {
            RegistryEvent::Approval {
                operator, approved, ..
            } => format!("approval {operator} = {approved}"),
            RegistryEvent::RecordChanged { kind, payload, .. } => {
                format!("{kind} <- {} bytes", payload.len())
            }
            RegistryEvent::VersionChanged { version, .. } => format!("version {version}"),
            RegistryEvent::TopLevelRegistered { owner, .. } => format!("owner {owner}"),
        };
        table.add_row(vec![
            record.tx.to_string(),
            detail,
            record.event.node().to_string(),
        ]);
    }
    table
}

/// A step as a JSON object.
pub fn step_json(report: &StepReport) -> Value {
    match &report.outcome {
        Ok(result) => json!({
            "step": report.index,
            "op": report.op,
            "name": report.name,
            "ok": true,
            "result": result,
        }),
        Err(err) => json!({
            "step": report.index,
            "op": report.op,
            "name": report.name,
            "ok": false,
            "error": err.to_string(),
        }),
    }
}

/// Full run summary as JSON.
pub fn run_json(reports: &[StepReport], events: &[EventRecord]) -> Value {
    json!({
        "steps": reports.iter().map(step_json).collect::<Vec<_>>(),
        "failed": reports.iter().filter(|r| !r.is_ok()).count(),
        "events": events,
    })
}
