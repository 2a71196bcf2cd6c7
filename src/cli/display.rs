//! Display formatting for CLI output
//!
//! Pure functions that format data for display.

use crate::cluster::{NodeOutcome, NodeRecord, NodeState};

/// Format a simple table with headers and rows
pub fn format_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "No nodes planned.\n".to_string();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let mut output = String::new();

    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            output.push_str("   ");
        }
        output.push_str(&format!(
            "{:width$}",
            header.to_uppercase(),
            width = widths[i]
        ));
    }
    output.push('\n');

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                output.push_str("   ");
            }
            if i < widths.len() {
                output.push_str(&format!("{:width$}", cell, width = widths[i]));
            } else {
                output.push_str(cell);
            }
        }
        output.push('\n');
    }

    output
}

/// Format the planned topology for `vmfleet plan`
pub fn format_plan(records: &[NodeRecord]) -> String {
    let headers = &["index", "name", "roles", "public", "internal"];
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            vec![
                record.index.to_string(),
                record.name.clone(),
                record.roles.names().join(","),
                record.public_address.clone(),
                record.internal_address.clone(),
            ]
        })
        .collect();

    format_table(headers, rows)
}

/// Format per-node outcomes after a provisioning run
pub fn format_outcomes(outcomes: &[NodeOutcome]) -> String {
    let headers = &["node", "status"];
    let rows: Vec<Vec<String>> = outcomes
        .iter()
        .map(|outcome| {
            let status = match &outcome.state {
                NodeState::Provisioned => "Provisioned".to_string(),
                NodeState::Degraded(step) => format!("Degraded at {step}"),
            };
            vec![outcome.name.clone(), status]
        })
        .collect();

    format_table(headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{NodeRecord, ProvisionStep, RoleSet};

    fn record(index: usize, name: &str) -> NodeRecord {
        NodeRecord {
            index,
            name: name.to_string(),
            roles: if index == 0 {
                RoleSet::control_plane()
            } else {
                RoleSet::worker()
            },
            user: "rke".to_string(),
            public_address: format!("10.0.0.{}", index + 11),
            internal_address: format!("10.1.0.{}", index + 11),
            bindings: vec![],
        }
    }

    #[test]
    fn test_format_plan() {
        let output = format_plan(&[record(0, "node1"), record(1, "node2")]);
        assert!(output.starts_with("INDEX"));
        assert!(output.contains("controlplane,etcd"));
        assert!(output.contains("10.0.0.12"));
    }

    #[test]
    fn test_format_plan_empty() {
        assert_eq!(format_plan(&[]), "No nodes planned.\n");
    }

    #[test]
    fn test_format_outcomes() {
        let outcomes = vec![
            NodeOutcome {
                name: "node1".to_string(),
                state: NodeState::Provisioned,
            },
            NodeOutcome {
                name: "node2".to_string(),
                state: NodeState::Degraded(ProvisionStep::Clone),
            },
        ];
        let output = format_outcomes(&outcomes);
        assert!(output.contains("Provisioned"));
        assert!(output.contains("Degraded at clone"));
    }
}
