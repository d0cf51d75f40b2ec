//! File name classification.
//!
//! A file name is routed by case-insensitive keyword match against a fixed,
//! ordered rule table. The first matching rule wins, so a name carrying
//! several keywords always resolves the same way.

use thiserror::Error;

/// Where an upload is stored and which topic announces it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingDecision {
    pub folder: &'static str,
    pub topic: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("File name does not contain a valid type identifier.")]
pub struct RoutingRejected {
    pub file_name: String,
}

struct RoutingRule {
    keyword: &'static str,
    decision: RoutingDecision,
}

// Priority order matters.
const ROUTING_RULES: &[RoutingRule] = &[
    RoutingRule {
        keyword: "sessions",
        decision: RoutingDecision {
            folder: "sessions",
            topic: "session_topic",
        },
    },
    RoutingRule {
        keyword: "employee",
        decision: RoutingDecision {
            folder: "employee_files",
            topic: "employee_topic",
        },
    },
    RoutingRule {
        keyword: "client",
        decision: RoutingDecision {
            folder: "client_files",
            topic: "client_topic",
        },
    },
    // Singular form, only reached by names carrying no other keyword
    RoutingRule {
        keyword: "session",
        decision: RoutingDecision {
            folder: "sessions",
            topic: "session_topic",
        },
    },
];

/// Map a declared file name to its storage folder and topic
pub fn classify(file_name: &str) -> Result<RoutingDecision, RoutingRejected> {
    let lowered = file_name.to_lowercase();

    ROUTING_RULES
        .iter()
        .find(|rule| lowered.contains(rule.keyword))
        .map(|rule| rule.decision)
        .ok_or_else(|| RoutingRejected {
            file_name: file_name.to_string(),
        })
}
