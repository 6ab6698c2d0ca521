// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conference room naming.

use chrono::Utc;

/// Generate a conference room name for a claimed rep.
///
/// The name must be unique per claim so a stale lead from an earlier call
/// can never land in the rep's new conference; the millisecond timestamp
/// provides that within a single rep's claim cadence.
pub fn conference_name(org_id: &str, rep_id: &str) -> String {
    format!("turbo-{org_id}-{rep_id}-{}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_embeds_org_and_rep() {
        let name = conference_name("org-1", "rep-7");
        assert!(name.starts_with("turbo-org-1-rep-7-"));
    }
}
