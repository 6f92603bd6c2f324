//! Result presentation.
//!
//! Turns a session's state or a [`ScanResult`] into a title, a message, a
//! tone and the follow-up actions the officer may take. Presentation is pure;
//! actions are carried out by
//! [`ScanSession::perform`](crate::session::ScanSession::perform).

use gatepass_core::{ScanDirection, ScanType, VisitorStatus};
use gatepass_storage::{DisplayMessages, MatchedEntity, ScanDetails, ScanResult};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ScanFailure;
use crate::state_machine::ScanLifecycle;

/// Actions offered after a scan settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpAction {
    /// Capture the unknown person or vehicle in the registry.
    Register,
    CheckIn,
    CheckOut,
    /// Reset capture and return to `Idle`.
    TryAgain,
}

impl fmt::Display for FollowUpAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FollowUpAction::Register => "Register",
            FollowUpAction::CheckIn => "Check In",
            FollowUpAction::CheckOut => "Check Out",
            FollowUpAction::TryAgain => "Try Again",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub title: String,
    pub message: String,
    pub tone: Tone,
    /// Extra facts from the decoded payload, one per line.
    pub details: Vec<String>,
    pub actions: Vec<FollowUpAction>,
}

impl Presentation {
    fn new(title: impl Into<String>, message: impl Into<String>, tone: Tone) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            tone,
            details: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Prompt shown while nothing has settled yet.
    pub fn for_state(state: ScanLifecycle, scan_type: ScanType) -> Self {
        match state {
            ScanLifecycle::Idle => Self::new(
                scan_type.log_label(),
                format!("Ready to scan ({})", scan_type.as_str()),
                Tone::Neutral,
            ),
            ScanLifecycle::Scanning => {
                Self::new(scan_type.log_label(), "Scanning...", Tone::Neutral)
            }
            ScanLifecycle::Resolved => Self::new(scan_type.log_label(), "Scan complete", Tone::Success),
            ScanLifecycle::Failed => Self::new(scan_type.log_label(), "Scan failed", Tone::Error),
        }
    }

    /// Presentation of a reconciled scan.
    pub fn for_result(result: &ScanResult) -> Self {
        if let Some(failure) = result.failure {
            return Self::for_failure(failure.into(), &result.message);
        }

        let (title, tone) = if result.not_pre_registered {
            (not_registered_title(result.scan_type), Tone::Warning)
        } else {
            (recorded_title(result.direction), Tone::Success)
        };

        let mut presentation = Self::new(title, result.message.clone(), tone);
        if let Some(details) = &result.details {
            presentation.details = detail_lines(details);
        }
        if let Some(entity) = &result.matched_entity {
            presentation.details.push(entity_line(entity));
        }
        presentation.actions = available_actions(result);
        presentation
    }

    /// Presentation of a scan that ended in `Failed`.
    pub fn for_failure(failure: ScanFailure, message: &str) -> Self {
        let title = match failure {
            ScanFailure::Lookup => DisplayMessages::SCAN_ERROR,
            ScanFailure::Device | ScanFailure::Recognition => DisplayMessages::SCANNER_ERROR,
        };

        let mut presentation = Self::new(title, message, Tone::Error);
        presentation.actions = vec![FollowUpAction::TryAgain];
        presentation
    }

    pub fn offers(&self, action: FollowUpAction) -> bool {
        self.actions.contains(&action)
    }
}

/// Follow-up actions that apply to a result.
///
/// ```
/// # use gatepass_scanner::presenter::{available_actions, FollowUpAction};
/// # use gatepass_storage::ScanResult;
/// # fn check(result: &ScanResult) {
/// if result.is_failure() {
///     assert_eq!(available_actions(result), vec![FollowUpAction::TryAgain]);
/// }
/// # }
/// ```
pub fn available_actions(result: &ScanResult) -> Vec<FollowUpAction> {
    if result.is_failure() {
        return vec![FollowUpAction::TryAgain];
    }

    let mut actions = Vec::new();
    if result.not_pre_registered {
        actions.push(FollowUpAction::Register);
    }

    if let Some(status) = result
        .matched_entity
        .as_ref()
        .and_then(MatchedEntity::visitor_status)
    {
        match result.direction {
            ScanDirection::Ingress if status != VisitorStatus::Active => {
                actions.push(FollowUpAction::CheckIn)
            }
            ScanDirection::Egress if status != VisitorStatus::Completed => {
                actions.push(FollowUpAction::CheckOut)
            }
            _ => {}
        }
    }

    actions
}

fn recorded_title(direction: ScanDirection) -> &'static str {
    if direction.is_ingress() {
        DisplayMessages::ENTRY_RECORDED
    } else {
        DisplayMessages::EXIT_RECORDED
    }
}

fn not_registered_title(scan_type: ScanType) -> &'static str {
    match scan_type {
        ScanType::Anpr => DisplayMessages::UNREGISTERED,
        ScanType::IdDocument | ScanType::VehicleDisk => "Not Pre-Registered",
    }
}

fn detail_lines(details: &ScanDetails) -> Vec<String> {
    let mut lines = Vec::new();
    match details {
        ScanDetails::Id { document, .. } => {
            lines.push(format!("ID: {}", document.id_number));
            if let Some(dob) = document.date_of_birth {
                lines.push(format!("Date of birth: {dob}"));
            }
            if document.checksum_valid == Some(false) {
                lines.push("Checksum: invalid".to_string());
            }
        }
        ScanDetails::VehicleDisk { disk } => {
            lines.push(format!("Registration: {}", disk.registration));
            let vehicle: Vec<&str> = [disk.make.as_deref(), disk.model.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if !vehicle.is_empty() {
                lines.push(format!("Vehicle: {}", vehicle.join(" ")));
            }
            if let Some(colour) = &disk.colour {
                lines.push(format!("Colour: {colour}"));
            }
            if let Some(expiry) = disk.expiry_date {
                lines.push(format!("Disk expires: {expiry}"));
            }
        }
        ScanDetails::Anpr { plate, .. } => lines.push(format!("Plate: {plate}")),
    }
    lines
}

fn entity_line(entity: &MatchedEntity) -> String {
    match entity {
        MatchedEntity::Visitor {
            full_name, status, ..
        } => format!("Visitor: {full_name} ({})", status.as_str()),
        MatchedEntity::Resident {
            full_name,
            unit_number,
            ..
        } => match unit_number {
            Some(unit) => format!("Resident: {full_name}, unit {unit}"),
            None => format!("Resident: {full_name}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gatepass_core::VehicleRegistration;
    use gatepass_storage::ReconcileFailure;
    use rstest::rstest;

    fn result(direction: ScanDirection) -> ScanResult {
        ScanResult {
            success: true,
            message: "Plate ABC123GP: Unregistered".to_string(),
            scan_type: ScanType::Anpr,
            direction,
            timestamp: Utc.with_ymd_and_hms(2026, 10, 19, 7, 45, 0).unwrap(),
            details: Some(ScanDetails::Anpr {
                plate: VehicleRegistration::new("ABC123GP").unwrap(),
                registered: false,
            }),
            matched_entity: None,
            not_pre_registered: true,
            failure: None,
        }
    }

    fn visitor(status: VisitorStatus) -> MatchedEntity {
        MatchedEntity::Visitor {
            id: "v-1".to_string(),
            full_name: "Jane Doe".to_string(),
            status,
        }
    }

    #[test]
    fn test_unregistered_offers_register_only() {
        let presentation = Presentation::for_result(&result(ScanDirection::Ingress));

        assert_eq!(presentation.title, "Unregistered");
        assert_eq!(presentation.tone, Tone::Warning);
        assert_eq!(presentation.actions, vec![FollowUpAction::Register]);
        assert_eq!(presentation.details, vec!["Plate: ABC123GP".to_string()]);
    }

    #[rstest]
    #[case(ScanDirection::Ingress, VisitorStatus::Approved, vec![FollowUpAction::CheckIn])]
    #[case(ScanDirection::Ingress, VisitorStatus::Active, vec![])]
    #[case(ScanDirection::Egress, VisitorStatus::Active, vec![FollowUpAction::CheckOut])]
    #[case(ScanDirection::Egress, VisitorStatus::Completed, vec![])]
    fn test_visitor_actions_follow_direction(
        #[case] direction: ScanDirection,
        #[case] status: VisitorStatus,
        #[case] expected: Vec<FollowUpAction>,
    ) {
        let mut scan = result(direction);
        scan.not_pre_registered = false;
        scan.matched_entity = Some(visitor(status));

        assert_eq!(available_actions(&scan), expected);
    }

    #[test]
    fn test_resident_match_has_no_actions() {
        let mut scan = result(ScanDirection::Egress);
        scan.not_pre_registered = false;
        scan.matched_entity = Some(MatchedEntity::Resident {
            id: "r-1".to_string(),
            full_name: "Sipho Dlamini".to_string(),
            unit_number: Some("12".to_string()),
        });

        let presentation = Presentation::for_result(&scan);
        assert_eq!(presentation.title, "Exit Recorded");
        assert!(presentation.actions.is_empty());
        assert_eq!(
            presentation.details.last().map(String::as_str),
            Some("Resident: Sipho Dlamini, unit 12")
        );
    }

    #[rstest]
    #[case(ReconcileFailure::Lookup, "Scan Error")]
    #[case(ReconcileFailure::Recognition, "Scanner Error")]
    fn test_failures_offer_try_again(#[case] failure: ReconcileFailure, #[case] title: &str) {
        let mut scan = result(ScanDirection::Ingress);
        scan.success = false;
        scan.not_pre_registered = false;
        scan.failure = Some(failure);

        let presentation = Presentation::for_result(&scan);
        assert_eq!(presentation.title, title);
        assert_eq!(presentation.tone, Tone::Error);
        assert_eq!(presentation.actions, vec![FollowUpAction::TryAgain]);
    }

    #[test]
    fn test_device_failure() {
        let presentation = Presentation::for_failure(ScanFailure::Device, "Permission denied: camera");
        assert_eq!(presentation.title, "Scanner Error");
        assert!(presentation.offers(FollowUpAction::TryAgain));
    }

    #[test]
    fn test_state_prompts() {
        let idle = Presentation::for_state(ScanLifecycle::Idle, ScanType::VehicleDisk);
        assert_eq!(idle.title, "Disk Scan");
        assert_eq!(idle.message, "Ready to scan (vehicle-disk)");

        let scanning = Presentation::for_state(ScanLifecycle::Scanning, ScanType::Anpr);
        assert_eq!(scanning.message, "Scanning...");
        assert!(scanning.actions.is_empty());
    }
}
