use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "application_status", rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    Pending,
    Analyzed,
    Reviewed,
    Shortlisted,
    Interviewed,
    Offered,
    Hired,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 9] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Analyzed,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Interviewed,
        ApplicationStatus::Offered,
        ApplicationStatus::Hired,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Analyzed => "ANALYZED",
            ApplicationStatus::Reviewed => "REVIEWED",
            ApplicationStatus::Shortlisted => "SHORTLISTED",
            ApplicationStatus::Interviewed => "INTERVIEWED",
            ApplicationStatus::Offered => "OFFERED",
            ApplicationStatus::Hired => "HIRED",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Withdrawn => "WITHDRAWN",
        }
    }

    /// Terminal statuses have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Hired | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }

    /// The statuses this one may move to through the staff-facing update path.
    /// WITHDRAWN is candidate-initiated outside this engine and is never a
    /// valid target here.
    pub fn allowed_targets(&self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Pending => &[Reviewed, Analyzed, Rejected],
            Reviewed => &[Analyzed, Shortlisted, Interviewed, Rejected],
            Analyzed => &[Reviewed, Shortlisted, Interviewed, Rejected],
            Shortlisted => &[Interviewed, Rejected],
            Interviewed => &[Offered, Rejected],
            Offered => &[Hired, Rejected],
            Hired | Rejected | Withdrawn => &[],
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(ApplicationStatus::Pending),
            "ANALYZED" => Ok(ApplicationStatus::Analyzed),
            "REVIEWED" => Ok(ApplicationStatus::Reviewed),
            "SHORTLISTED" => Ok(ApplicationStatus::Shortlisted),
            "INTERVIEWED" => Ok(ApplicationStatus::Interviewed),
            "OFFERED" => Ok(ApplicationStatus::Offered),
            "HIRED" => Ok(ApplicationStatus::Hired),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            "WITHDRAWN" => Ok(ApplicationStatus::Withdrawn),
            other => Err(Error::Validation(format!(
                "Unknown application status: {}",
                other
            ))),
        }
    }
}

/// Gate for every staff-initiated status change. Same-status requests are a
/// caller concern and are rejected here like any other missing edge.
pub fn validate_transition(
    current: ApplicationStatus,
    requested: ApplicationStatus,
) -> Result<()> {
    if current.allowed_targets().contains(&requested) {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            from: current,
            to: requested,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    fn edge_table() -> Vec<(ApplicationStatus, ApplicationStatus)> {
        vec![
            (Pending, Reviewed),
            (Pending, Analyzed),
            (Pending, Rejected),
            (Reviewed, Analyzed),
            (Reviewed, Shortlisted),
            (Reviewed, Interviewed),
            (Reviewed, Rejected),
            (Analyzed, Reviewed),
            (Analyzed, Shortlisted),
            (Analyzed, Interviewed),
            (Analyzed, Rejected),
            (Shortlisted, Interviewed),
            (Shortlisted, Rejected),
            (Interviewed, Offered),
            (Interviewed, Rejected),
            (Offered, Hired),
            (Offered, Rejected),
        ]
    }

    #[test]
    fn every_listed_edge_is_accepted() {
        for (from, to) in edge_table() {
            assert!(
                validate_transition(from, to).is_ok(),
                "{} -> {} should be allowed",
                from,
                to
            );
        }
    }

    #[test]
    fn every_unlisted_pair_is_rejected() {
        let allowed = edge_table();
        for from in ApplicationStatus::ALL {
            for to in ApplicationStatus::ALL {
                if allowed.contains(&(from, to)) {
                    continue;
                }
                let err = validate_transition(from, to).expect_err(&format!(
                    "{} -> {} should be rejected",
                    from, to
                ));
                match err {
                    Error::InvalidTransition { from: f, to: t } => {
                        assert_eq!(f, from);
                        assert_eq!(t, to);
                    }
                    other => panic!("unexpected error: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        for status in [Hired, Rejected, Withdrawn] {
            assert!(status.is_terminal());
            assert!(status.allowed_targets().is_empty());
        }
    }

    #[test]
    fn same_status_is_never_a_valid_edge() {
        for status in ApplicationStatus::ALL {
            assert!(validate_transition(status, status).is_err());
        }
    }

    #[test]
    fn withdrawn_is_never_a_target() {
        for status in ApplicationStatus::ALL {
            assert!(!status.allowed_targets().contains(&Withdrawn));
        }
    }

    #[test]
    fn rejection_message_names_both_statuses() {
        let err = validate_transition(Hired, Reviewed).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("HIRED"));
        assert!(msg.contains("REVIEWED"));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.as_str().parse::<ApplicationStatus>().unwrap(), status);
        }
    }
}
