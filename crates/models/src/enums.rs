//! Domain enums persisted as short lowercase strings.
//!
//! Columns stay plain `String` in the entities; these types are the
//! checked view used by validation and the service layer.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name { $($variant),+ }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self { $($name::$variant => $text),+ }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(ModelError::Validation(format!(
                        concat!("invalid ", stringify!($name), ": {}"), other
                    ))),
                }
            }
        }
    };
}

string_enum!(
    /// Application role; approvers review claims, admins manage everything.
    Role { Staff => "staff", Approver => "approver", Admin => "admin" }
);

string_enum!(VehicleType { Standard => "standard", Electric => "electric" });

string_enum!(ChargerType { Home => "home", Public => "public" });

string_enum!(
    /// Where a user record came from.
    SyncSource { Local => "local", Microsoft => "microsoft", Both => "both" }
);

string_enum!(UserStatus { Active => "active", Inactive => "inactive" });

string_enum!(
    /// Review workflow of an expense claim.
    ClaimStatus {
        Draft => "draft",
        Submitted => "submitted",
        Approved => "approved",
        Rejected => "rejected",
    }
);

string_enum!(
    /// Accounting sync state of an approved claim.
    XeroSyncStatus {
        Pending => "pending",
        Syncing => "syncing",
        Synced => "synced",
        Failed => "failed",
    }
);

string_enum!(
    SyncLogStatus {
        Running => "running",
        Success => "success",
        Failed => "failed",
        Partial => "partial",
    }
);

string_enum!(SyncType { Full => "full", Incremental => "incremental", Manual => "manual" });

string_enum!(
    /// Directory sync health on the tenant config row.
    TenantSyncStatus { Pending => "pending", Active => "active", Failed => "failed" }
);

string_enum!(
    TemplateType {
        ClaimSubmitted => "claim_submitted",
        ClaimApproved => "claim_approved",
        ClaimRejected => "claim_rejected",
    }
);

impl Role {
    /// Approvers and admins may review claims.
    pub fn can_review(&self) -> bool {
        matches!(self, Role::Approver | Role::Admin)
    }
}

impl ClaimStatus {
    pub fn can_transition_to(&self, next: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (self, next),
            (Draft, Submitted) | (Submitted, Approved) | (Submitted, Rejected) | (Rejected, Draft)
        )
    }

    pub fn is_editable(&self) -> bool {
        *self == ClaimStatus::Draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Approver".parse::<Role>().unwrap(), Role::Approver);
        assert_eq!(" electric ".parse::<VehicleType>().unwrap(), VehicleType::Electric);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn claim_transitions() {
        use ClaimStatus::*;
        assert!(Draft.can_transition_to(Submitted));
        assert!(Submitted.can_transition_to(Approved));
        assert!(Submitted.can_transition_to(Rejected));
        assert!(Rejected.can_transition_to(Draft));

        assert!(!Draft.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Draft));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Submitted.can_transition_to(Draft));
        for s in ClaimStatus::ALL {
            assert!(!s.can_transition_to(*s));
        }
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&TemplateType::ClaimSubmitted).unwrap();
        assert_eq!(json, "\"claim_submitted\"");
        let back: XeroSyncStatus = serde_json::from_str("\"syncing\"").unwrap();
        assert_eq!(back, XeroSyncStatus::Syncing);
    }

    #[test]
    fn only_approver_and_admin_review() {
        assert!(!Role::Staff.can_review());
        assert!(Role::Approver.can_review());
        assert!(Role::Admin.can_review());
    }
}
