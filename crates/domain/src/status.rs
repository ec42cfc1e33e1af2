//! Report statuses, categories and the vote/reaction choices users can make.
//!
//! Every enum here travels over the wire as its `SCREAMING_SNAKE_CASE` name and,
//! with the `sea-orm` feature, is stored in the database under the same string.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "sea-orm")]
use sea_orm::entity::prelude::StringLen;

/// Error returned when parsing an unknown enum name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal, $db_type:tt {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:tt, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[cfg_attr(feature = "sea-orm", derive(sea_orm::EnumIter, sea_orm::DeriveActiveEnum))]
        #[cfg_attr(feature = "sea-orm", sea_orm(rs_type = "String", db_type = $db_type))]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                #[cfg_attr(feature = "sea-orm", sea_orm(string_value = $wire))]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire and storage name.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

wire_enum! {
    /// Lifecycle status of a report.
    ReportStatus, "report status", "String(StringLen::N(32))" {
        /// Filed, no progress yet.
        Waiting => "WAITING",
        /// Work is underway.
        OnProgress => "ON_PROGRESS",
        /// The community believes it is fixed; awaiting owner confirmation.
        PotentiallyResolved => "POTENTIALLY_RESOLVED",
        /// Terminal.
        Resolved => "RESOLVED",
        /// Reported as not fixed.
        NotResolved => "NOT_RESOLVED",
        /// No owner follow-up within the expiry window.
        Expired => "EXPIRED",
    }
}

impl Default for ReportStatus {
    fn default() -> Self {
        Self::Waiting
    }
}

impl ReportStatus {
    /// Whether community votes may still be cast.
    #[must_use]
    pub const fn accepts_votes(&self) -> bool {
        !matches!(self, Self::Resolved | Self::Expired)
    }

    /// Whether the owner may still delete the report.
    #[must_use]
    pub const fn is_deletable(&self) -> bool {
        !matches!(self, Self::Resolved | Self::Expired)
    }

    /// Whether no further transitions can happen.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

wire_enum! {
    /// Category of a civic issue.
    ReportType, "report type", "String(StringLen::N(32))" {
        Infrastructure => "INFRASTRUCTURE",
        Environment => "ENVIRONMENT",
        Safety => "SAFETY",
        Traffic => "TRAFFIC",
        PublicFacility => "PUBLIC_FACILITY",
        Waste => "WASTE",
        Water => "WATER",
        Electricity => "ELECTRICITY",
        Health => "HEALTH",
        Social => "SOCIAL",
        Education => "EDUCATION",
        Administrative => "ADMINISTRATIVE",
        Disaster => "DISASTER",
        Other => "OTHER",
    }
}

wire_enum! {
    /// A resolution opinion.
    ///
    /// Community votes and owner progress updates choose from the same three
    /// outcomes. The declaration order is the tie-break priority used when two
    /// vote buckets hold the same count.
    VoteType, "vote type", "String(StringLen::N(16))" {
        Resolved => "RESOLVED",
        OnProgress => "ON_PROGRESS",
        NotResolved => "NOT_RESOLVED",
    }
}

impl From<VoteType> for ReportStatus {
    fn from(vote: VoteType) -> Self {
        match vote {
            VoteType::Resolved => Self::Resolved,
            VoteType::OnProgress => Self::OnProgress,
            VoteType::NotResolved => Self::NotResolved,
        }
    }
}

wire_enum! {
    /// Like or dislike.
    ReactionType, "reaction type", "String(StringLen::N(16))" {
        Like => "LIKE",
        Dislike => "DISLIKE",
    }
}

wire_enum! {
    /// Who made the most recent status change.
    UpdatedBy, "updater", "String(StringLen::N(16))" {
        /// The report owner, through a progress update.
        Owner => "OWNER",
        /// Vote aggregation or a scheduled sweep.
        System => "SYSTEM",
    }
}
