//! Notification registry and action classification
//!
//! Every notification code maps to exactly one severity and one
//! `(resource, action bucket)` pair. The registry is closed: an unknown
//! numeric code is rejected when it crosses the serde boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::EngineError;
use crate::models::{RecommendationConfig, ResourceKind, ResourceSetting};
use crate::summary::ActionSummary;

/// Notification severity, derived from the code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Notice,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Notice => write!(f, "notice"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Resource an action bucket refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionResource {
    Cpu,
    Memory,
    General,
}

/// Outcome class a resource's sizing is sorted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionBucket {
    Optimizable,
    Idle,
    Optimized,
    Critical,
    Error,
    Info,
    /// Union of the other buckets, maintained by `ActionSummary`
    Total,
}

impl fmt::Display for ActionBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionBucket::Optimizable => "optimizable",
            ActionBucket::Idle => "idle",
            ActionBucket::Optimized => "optimized",
            ActionBucket::Critical => "critical",
            ActionBucket::Error => "error",
            ActionBucket::Info => "info",
            ActionBucket::Total => "total",
        };
        f.write_str(name)
    }
}

/// Closed registry of notification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum NotificationCode {
    InfoNotEnoughData,
    ErrorAmountMissingInCpuSection,
    ErrorInvalidAmountInCpuSection,
    ErrorFormatMissingInCpuSection,
    ErrorInvalidFormatInCpuSection,
    ErrorAmountMissingInMemorySection,
    ErrorInvalidAmountInMemorySection,
    ErrorFormatMissingInMemorySection,
    ErrorInvalidFormatInMemorySection,
    ErrorNumPodsCannotBeZero,
    ErrorNumPodsCannotBeNegative,
    ErrorHoursCannotBeNegative,
    NoticeCpuRecordsAreIdle,
    NoticeCpuRecordsAreZero,
    NoticeCpuRequestsOptimised,
    NoticeCpuLimitsOptimised,
    NoticeMemoryRequestsOptimised,
    NoticeMemoryLimitsOptimised,
    WarningCpuLimitNotSet,
    CriticalCpuRequestNotSet,
    CriticalMemoryRequestNotSet,
    CriticalMemoryLimitNotSet,
}

impl NotificationCode {
    pub const ALL: [NotificationCode; 22] = [
        NotificationCode::InfoNotEnoughData,
        NotificationCode::ErrorAmountMissingInCpuSection,
        NotificationCode::ErrorInvalidAmountInCpuSection,
        NotificationCode::ErrorFormatMissingInCpuSection,
        NotificationCode::ErrorInvalidFormatInCpuSection,
        NotificationCode::ErrorAmountMissingInMemorySection,
        NotificationCode::ErrorInvalidAmountInMemorySection,
        NotificationCode::ErrorFormatMissingInMemorySection,
        NotificationCode::ErrorInvalidFormatInMemorySection,
        NotificationCode::ErrorNumPodsCannotBeZero,
        NotificationCode::ErrorNumPodsCannotBeNegative,
        NotificationCode::ErrorHoursCannotBeNegative,
        NotificationCode::NoticeCpuRecordsAreIdle,
        NotificationCode::NoticeCpuRecordsAreZero,
        NotificationCode::NoticeCpuRequestsOptimised,
        NotificationCode::NoticeCpuLimitsOptimised,
        NotificationCode::NoticeMemoryRequestsOptimised,
        NotificationCode::NoticeMemoryLimitsOptimised,
        NotificationCode::WarningCpuLimitNotSet,
        NotificationCode::CriticalCpuRequestNotSet,
        NotificationCode::CriticalMemoryRequestNotSet,
        NotificationCode::CriticalMemoryLimitNotSet,
    ];

    /// Numeric wire code; the leading digit encodes the severity
    pub fn code(self) -> u32 {
        use NotificationCode::*;
        match self {
            InfoNotEnoughData => 120001,
            ErrorAmountMissingInCpuSection => 221001,
            ErrorInvalidAmountInCpuSection => 221002,
            ErrorFormatMissingInCpuSection => 221003,
            ErrorInvalidFormatInCpuSection => 221004,
            ErrorAmountMissingInMemorySection => 221005,
            ErrorInvalidAmountInMemorySection => 221006,
            ErrorFormatMissingInMemorySection => 221007,
            ErrorInvalidFormatInMemorySection => 221008,
            ErrorNumPodsCannotBeZero => 229001,
            ErrorNumPodsCannotBeNegative => 229002,
            ErrorHoursCannotBeNegative => 229003,
            NoticeCpuRecordsAreIdle => 323001,
            NoticeCpuRecordsAreZero => 323002,
            NoticeCpuRequestsOptimised => 323004,
            NoticeCpuLimitsOptimised => 323005,
            NoticeMemoryRequestsOptimised => 324003,
            NoticeMemoryLimitsOptimised => 324004,
            WarningCpuLimitNotSet => 423001,
            CriticalCpuRequestNotSet => 523001,
            CriticalMemoryRequestNotSet => 524001,
            CriticalMemoryLimitNotSet => 524002,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    pub fn severity(self) -> Severity {
        use NotificationCode::*;
        match self {
            InfoNotEnoughData => Severity::Info,
            ErrorAmountMissingInCpuSection
            | ErrorInvalidAmountInCpuSection
            | ErrorFormatMissingInCpuSection
            | ErrorInvalidFormatInCpuSection
            | ErrorAmountMissingInMemorySection
            | ErrorInvalidAmountInMemorySection
            | ErrorFormatMissingInMemorySection
            | ErrorInvalidFormatInMemorySection
            | ErrorNumPodsCannotBeZero
            | ErrorNumPodsCannotBeNegative
            | ErrorHoursCannotBeNegative => Severity::Error,
            NoticeCpuRecordsAreIdle
            | NoticeCpuRecordsAreZero
            | NoticeCpuRequestsOptimised
            | NoticeCpuLimitsOptimised
            | NoticeMemoryRequestsOptimised
            | NoticeMemoryLimitsOptimised => Severity::Notice,
            WarningCpuLimitNotSet => Severity::Warning,
            CriticalCpuRequestNotSet | CriticalMemoryRequestNotSet | CriticalMemoryLimitNotSet => {
                Severity::Critical
            }
        }
    }

    pub fn message(self) -> &'static str {
        use NotificationCode::*;
        match self {
            InfoNotEnoughData => "There is not enough data available to generate a recommendation.",
            ErrorAmountMissingInCpuSection => "Amount field is missing in the CPU Section",
            ErrorInvalidAmountInCpuSection => "Invalid Amount in CPU Section",
            ErrorFormatMissingInCpuSection => "Format field is missing in CPU Section",
            ErrorInvalidFormatInCpuSection => "Invalid Format in CPU Section",
            ErrorAmountMissingInMemorySection => "Amount field is missing in the Memory Section",
            ErrorInvalidAmountInMemorySection => "Invalid Amount in Memory Section",
            ErrorFormatMissingInMemorySection => "Format field is missing in Memory Section",
            ErrorInvalidFormatInMemorySection => "Invalid Format in Memory Section",
            ErrorNumPodsCannotBeZero => "Number of pods cannot be zero",
            ErrorNumPodsCannotBeNegative => "Number of pods cannot be negative",
            ErrorHoursCannotBeNegative => "Duration hours cannot be negative",
            NoticeCpuRecordsAreIdle => "CPU Usage is less than a millicore, No CPU Recommendations can be generated",
            NoticeCpuRecordsAreZero => "CPU usage is zero, No CPU Recommendations can be generated",
            NoticeCpuRequestsOptimised => "CPU Requests Optimised",
            NoticeCpuLimitsOptimised => "CPU Limits Optimised",
            NoticeMemoryRequestsOptimised => "Memory Requests Optimised",
            NoticeMemoryLimitsOptimised => "Memory Limits Optimised",
            WarningCpuLimitNotSet => "CPU Limit Not Set",
            CriticalCpuRequestNotSet => "CPU Request Not Set",
            CriticalMemoryRequestNotSet => "Memory Request Not Set",
            CriticalMemoryLimitNotSet => "Memory Limit Not Set",
        }
    }

    /// Resource and action bucket this code sorts a workload into
    pub fn action(self) -> (ActionResource, ActionBucket) {
        use NotificationCode::*;
        match self {
            InfoNotEnoughData => (ActionResource::General, ActionBucket::Info),
            ErrorAmountMissingInCpuSection
            | ErrorInvalidAmountInCpuSection
            | ErrorFormatMissingInCpuSection
            | ErrorInvalidFormatInCpuSection => (ActionResource::Cpu, ActionBucket::Error),
            ErrorAmountMissingInMemorySection
            | ErrorInvalidAmountInMemorySection
            | ErrorFormatMissingInMemorySection
            | ErrorInvalidFormatInMemorySection => (ActionResource::Memory, ActionBucket::Error),
            ErrorNumPodsCannotBeZero | ErrorNumPodsCannotBeNegative | ErrorHoursCannotBeNegative => {
                (ActionResource::General, ActionBucket::Error)
            }
            NoticeCpuRecordsAreIdle | NoticeCpuRecordsAreZero => {
                (ActionResource::Cpu, ActionBucket::Idle)
            }
            NoticeCpuRequestsOptimised | NoticeCpuLimitsOptimised => {
                (ActionResource::Cpu, ActionBucket::Optimized)
            }
            NoticeMemoryRequestsOptimised | NoticeMemoryLimitsOptimised => {
                (ActionResource::Memory, ActionBucket::Optimized)
            }
            WarningCpuLimitNotSet => (ActionResource::Cpu, ActionBucket::Optimizable),
            CriticalCpuRequestNotSet => (ActionResource::Cpu, ActionBucket::Critical),
            CriticalMemoryRequestNotSet | CriticalMemoryLimitNotSet => {
                (ActionResource::Memory, ActionBucket::Critical)
            }
        }
    }
}

impl From<NotificationCode> for u32 {
    fn from(code: NotificationCode) -> Self {
        code.code()
    }
}

impl TryFrom<u32> for NotificationCode {
    type Error = EngineError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        NotificationCode::from_code(code).ok_or(EngineError::UnknownNotificationCode(code))
    }
}

/// A notification attached to a recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationNotification {
    pub code: NotificationCode,
    #[serde(rename = "type")]
    pub severity: Severity,
    pub message: String,
}

impl RecommendationNotification {
    pub fn new(code: NotificationCode) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: code.message().to_string(),
        }
    }
}

fn is_nonzero(amount: Option<f64>) -> bool {
    amount.map(|a| a != 0.0).unwrap_or(false)
}

/// Sort one recommendation's notifications into action buckets
///
/// `config` should already be defaulted. A recommendation without
/// notifications but with sizing data is optimizable. Once a notification
/// lands on cpu or memory, the other resource falls back to optimizable.
pub fn classify_actions(
    notifications: &BTreeMap<NotificationCode, RecommendationNotification>,
    config: &RecommendationConfig,
    workload_name: &str,
) -> ActionSummary {
    let mut summary = ActionSummary::new();

    if notifications.is_empty() {
        if is_nonzero(config.amount(ResourceSetting::Requests, ResourceKind::Cpu)) {
            summary.record(ActionBucket::Optimizable, ActionResource::Cpu, workload_name);
            if is_nonzero(config.amount(ResourceSetting::Requests, ResourceKind::Memory)) {
                summary.record(ActionBucket::Optimizable, ActionResource::Memory, workload_name);
            }
        }
        return summary;
    }

    for code in notifications.keys() {
        let (resource, bucket) = code.action();
        summary.record(bucket, resource, workload_name);
    }

    match (
        summary.has_assignment(ActionResource::Cpu),
        summary.has_assignment(ActionResource::Memory),
    ) {
        (true, false) => {
            summary.record(ActionBucket::Optimizable, ActionResource::Memory, workload_name)
        }
        (false, true) => {
            summary.record(ActionBucket::Optimizable, ActionResource::Cpu, workload_name)
        }
        _ => {}
    }

    summary
}
