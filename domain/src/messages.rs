//! User-facing text and button styling for session status displays.
//!
//! Text is looked up by key from a [`MessageCatalog`] so it can be translated without
//! touching the status logic. [`ArabicCatalog`] holds the texts the academies use today.

use chrono::{DateTime, Utc};
use entity::{session_kind::SessionKind, session_status::SessionStatus};

/// Every status display variant the eligibility engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayKey {
    Ready,
    Ongoing,
    ScheduledJoinable,
    /// Waiting, preparation window opens in the future
    ScheduledOpensIn,
    /// Waiting, preparation window should already have opened
    ScheduledPreparing,
    ScheduledWithoutTime,
    AbsentTeacherJoinable,
    AbsentStudentJoinable,
    AbsentTeacherClosed,
    AbsentStudentRecorded,
    Completed,
    Cancelled,
    Unscheduled,
}

impl DisplayKey {
    pub fn button_style(&self) -> ButtonStyle {
        match self {
            DisplayKey::Ready | DisplayKey::AbsentTeacherJoinable => ButtonStyle::Join,
            DisplayKey::Ongoing => ButtonStyle::JoinOngoing,
            DisplayKey::ScheduledJoinable => ButtonStyle::JoinPreparing,
            DisplayKey::AbsentStudentJoinable => ButtonStyle::JoinAbsent,
            DisplayKey::AbsentStudentRecorded | DisplayKey::Cancelled => ButtonStyle::Blocked,
            DisplayKey::ScheduledOpensIn
            | DisplayKey::ScheduledPreparing
            | DisplayKey::ScheduledWithoutTime
            | DisplayKey::AbsentTeacherClosed
            | DisplayKey::Completed
            | DisplayKey::Unscheduled => ButtonStyle::Disabled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Join,
    JoinOngoing,
    JoinPreparing,
    JoinAbsent,
    Disabled,
    Blocked,
}

impl ButtonStyle {
    pub fn css_class(&self) -> &'static str {
        match self {
            ButtonStyle::Join => "bg-green-600 hover:bg-green-700",
            ButtonStyle::JoinOngoing => "bg-orange-600 hover:bg-orange-700 animate-pulse",
            ButtonStyle::JoinPreparing => "bg-blue-600 hover:bg-blue-700",
            ButtonStyle::JoinAbsent => "bg-yellow-600 hover:bg-yellow-700",
            ButtonStyle::Disabled => "bg-gray-400 cursor-not-allowed",
            ButtonStyle::Blocked => "bg-red-400 cursor-not-allowed",
        }
    }
}

pub trait MessageCatalog: Send + Sync {
    /// `countdown` is only used by [`DisplayKey::ScheduledOpensIn`].
    fn message(&self, key: DisplayKey, countdown: Option<&str>) -> String;
    fn button_text(&self, key: DisplayKey) -> String;
    fn status_label(&self, status: SessionStatus) -> String;
    /// Title shown for sessions that have none of their own.
    fn default_title(&self, kind: SessionKind) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ArabicCatalog;

impl MessageCatalog for ArabicCatalog {
    fn message(&self, key: DisplayKey, countdown: Option<&str>) -> String {
        let text = match key {
            DisplayKey::Ready => "الجلسة جاهزة - يمكنك الانضمام الآن",
            DisplayKey::Ongoing => "الجلسة جارية الآن - انضم للمشاركة",
            DisplayKey::ScheduledJoinable => "جاري تحضير الاجتماع - يمكنك الانضمام الآن",
            DisplayKey::ScheduledOpensIn => {
                return format!("سيتم تحضير الاجتماع خلال {}", countdown.unwrap_or_default())
            }
            DisplayKey::ScheduledPreparing => "جاري تحضير الاجتماع...",
            DisplayKey::ScheduledWithoutTime => "الجلسة محجوزة ولكن لم يتم تحديد موعد",
            DisplayKey::AbsentTeacherJoinable => "الجلسة نشطة - يمكنك بدء أو الانضمام للاجتماع",
            DisplayKey::AbsentStudentJoinable => "تم تسجيل غيابك ولكن يمكنك الانضمام الآن",
            DisplayKey::AbsentTeacherClosed => "انتهت فترة الجلسة",
            DisplayKey::AbsentStudentRecorded => "تم تسجيل غياب الطالب",
            DisplayKey::Completed => "تم إنهاء الجلسة بنجاح",
            DisplayKey::Cancelled => "تم إلغاء الجلسة",
            DisplayKey::Unscheduled => "الجلسة غير مجدولة بعد",
        };
        text.to_string()
    }

    fn button_text(&self, key: DisplayKey) -> String {
        match key {
            DisplayKey::Ready
            | DisplayKey::ScheduledJoinable
            | DisplayKey::AbsentTeacherJoinable => "انضم للجلسة",
            DisplayKey::Ongoing => "انضمام للجلسة الجارية",
            DisplayKey::ScheduledOpensIn
            | DisplayKey::ScheduledPreparing
            | DisplayKey::ScheduledWithoutTime => "في انتظار تحضير الاجتماع",
            DisplayKey::AbsentStudentJoinable => "انضم للجلسة (غائب)",
            DisplayKey::AbsentTeacherClosed | DisplayKey::Completed => "الجلسة منتهية",
            DisplayKey::AbsentStudentRecorded => "غياب الطالب",
            DisplayKey::Cancelled => "الجلسة ملغية",
            DisplayKey::Unscheduled => "في انتظار الجدولة",
        }
        .to_string()
    }

    fn status_label(&self, status: SessionStatus) -> String {
        match status {
            SessionStatus::Unscheduled => "غير مجدولة",
            SessionStatus::Scheduled => "مجدولة",
            SessionStatus::Ready => "جاهزة للبدء",
            SessionStatus::Ongoing => "جارية الآن",
            SessionStatus::Completed => "مكتملة",
            SessionStatus::Cancelled => "ملغية",
            SessionStatus::Absent => "غياب الطالب",
        }
        .to_string()
    }

    fn default_title(&self, kind: SessionKind) -> String {
        match kind {
            SessionKind::Quran => "جلسة قرآنية",
            SessionKind::Academic => "جلسة أكاديمية",
            SessionKind::Interactive => "جلسة تفاعلية",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRemaining {
    pub is_past: bool,
    pub formatted: String,
}

/// Turns the distance to `target` into a human countdown.
pub trait TimeRemainingFormatter: Send + Sync {
    fn format(&self, target: DateTime<Utc>, now: DateTime<Utc>) -> TimeRemaining;
}

/// Countdown in Arabic: minutes below an hour, hours and minutes below a day,
/// days and hours beyond. Partial minutes round up.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArabicTimeRemaining;

impl TimeRemainingFormatter for ArabicTimeRemaining {
    fn format(&self, target: DateTime<Utc>, now: DateTime<Utc>) -> TimeRemaining {
        if target <= now {
            return TimeRemaining {
                is_past: true,
                formatted: String::new(),
            };
        }

        let seconds = (target - now).num_seconds();
        let minutes = (seconds + 59) / 60;
        let (days, hours, minutes) = (minutes / 1440, (minutes % 1440) / 60, minutes % 60);

        let formatted = if days > 0 {
            join_units(days, "يوم", hours, "ساعة")
        } else if hours > 0 {
            join_units(hours, "ساعة", minutes, "دقيقة")
        } else {
            format!("{minutes} دقيقة")
        };

        TimeRemaining {
            is_past: false,
            formatted,
        }
    }
}

fn join_units(major: i64, major_unit: &str, minor: i64, minor_unit: &str) -> String {
    if minor == 0 {
        format!("{major} {major_unit}")
    } else {
        format!("{major} {major_unit} و {minor} {minor_unit}")
    }
}
