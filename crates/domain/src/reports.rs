//! 报表统计
//!
//! 只做计数与百分比推导：按过滤条件筛选记录，按状态/类型/角色分组计数，
//! 计算解决率并按 80 / 60 阈值分档。

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::entities::{
    Announcement, AnnouncementStatus, AnnouncementType, Concern, ConcernPriority, ConcernStatus,
    Department, DepartmentType, User, UserRole,
};
use crate::value_objects::{DepartmentId, Timestamp};

/// 解决率“高”档下限（含）
pub const HIGH_RESOLUTION_THRESHOLD: f64 = 80.0;
/// 解决率“中”档下限（含）
pub const MEDIUM_RESOLUTION_THRESHOLD: f64 = 60.0;

/// 报表种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Announcements,
    Concerns,
    Departments,
    Users,
}

impl ReportKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "announcements" => Some(Self::Announcements),
            "concerns" => Some(Self::Concerns),
            "departments" => Some(Self::Departments),
            "users" => Some(Self::Users),
            _ => None,
        }
    }

    /// 该报表接受的状态过滤值，返回规范写法；不认识的值返回 None
    pub fn status_filter(&self, value: &str) -> Option<&'static str> {
        match self {
            Self::Concerns => value.parse::<ConcernStatus>().ok().map(|s| s.as_str()),
            Self::Announcements => value.parse::<AnnouncementStatus>().ok().map(|s| s.as_str()),
            Self::Departments | Self::Users => match value.trim().to_ascii_lowercase().as_str() {
                "active" => Some(activity_label(true)),
                "inactive" => Some(activity_label(false)),
                _ => None,
            },
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Announcements => "Announcements Report",
            Self::Concerns => "Concerns Report",
            Self::Departments => "Departments Report",
            Self::Users => "Users Report",
        }
    }
}

/// 报表过滤条件，无法解析或为空的值直接忽略
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportFilters {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<String>,
    pub department_id: Option<DepartmentId>,
}

impl ReportFilters {
    pub fn from_query(kind: ReportKind, query: &HashMap<String, String>) -> Self {
        let text = |key: &str| {
            query
                .get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };

        Self {
            date_from: text("date_from")
                .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()),
            date_to: text("date_to")
                .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()),
            status: text("status")
                .and_then(|value| kind.status_filter(value))
                .map(str::to_owned),
            department_id: text("department_id")
                .and_then(|value| value.parse::<uuid::Uuid>().ok())
                .map(DepartmentId::from),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// 日期区间两端均包含
    pub fn includes_date(&self, at: Timestamp) -> bool {
        let day = at.date_naive();
        self.date_from.map_or(true, |from| day >= from)
            && self.date_to.map_or(true, |to| day <= to)
    }

    pub fn matches_status(&self, status: &str) -> bool {
        self.status.as_deref().map_or(true, |wanted| wanted == status)
    }

    pub fn matches_department(&self, department_id: Option<DepartmentId>) -> bool {
        self.department_id
            .map_or(true, |wanted| department_id == Some(wanted))
    }

    /// 过滤条件摘要，只列出实际提供的条件；院系名称由调用方解析
    pub fn summary(&self, department_name: impl Fn(DepartmentId) -> Option<String>) -> Vec<FilterLine> {
        let mut lines = Vec::new();
        if let Some(from) = self.date_from {
            lines.push(FilterLine::new("Date From", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.date_to {
            lines.push(FilterLine::new("Date To", to.format("%Y-%m-%d").to_string()));
        }
        if let Some(status) = &self.status {
            lines.push(FilterLine::new("Status", status.replace('_', " ")));
        }
        if let Some(id) = self.department_id {
            let name = department_name(id).unwrap_or_else(|| id.to_string());
            lines.push(FilterLine::new("Department", name));
        }
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterLine {
    pub label: &'static str,
    pub value: String,
}

impl FilterLine {
    fn new(label: &'static str, value: String) -> Self {
        Self { label, value }
    }
}

/// 分组计数结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tally {
    pub label: &'static str,
    pub count: usize,
    /// 占总数百分比，保留一位小数
    pub percentage: f64,
}

/// 对给定的分组键逐一计数，计数为零的分组也保留
pub fn tally<T>(
    labels: &[&'static str],
    items: &[T],
    key: impl Fn(&T) -> &'static str,
) -> Vec<Tally> {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for item in items {
        *counts.entry(key(item)).or_default() += 1;
    }
    labels
        .iter()
        .map(|label| {
            let count = counts.get(label).copied().unwrap_or(0);
            Tally {
                label: *label,
                count,
                percentage: percentage(count, items.len()),
            }
        })
        .collect()
}

/// `part / total * 100`，保留一位小数；总数为零时为 0
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

/// 解决率分档
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionBucket {
    High,
    Medium,
    Low,
}

impl ResolutionBucket {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= HIGH_RESOLUTION_THRESHOLD {
            Self::High
        } else if rate >= MEDIUM_RESOLUTION_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// 解决率统计
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolution {
    pub total: usize,
    pub resolved: usize,
    pub rate: f64,
    pub bucket: ResolutionBucket,
}

impl Resolution {
    pub fn of<'a>(concerns: impl IntoIterator<Item = &'a Concern>) -> Self {
        let (total, resolved) = concerns.into_iter().fold((0, 0), |(total, resolved), c| {
            (total + 1, resolved + usize::from(c.status.counts_as_resolved()))
        });
        let rate = percentage(resolved, total);
        Self {
            total,
            resolved,
            rate,
            bucket: ResolutionBucket::from_rate(rate),
        }
    }
}

fn labels<T: Copy>(all: &[T], as_str: impl Fn(&T) -> &'static str) -> Vec<&'static str> {
    all.iter().map(as_str).collect()
}

/// 诉求报表
#[derive(Debug, Clone, Serialize)]
pub struct ConcernReport {
    pub filters: ReportFilters,
    pub rows: Vec<Concern>,
    pub by_status: Vec<Tally>,
    pub by_priority: Vec<Tally>,
    pub pending: usize,
    pub resolution: Resolution,
}

impl ConcernReport {
    pub fn build(concerns: Vec<Concern>, filters: ReportFilters) -> Self {
        let mut rows: Vec<Concern> = concerns
            .into_iter()
            .filter(|c| {
                filters.includes_date(c.created_at)
                    && filters.matches_status(c.status.as_str())
                    && filters.matches_department(Some(c.department_id))
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let by_status = tally(
            &labels(ConcernStatus::ALL, ConcernStatus::as_str),
            &rows,
            |c| c.status.as_str(),
        );
        let by_priority = tally(
            &labels(ConcernPriority::ALL, ConcernPriority::as_str),
            &rows,
            |c| c.priority.as_str(),
        );
        let pending = rows
            .iter()
            .filter(|c| c.status == ConcernStatus::Pending)
            .count();
        let resolution = Resolution::of(&rows);

        Self {
            filters,
            rows,
            by_status,
            by_priority,
            pending,
            resolution,
        }
    }
}

/// 公告报表
#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementReport {
    pub filters: ReportFilters,
    pub rows: Vec<Announcement>,
    pub by_status: Vec<Tally>,
    pub by_type: Vec<Tally>,
    pub total_views: u64,
}

impl AnnouncementReport {
    pub fn build(announcements: Vec<Announcement>, filters: ReportFilters) -> Self {
        let mut rows: Vec<Announcement> = announcements
            .into_iter()
            .filter(|a| {
                filters.includes_date(a.created_at)
                    && filters.matches_status(a.status.as_str())
                    && filters.matches_department(a.department_id)
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let by_status = tally(
            &labels(AnnouncementStatus::ALL, AnnouncementStatus::as_str),
            &rows,
            |a| a.status.as_str(),
        );
        let by_type = tally(
            &labels(AnnouncementType::ALL, AnnouncementType::as_str),
            &rows,
            |a| a.announcement_type.as_str(),
        );
        let total_views = rows.iter().map(|a| a.view_count).sum();

        Self {
            filters,
            rows,
            by_status,
            by_type,
            total_views,
        }
    }
}

/// 院系报表中的一行
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentRow {
    pub department: Department,
    pub resolution: Resolution,
}

/// 院系报表
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentReport {
    pub filters: ReportFilters,
    pub rows: Vec<DepartmentRow>,
    pub active: usize,
    pub by_type: Vec<Tally>,
}

impl DepartmentReport {
    /// 状态过滤取值为 `active` / `inactive`；诉求按日期区间计入各院系
    pub fn build(
        departments: Vec<Department>,
        concerns: &[Concern],
        filters: ReportFilters,
    ) -> Self {
        let mut departments: Vec<Department> = departments
            .into_iter()
            .filter(|d| filters.matches_status(activity_label(d.is_active)))
            .filter(|d| filters.matches_department(Some(d.id)))
            .collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name));

        let by_type = tally(
            &labels(DepartmentType::ALL, DepartmentType::as_str),
            &departments,
            |d| d.department_type.as_str(),
        );
        let active = departments.iter().filter(|d| d.is_active).count();

        let rows = departments
            .into_iter()
            .map(|department| {
                let resolution = Resolution::of(concerns.iter().filter(|c| {
                    c.department_id == department.id && filters.includes_date(c.created_at)
                }));
                DepartmentRow {
                    department,
                    resolution,
                }
            })
            .collect();

        Self {
            filters,
            rows,
            active,
            by_type,
        }
    }
}

/// 用户报表
#[derive(Debug, Clone, Serialize)]
pub struct UserReport {
    pub filters: ReportFilters,
    pub rows: Vec<User>,
    pub by_role: Vec<Tally>,
    pub active: usize,
    pub inactive: usize,
}

impl UserReport {
    pub fn build(users: Vec<User>, filters: ReportFilters) -> Self {
        let mut rows: Vec<User> = users
            .into_iter()
            .filter(|u| {
                filters.includes_date(u.created_at)
                    && filters.matches_status(activity_label(u.is_active))
                    && filters.matches_department(u.department_id)
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));

        let by_role = tally(&labels(UserRole::ALL, UserRole::as_str), &rows, |u| {
            u.role.as_str()
        });
        let active = rows.iter().filter(|u| u.is_active).count();
        let inactive = rows.len() - active;

        Self {
            filters,
            rows,
            by_role,
            active,
            inactive,
        }
    }
}

pub fn activity_label(is_active: bool) -> &'static str {
    if is_active {
        "active"
    } else {
        "inactive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{AnnouncementPriority, ConcernType};
    use crate::value_objects::{AnnouncementId, ConcernId, UserId};
    use chrono::{TimeZone, Utc};

    fn concern(department_id: DepartmentId, status: ConcernStatus, day: u32) -> Concern {
        let at = Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap();
        Concern {
            id: ConcernId::generate(),
            reference_number: format!("CN-202601{day:02}-AAAAAA"),
            subject: "s".into(),
            description: "d".into(),
            concern_type: ConcernType::Academic,
            priority: ConcernPriority::Medium,
            status,
            department_id,
            student_id: UserId::generate(),
            assigned_to: None,
            resolved_at: None,
            escalated_at: None,
            escalation_level: 0,
            created_at: at,
            updated_at: at,
        }
    }

    fn announcement(
        department_id: Option<DepartmentId>,
        kind: AnnouncementType,
        status: AnnouncementStatus,
        views: u64,
        day: u32,
    ) -> Announcement {
        let at = Utc.with_ymd_and_hms(2026, 1, day, 9, 0, 0).unwrap();
        Announcement {
            id: AnnouncementId::generate(),
            title: format!("notice {day}"),
            content: "c".into(),
            announcement_type: kind,
            priority: AnnouncementPriority::Medium,
            status,
            department_id,
            author_id: UserId::generate(),
            view_count: views,
            bookmark_count: 0,
            published_at: (status == AnnouncementStatus::Published).then_some(at),
            expires_at: None,
            created_at: at,
        }
    }

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn bucket_thresholds_are_inclusive() {
        assert_eq!(ResolutionBucket::from_rate(80.0), ResolutionBucket::High);
        assert_eq!(ResolutionBucket::from_rate(79.9), ResolutionBucket::Medium);
        assert_eq!(ResolutionBucket::from_rate(60.0), ResolutionBucket::Medium);
        assert_eq!(ResolutionBucket::from_rate(59.9), ResolutionBucket::Low);
        assert_eq!(ResolutionBucket::from_rate(0.0), ResolutionBucket::Low);
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn filters_ignore_blank_and_garbage_values() {
        let query: HashMap<String, String> = [
            ("date_from", "2026-01-02"),
            ("date_to", "not-a-date"),
            ("status", " "),
            ("department_id", "42"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        let filters = ReportFilters::from_query(ReportKind::Concerns, &query);
        assert_eq!(
            filters.date_from,
            Some(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap())
        );
        assert_eq!(filters.date_to, None);
        assert_eq!(filters.status, None);
        assert_eq!(filters.department_id, None);
        assert_eq!(filters.summary(|_| None).len(), 1);
    }

    #[test]
    fn concern_report_counts_and_rate() {
        let dept = DepartmentId::generate();
        let other = DepartmentId::generate();
        let concerns = vec![
            concern(dept, ConcernStatus::Resolved, 1),
            concern(dept, ConcernStatus::Closed, 2),
            concern(dept, ConcernStatus::Pending, 3),
            concern(dept, ConcernStatus::InProgress, 4),
            concern(other, ConcernStatus::Pending, 5),
        ];
        let filters = ReportFilters {
            department_id: Some(dept),
            ..Default::default()
        };

        let report = ConcernReport::build(concerns, filters);
        assert_eq!(report.rows.len(), 4);
        assert_eq!(report.pending, 1);
        assert_eq!(report.resolution.resolved, 2);
        assert_eq!(report.resolution.rate, 50.0);
        assert_eq!(report.resolution.bucket, ResolutionBucket::Low);

        let resolved = report
            .by_status
            .iter()
            .find(|t| t.label == "resolved")
            .unwrap();
        assert_eq!(resolved.count, 1);
        assert_eq!(resolved.percentage, 25.0);
        assert_eq!(report.by_status.len(), ConcernStatus::ALL.len());
        // 最新的排在前面
        assert_eq!(report.rows[0].status, ConcernStatus::InProgress);
    }

    #[test]
    fn date_range_is_inclusive() {
        let dept = DepartmentId::generate();
        let concerns = (1..=5)
            .map(|day| concern(dept, ConcernStatus::Pending, day))
            .collect();
        let filters = ReportFilters {
            date_from: NaiveDate::from_ymd_opt(2026, 1, 2),
            date_to: NaiveDate::from_ymd_opt(2026, 1, 4),
            ..Default::default()
        };
        assert_eq!(ConcernReport::build(concerns, filters).rows.len(), 3);
    }

    #[test]
    fn department_report_rates_each_department() {
        let now = Utc::now();
        let engineering =
            Department::new(DepartmentId::generate(), "Engineering", "ENG", DepartmentType::Academic, now)
                .unwrap();
        let mut registrar = Department::new(
            DepartmentId::generate(),
            "Registrar",
            "REG",
            DepartmentType::Administrative,
            now,
        )
        .unwrap();
        registrar.is_active = false;

        let mut concerns: Vec<Concern> = (1..=4)
            .map(|day| concern(engineering.id, ConcernStatus::Resolved, day))
            .collect();
        concerns.push(concern(engineering.id, ConcernStatus::Pending, 5));
        concerns.push(concern(registrar.id, ConcernStatus::Pending, 5));

        let report = DepartmentReport::build(
            vec![registrar.clone(), engineering.clone()],
            &concerns,
            ReportFilters::default(),
        );
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.active, 1);
        assert_eq!(report.rows[0].department.name, "Engineering");
        assert_eq!(report.rows[0].resolution.rate, 80.0);
        assert_eq!(report.rows[0].resolution.bucket, ResolutionBucket::High);
        assert_eq!(report.rows[1].resolution.total, 1);
        assert_eq!(report.rows[1].resolution.bucket, ResolutionBucket::Low);

        let inactive_only = DepartmentReport::build(
            vec![registrar, engineering],
            &concerns,
            ReportFilters {
                status: Some("inactive".into()),
                ..Default::default()
            },
        );
        assert_eq!(inactive_only.rows.len(), 1);
        assert_eq!(inactive_only.rows[0].department.code, "REG");
    }

    #[test]
    fn unknown_status_is_dropped_from_filters() {
        let filters = ReportFilters::from_query(ReportKind::Concerns, &query(&[("status", "bogus")]));
        assert_eq!(filters.status, None);
        assert!(filters.is_empty());
        assert!(filters.summary(|_| None).is_empty());

        let dept = DepartmentId::generate();
        let concerns = vec![
            concern(dept, ConcernStatus::Pending, 1),
            concern(dept, ConcernStatus::Resolved, 2),
        ];
        let report = ConcernReport::build(concerns, filters);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.resolution.rate, 50.0);
    }

    #[test]
    fn status_filter_is_normalised_per_report() {
        let upper = query(&[("status", " IN_PROGRESS ")]);
        assert_eq!(
            ReportFilters::from_query(ReportKind::Concerns, &upper).status.as_deref(),
            Some("in_progress")
        );
        // 诉求状态对公告报表无效
        assert_eq!(ReportFilters::from_query(ReportKind::Announcements, &upper).status, None);

        let active = query(&[("status", "Active")]);
        assert_eq!(
            ReportFilters::from_query(ReportKind::Users, &active).status.as_deref(),
            Some("active")
        );
        assert_eq!(ReportFilters::from_query(ReportKind::Concerns, &active).status, None);
        assert_eq!(
            ReportFilters::from_query(ReportKind::Announcements, &query(&[("status", "published")]))
                .status
                .as_deref(),
            Some("published")
        );
    }

    #[test]
    fn announcement_report_tallies_and_views() {
        let dept = DepartmentId::generate();
        let announcements = vec![
            announcement(Some(dept), AnnouncementType::General, AnnouncementStatus::Published, 10, 1),
            announcement(Some(dept), AnnouncementType::Event, AnnouncementStatus::Draft, 0, 2),
            announcement(None, AnnouncementType::Emergency, AnnouncementStatus::Published, 5, 3),
            announcement(Some(dept), AnnouncementType::General, AnnouncementStatus::Archived, 7, 4),
        ];

        let all = AnnouncementReport::build(announcements.clone(), ReportFilters::default());
        assert_eq!(all.rows.len(), 4);
        assert_eq!(all.total_views, 22);
        assert_eq!(all.rows[0].title, "notice 4");
        assert_eq!(all.by_status.len(), AnnouncementStatus::ALL.len());
        assert_eq!(all.by_type.len(), AnnouncementType::ALL.len());
        let general = all.by_type.iter().find(|t| t.label == "general").unwrap();
        assert_eq!(general.count, 2);
        assert_eq!(general.percentage, 50.0);
        let academic = all.by_type.iter().find(|t| t.label == "academic").unwrap();
        assert_eq!(academic.count, 0);

        let published = AnnouncementReport::build(
            announcements.clone(),
            ReportFilters {
                status: Some("published".into()),
                ..Default::default()
            },
        );
        assert_eq!(published.rows.len(), 2);
        assert_eq!(published.total_views, 15);
        let drafts = published.by_status.iter().find(|t| t.label == "draft").unwrap();
        assert_eq!(drafts.count, 0);

        // 全校公告不属于任何院系
        let scoped = AnnouncementReport::build(
            announcements,
            ReportFilters {
                department_id: Some(dept),
                date_from: NaiveDate::from_ymd_opt(2026, 1, 2),
                ..Default::default()
            },
        );
        assert_eq!(scoped.rows.len(), 2);
        assert_eq!(scoped.total_views, 7);
    }
}
