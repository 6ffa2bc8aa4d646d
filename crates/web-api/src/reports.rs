//! HTML 报表渲染
//!
//! 统计结果转换为纯字符串视图后交给 askama 模板，模板只负责排版。

use std::collections::HashMap;

use askama::Template;
use domain::reports::{activity_label, FilterLine, Resolution, Tally};
use domain::{DepartmentId, Timestamp};

use application::{GeneratedReport, ReportBody};

const EMPTY: &str = "-";
const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

pub struct TallyView {
    pub label: String,
    pub count: usize,
    pub percentage: String,
}

impl From<&Tally> for TallyView {
    fn from(tally: &Tally) -> Self {
        Self {
            label: tally.label.replace('_', " "),
            count: tally.count,
            percentage: format!("{:.1}%", tally.percentage),
        }
    }
}

pub struct ResolutionView {
    pub total: usize,
    pub resolved: usize,
    pub rate: String,
    pub bucket: &'static str,
}

impl From<&Resolution> for ResolutionView {
    fn from(resolution: &Resolution) -> Self {
        Self {
            total: resolution.total,
            resolved: resolution.resolved,
            rate: format!("{:.1}%", resolution.rate),
            bucket: resolution.bucket.as_str(),
        }
    }
}

pub struct ConcernRowView {
    pub reference_number: String,
    pub subject: String,
    pub concern_type: &'static str,
    pub priority: &'static str,
    pub status: String,
    pub department: String,
    pub escalation_level: u8,
    pub created_at: String,
}

pub struct AnnouncementRowView {
    pub title: String,
    pub announcement_type: &'static str,
    pub priority: &'static str,
    pub status: &'static str,
    pub department: String,
    pub view_count: u64,
    pub published_at: String,
    pub created_at: String,
}

pub struct DepartmentRowView {
    pub name: String,
    pub code: String,
    pub department_type: &'static str,
    pub status: &'static str,
    pub resolution: ResolutionView,
}

pub struct UserRowView {
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: String,
    pub status: &'static str,
    pub last_login_at: String,
    pub created_at: String,
}

#[derive(Template)]
#[template(path = "reports/concerns.html")]
pub struct ConcernReportPage {
    pub title: &'static str,
    pub generated_at: String,
    pub filters: Vec<FilterLine>,
    pub pending: usize,
    pub resolution: ResolutionView,
    pub by_status: Vec<TallyView>,
    pub by_priority: Vec<TallyView>,
    pub rows: Vec<ConcernRowView>,
}

#[derive(Template)]
#[template(path = "reports/announcements.html")]
pub struct AnnouncementReportPage {
    pub title: &'static str,
    pub generated_at: String,
    pub filters: Vec<FilterLine>,
    pub total: usize,
    pub total_views: u64,
    pub by_status: Vec<TallyView>,
    pub by_type: Vec<TallyView>,
    pub rows: Vec<AnnouncementRowView>,
}

#[derive(Template)]
#[template(path = "reports/departments.html")]
pub struct DepartmentReportPage {
    pub title: &'static str,
    pub generated_at: String,
    pub filters: Vec<FilterLine>,
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub by_type: Vec<TallyView>,
    pub rows: Vec<DepartmentRowView>,
}

#[derive(Template)]
#[template(path = "reports/users.html")]
pub struct UserReportPage {
    pub title: &'static str,
    pub generated_at: String,
    pub filters: Vec<FilterLine>,
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub by_role: Vec<TallyView>,
    pub rows: Vec<UserRowView>,
}

fn date(at: Timestamp) -> String {
    at.format(DATE_FORMAT).to_string()
}

fn optional_datetime(at: Option<Timestamp>) -> String {
    at.map(|at| at.format(DATETIME_FORMAT).to_string())
        .unwrap_or_else(|| EMPTY.to_owned())
}

fn tallies(items: &[Tally]) -> Vec<TallyView> {
    items.iter().map(TallyView::from).collect()
}

/// 渲染报表，`department_names` 用于把院系 id 显示为名称
pub fn render_report(
    report: &GeneratedReport,
    department_names: &HashMap<DepartmentId, String>,
) -> Result<String, askama::Error> {
    let department = |id: Option<DepartmentId>| {
        id.map(|id| {
            department_names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| id.to_string())
        })
        .unwrap_or_else(|| EMPTY.to_owned())
    };
    let title = report.kind.title();
    let generated_at = report.generated_at.format(DATETIME_FORMAT).to_string();
    let filters = report.filter_summary.clone();

    match &report.body {
        ReportBody::Concerns(body) => ConcernReportPage {
            title,
            generated_at,
            filters,
            pending: body.pending,
            resolution: ResolutionView::from(&body.resolution),
            by_status: tallies(&body.by_status),
            by_priority: tallies(&body.by_priority),
            rows: body
                .rows
                .iter()
                .map(|concern| ConcernRowView {
                    reference_number: concern.reference_number.clone(),
                    subject: concern.subject.clone(),
                    concern_type: concern.concern_type.as_str(),
                    priority: concern.priority.as_str(),
                    status: concern.status.as_str().replace('_', " "),
                    department: department(Some(concern.department_id)),
                    escalation_level: concern.escalation_level,
                    created_at: date(concern.created_at),
                })
                .collect(),
        }
        .render(),
        ReportBody::Announcements(body) => AnnouncementReportPage {
            title,
            generated_at,
            filters,
            total: body.rows.len(),
            total_views: body.total_views,
            by_status: tallies(&body.by_status),
            by_type: tallies(&body.by_type),
            rows: body
                .rows
                .iter()
                .map(|announcement| AnnouncementRowView {
                    title: announcement.title.clone(),
                    announcement_type: announcement.announcement_type.as_str(),
                    priority: announcement.priority.as_str(),
                    status: announcement.status.as_str(),
                    department: department(announcement.department_id),
                    view_count: announcement.view_count,
                    published_at: optional_datetime(announcement.published_at),
                    created_at: date(announcement.created_at),
                })
                .collect(),
        }
        .render(),
        ReportBody::Departments(body) => DepartmentReportPage {
            title,
            generated_at,
            filters,
            total: body.rows.len(),
            active: body.active,
            inactive: body.rows.len() - body.active,
            by_type: tallies(&body.by_type),
            rows: body
                .rows
                .iter()
                .map(|row| DepartmentRowView {
                    name: row.department.name.clone(),
                    code: row.department.code.clone(),
                    department_type: row.department.department_type.as_str(),
                    status: activity_label(row.department.is_active),
                    resolution: ResolutionView::from(&row.resolution),
                })
                .collect(),
        }
        .render(),
        ReportBody::Users(body) => UserReportPage {
            title,
            generated_at,
            filters,
            total: body.rows.len(),
            active: body.active,
            inactive: body.inactive,
            by_role: tallies(&body.by_role),
            rows: body
                .rows
                .iter()
                .map(|user| UserRowView {
                    name: user.name.clone(),
                    email: user.email.as_str().to_owned(),
                    role: user.role.as_str().replace('_', " "),
                    department: department(user.department_id),
                    status: activity_label(user.is_active),
                    last_login_at: optional_datetime(user.last_login_at),
                    created_at: date(user.created_at),
                })
                .collect(),
        }
        .render(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use domain::reports::{ConcernReport, ReportFilters, ReportKind, UserReport};
    use domain::{
        Concern, ConcernId, ConcernStatus, ConcernType, NewConcern, NewUser, PasswordHash, User,
        UserId, UserRole,
    };

    fn student(now: Timestamp) -> User {
        User::register(
            UserId::generate(),
            NewUser {
                name: "Ana <Reyes>".into(),
                email: "ana@campus.edu".into(),
                role: UserRole::Student,
                department_id: None,
                employee_id: None,
                student_id: Some("2026-0007".into()),
                phone: None,
            },
            PasswordHash::new("plain:secret-pass").unwrap(),
            now,
        )
        .unwrap()
    }

    fn concern(student: &User, department_id: DepartmentId, now: Timestamp) -> Concern {
        Concern::submit(
            ConcernId::generate(),
            Concern::reference_for(now, "ABC123"),
            student,
            NewConcern {
                subject: "Grade dispute".into(),
                description: "Final grade missing".into(),
                concern_type: ConcernType::Academic,
                priority: None,
                department_id,
            },
            now,
        )
        .unwrap()
    }

    #[test]
    fn concern_report_shows_filters_counts_and_bucket() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let department_id = DepartmentId::generate();
        let student = student(now);
        let mut resolved = concern(&student, department_id, now);
        resolved.transition_to(ConcernStatus::InProgress, now).unwrap();
        resolved.transition_to(ConcernStatus::Resolved, now).unwrap();
        let pending = concern(&student, department_id, now);

        let filters = ReportFilters {
            department_id: Some(department_id),
            ..Default::default()
        };
        let names = HashMap::from([(department_id, "Registrar".to_owned())]);
        let report = GeneratedReport {
            kind: ReportKind::Concerns,
            generated_at: now,
            filter_summary: filters.summary(|id| names.get(&id).cloned()),
            body: ReportBody::Concerns(ConcernReport::build(vec![resolved, pending], filters)),
        };

        let html = render_report(&report, &names).unwrap();
        assert!(html.contains("Concerns Report"));
        assert!(html.contains("2026-03-02 09:00 UTC"));
        assert!(html.contains("Department:</strong> Registrar"));
        assert!(html.contains("50.0%"));
        assert!(html.contains("card rate-low"));
        assert!(html.contains("CN-20260302-ABC123"));
    }

    #[test]
    fn user_report_escapes_markup_and_omits_empty_filters() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let report = GeneratedReport {
            kind: ReportKind::Users,
            generated_at: now,
            filter_summary: Vec::new(),
            body: ReportBody::Users(UserReport::build(vec![student(now)], ReportFilters::default())),
        };

        let html = render_report(&report, &HashMap::new()).unwrap();
        assert!(html.contains("Ana &#60;Reyes&#62;") || html.contains("Ana &lt;Reyes&gt;"));
        assert!(!html.contains("class=\"filters\""));
        assert!(html.contains("ana@campus.edu"));
    }
}
