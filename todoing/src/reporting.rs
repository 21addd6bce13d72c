//! Report generation: statistics, Markdown content, titles and export frames.
//!
//! The rendered strings are part of the product surface; the frontend and
//! existing user archives rely on them byte for byte, so the templates here
//! are not to be "improved" casually.

use chrono::{DateTime, Duration, Utc};

use crate::{
    api::models::reports::{ReportStatistics, ReportType},
    db::models::{reports::ReportDBResponse, tasks::TaskDBResponse},
};

/// Output format for report export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Text,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "md" | "markdown" => Some(ExportFormat::Markdown),
            "txt" => Some(ExportFormat::Text),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
            ExportFormat::Text => "text/plain; charset=utf-8",
        }
    }
}

/// Pushes a date-only boundary to the last second of that day, so a window of
/// `2025-01-01 .. 2025-01-07` covers the whole of January 7th.
pub fn end_of_day(date: DateTime<Utc>) -> DateTime<Utc> {
    date + Duration::hours(24) - Duration::seconds(1)
}

/// Counts per-status totals over the window's tasks. A task is overdue when it
/// has a deadline in the past and is not done yet.
pub fn compute_statistics(tasks: &[TaskDBResponse], now: DateTime<Utc>) -> ReportStatistics {
    use crate::api::models::tasks::TaskStatus;

    let mut statistics = ReportStatistics {
        total: tasks.len() as i64,
        ..Default::default()
    };

    for task in tasks {
        match task.status {
            TaskStatus::Done => statistics.completed += 1,
            TaskStatus::InProgress => statistics.in_progress += 1,
            TaskStatus::Todo => {}
        }

        if task.deadline.is_some_and(|d| d < now) && task.status != TaskStatus::Done {
            statistics.overdue += 1;
        }
    }

    if statistics.total > 0 {
        statistics.completion_rate = statistics.completed * 100 / statistics.total;
    }

    statistics
}

/// Renders the Markdown body of a report.
pub fn render_content(
    report_type: ReportType,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    tasks: &[TaskDBResponse],
    statistics: &ReportStatistics,
) -> String {
    use crate::api::models::tasks::TaskStatus;

    let mut content = format!("# {} 报告\n\n", report_type.as_str());
    content.push_str(&format!(
        "报告周期：{} 至 {}\n\n",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    ));

    content.push_str("## 任务概览\n\n");
    content.push_str(&format!("- 总任务数：{}\n", statistics.total));
    content.push_str(&format!("- 已完成：{}\n", statistics.completed));
    content.push_str(&format!("- 进行中：{}\n", statistics.in_progress));
    content.push_str(&format!("- 已逾期：{}\n", statistics.overdue));
    content.push_str(&format!("- 完成率：{}%\n\n", statistics.completion_rate));

    if !tasks.is_empty() {
        content.push_str("## 任务详情\n\n");

        let completed: Vec<_> = tasks.iter().filter(|t| t.status == TaskStatus::Done).collect();
        let in_progress: Vec<_> = tasks.iter().filter(|t| t.status == TaskStatus::InProgress).collect();
        let todo: Vec<_> = tasks.iter().filter(|t| t.status == TaskStatus::Todo).collect();

        if !completed.is_empty() {
            content.push_str("### 已完成任务\n\n");
            for (i, task) in completed.iter().enumerate() {
                content.push_str(&format!("{}. {}\n", i + 1, task.title));
                if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
                    content.push_str(&format!("   - {description}\n"));
                }
            }
            content.push('\n');
        }

        if !in_progress.is_empty() {
            content.push_str("### 进行中任务\n\n");
            push_open_tasks(&mut content, &in_progress);
        }

        if !todo.is_empty() {
            content.push_str("### 待办任务\n\n");
            push_open_tasks(&mut content, &todo);
        }
    }

    content.push_str("## 总结\n\n");
    content.push_str(if statistics.completion_rate >= 80 {
        "本期任务完成情况良好，继续保持！"
    } else if statistics.completion_rate >= 60 {
        "本期任务完成率尚可，仍有提升空间。"
    } else {
        "本期任务完成率较低，建议调整任务安排或工作计划。"
    });

    content
}

// In-progress and todo items share a format that shows the deadline inline.
fn push_open_tasks(content: &mut String, tasks: &[&TaskDBResponse]) {
    for (i, task) in tasks.iter().enumerate() {
        content.push_str(&format!("{}. {}", i + 1, task.title));
        if let Some(deadline) = task.deadline {
            content.push_str(&format!(" (截止日期：{})", deadline.format("%Y-%m-%d")));
        }
        content.push('\n');
        if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
            content.push_str(&format!("   - {description}\n"));
        }
    }
    content.push('\n');
}

/// Title for a report, localized per type.
pub fn render_title(report_type: ReportType, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    match report_type {
        ReportType::Daily => format!("{} 日报", start.format("%Y年%m月%d日")),
        ReportType::Weekly => format!("{} 至 {} 周报", start.format("%m月%d日"), end.format("%m月%d日")),
        ReportType::Monthly => format!("{} 月报", start.format("%Y年%m月")),
    }
}

/// Stand-in for the eventual AI integration; wraps the content so the
/// frontend's polished view has something to show.
pub fn polish_content(content: &str) -> String {
    format!("【AI润色版】\n\n{content}\n\n---\n此内容已经过AI优化，使其更加专业和易读。")
}

/// Wraps the chosen body in the Markdown download frame.
pub fn export_markdown(report: &ReportDBResponse, content: &str, now: DateTime<Utc>) -> String {
    let mut markdown = format!("# {}\n\n", report.title);
    markdown.push_str(&format!("**类型**: {}  \n", report.report_type.as_str()));
    markdown.push_str(&format!("**周期**: {}  \n", report.period));
    markdown.push_str(&format!("**创建时间**: {}  \n\n", report.created_at.format("%Y-%m-%d %H:%M:%S")));
    markdown.push_str("---\n\n");
    markdown.push_str(content);
    markdown.push_str("\n\n---\n\n");
    markdown.push_str(&format!("*报告生成时间: {}*", now.format("%Y-%m-%d %H:%M:%S")));
    markdown
}

/// Wraps the chosen body in the plain-text download frame.
pub fn export_text(report: &ReportDBResponse, content: &str, now: DateTime<Utc>) -> String {
    let mut text = format!("{}\n", report.title);
    text.push_str(&format!("类型: {}\n", report.report_type.as_str()));
    text.push_str(&format!("周期: {}\n", report.period));
    text.push_str(&format!("创建时间: {}\n\n", report.created_at.format("%Y-%m-%d %H:%M:%S")));
    text.push_str("=====================================\n\n");
    text.push_str(content);
    text.push_str("\n\n=====================================\n\n");
    text.push_str(&format!("报告生成时间: {}", now.format("%Y-%m-%d %H:%M:%S")));
    text
}

/// Download filename; the period goes in verbatim, spaces included.
pub fn export_filename(report: &ReportDBResponse, format: ExportFormat) -> String {
    format!(
        "report-{}-{}.{}",
        report.report_type.as_str(),
        report.period,
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::tasks::{TaskPriority, TaskStatus};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn task(status: TaskStatus, title: &str, description: Option<&str>, deadline: Option<DateTime<Utc>>) -> TaskDBResponse {
        TaskDBResponse {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.map(str::to_string),
            status,
            priority: TaskPriority::Medium,
            assignee: None,
            created_by: Uuid::new_v4(),
            deadline,
            scheduled_date: None,
            comments: vec![],
            created_at: date(2025, 1, 2),
            updated_at: date(2025, 1, 2),
        }
    }

    fn report(report_type: ReportType, period: &str, title: &str) -> ReportDBResponse {
        ReportDBResponse {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            report_type,
            period: period.to_string(),
            title: title.to_string(),
            content: "body".to_string(),
            polished_content: None,
            task_ids: vec![],
            statistics: ReportStatistics::default(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 8, 9, 30, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 1, 8, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn end_of_day_covers_the_whole_last_day() {
        let end = end_of_day(date(2025, 1, 7));
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 7, 23, 59, 59).unwrap());
    }

    #[test]
    fn statistics_count_statuses_and_overdue() {
        let now = date(2025, 1, 8);
        let tasks = vec![
            task(TaskStatus::Done, "a", None, None),
            task(TaskStatus::Done, "b", None, Some(date(2025, 1, 2))),
            task(TaskStatus::InProgress, "c", None, None),
            task(TaskStatus::Todo, "d", None, Some(date(2025, 1, 3))),
        ];

        let stats = compute_statistics(&tasks, now);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.in_progress, 1);
        // the done task with a past deadline is not overdue, the todo one is
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.completion_rate, 50);
    }

    #[test]
    fn completion_rate_is_floored_and_zero_for_no_tasks() {
        let now = date(2025, 1, 8);
        let one_of_three = vec![
            task(TaskStatus::Done, "a", None, None),
            task(TaskStatus::Todo, "b", None, None),
            task(TaskStatus::Todo, "c", None, None),
        ];
        assert_eq!(compute_statistics(&one_of_three, now).completion_rate, 33);
        assert_eq!(compute_statistics(&[], now).completion_rate, 0);
    }

    #[test]
    fn content_matches_the_template_exactly() {
        let tasks = vec![
            task(TaskStatus::Done, "写周报", Some("整理本周工作"), None),
            task(TaskStatus::InProgress, "开发导出功能", None, Some(date(2025, 1, 10))),
            task(TaskStatus::Todo, "评审", Some("准备材料"), None),
        ];
        let stats = compute_statistics(&tasks, date(2025, 1, 8));

        let content = render_content(
            ReportType::Weekly,
            date(2025, 1, 1),
            date(2025, 1, 7),
            &tasks,
            &stats,
        );

        let expected = concat!(
            "# weekly 报告\n\n",
            "报告周期：2025-01-01 至 2025-01-07\n\n",
            "## 任务概览\n\n",
            "- 总任务数：3\n",
            "- 已完成：1\n",
            "- 进行中：1\n",
            "- 已逾期：0\n",
            "- 完成率：33%\n\n",
            "## 任务详情\n\n",
            "### 已完成任务\n\n",
            "1. 写周报\n",
            "   - 整理本周工作\n",
            "\n",
            "### 进行中任务\n\n",
            "1. 开发导出功能 (截止日期：2025-01-10)\n",
            "\n",
            "### 待办任务\n\n",
            "1. 评审\n",
            "   - 准备材料\n",
            "\n",
            "## 总结\n\n",
            "本期任务完成率较低，建议调整任务安排或工作计划。",
        );
        assert_eq!(content, expected);
    }

    #[test]
    fn content_without_tasks_skips_the_detail_section() {
        let stats = ReportStatistics::default();
        let content = render_content(ReportType::Daily, date(2025, 3, 1), date(2025, 3, 1), &[], &stats);

        assert!(!content.contains("## 任务详情"));
        assert!(content.starts_with("# daily 报告\n\n"));
        assert!(content.ends_with("本期任务完成率较低，建议调整任务安排或工作计划。"));
    }

    #[test]
    fn summary_tiers_follow_the_completion_rate() {
        let high = ReportStatistics { completion_rate: 80, ..Default::default() };
        let mid = ReportStatistics { completion_rate: 60, ..Default::default() };
        let low = ReportStatistics { completion_rate: 59, ..Default::default() };
        let start = date(2025, 1, 1);

        let render = |s: &ReportStatistics| render_content(ReportType::Daily, start, start, &[], s);
        assert!(render(&high).ends_with("本期任务完成情况良好，继续保持！"));
        assert!(render(&mid).ends_with("本期任务完成率尚可，仍有提升空间。"));
        assert!(render(&low).ends_with("本期任务完成率较低，建议调整任务安排或工作计划。"));
    }

    #[test]
    fn titles_are_localized_per_type() {
        let start = date(2025, 1, 1);
        let end = date(2025, 1, 7);

        assert_eq!(render_title(ReportType::Daily, start, end), "2025年01月01日 日报");
        assert_eq!(render_title(ReportType::Weekly, start, end), "01月01日 至 01月07日 周报");
        assert_eq!(render_title(ReportType::Monthly, start, end), "2025年01月 月报");
    }

    #[test]
    fn polish_wraps_the_original_content() {
        let polished = polish_content("第一行\n第二行");
        assert!(polished.starts_with("【AI润色版】\n\n第一行\n第二行\n\n---\n"));
        assert!(polished.ends_with("此内容已经过AI优化，使其更加专业和易读。"));
    }

    #[test]
    fn markdown_export_frames_the_content() {
        let report = report(ReportType::Weekly, "2025-01-01 - 2025-01-07", "01月01日 至 01月07日 周报");
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap();

        let markdown = export_markdown(&report, "正文", now);
        let expected = concat!(
            "# 01月01日 至 01月07日 周报\n\n",
            "**类型**: weekly  \n",
            "**周期**: 2025-01-01 - 2025-01-07  \n",
            "**创建时间**: 2025-01-08 09:30:00  \n\n",
            "---\n\n",
            "正文",
            "\n\n---\n\n",
            "*报告生成时间: 2025-02-01 12:00:00*",
        );
        assert_eq!(markdown, expected);
    }

    #[test]
    fn text_export_uses_equals_separators() {
        let report = report(ReportType::Daily, "2025-03-01 - 2025-03-01", "2025年03月01日 日报");
        let now = Utc.with_ymd_and_hms(2025, 3, 2, 8, 0, 0).unwrap();

        let text = export_text(&report, "正文", now);
        assert!(text.starts_with("2025年03月01日 日报\n类型: daily\n周期: 2025-03-01 - 2025-03-01\n"));
        assert!(text.contains("=====================================\n\n正文\n\n====================================="));
        assert!(text.ends_with("报告生成时间: 2025-03-02 08:00:00"));
    }

    #[test]
    fn filename_keeps_the_period_verbatim() {
        let report = report(ReportType::Weekly, "2025-01-01 - 2025-01-07", "t");
        assert_eq!(
            export_filename(&report, ExportFormat::Markdown),
            "report-weekly-2025-01-01 - 2025-01-07.md"
        );
        assert_eq!(
            export_filename(&report, ExportFormat::Text),
            "report-weekly-2025-01-01 - 2025-01-07.txt"
        );
    }

    #[test]
    fn format_parsing_accepts_both_markdown_names() {
        assert_eq!(ExportFormat::parse("md"), Some(ExportFormat::Markdown));
        assert_eq!(ExportFormat::parse("markdown"), Some(ExportFormat::Markdown));
        assert_eq!(ExportFormat::parse("txt"), Some(ExportFormat::Text));
        assert_eq!(ExportFormat::parse("pdf"), None);
    }
}
