//! Sample requests showing the output document for each request type.

use crate::clock::Clock;
use crate::request::{
    AnalyticsRequest, BasicInfo, RequestMetadata, RequestStatus, RequestType, RequirementValue,
    Requirements,
};

/// A named sample request
pub struct Sample {
    pub file_name: &'static str,
    pub request: AnalyticsRequest,
}

fn requirements(entries: Vec<(&str, RequirementValue)>) -> Requirements {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn basic_info(
    clock: &dyn Clock,
    name: &str,
    role: &str,
    department: &str,
    timeline: &str,
) -> BasicInfo {
    BasicInfo {
        name: name.to_string(),
        role: role.to_string(),
        department: department.to_string(),
        timeline: timeline.to_string(),
        collected_at: clock.now(),
    }
}

fn with_metadata(
    clock: &dyn Clock,
    mut request: AnalyticsRequest,
    session_id: &str,
) -> AnalyticsRequest {
    request.metadata = Some(RequestMetadata {
        created_at: clock.now(),
        session_id: Some(session_id.to_string()),
        status: RequestStatus::PendingReview,
    });
    request
}

/// One sample per request type: a sales report, a dashboard update and a report update
pub fn sample_requests(clock: &dyn Clock) -> Vec<Sample> {
    let sales_report = AnalyticsRequest::new(
        basic_info(
            clock,
            "Sarah Johnson",
            "Regional Sales Manager",
            "Sales - West Coast",
            "End of this week",
        ),
        RequestType::Reports,
        requirements(vec![
            ("purpose", "Q2 sales performance analysis for executive review".into()),
            (
                "metrics",
                vec![
                    "total_revenue",
                    "conversion_rate",
                    "average_deal_size",
                    "sales_cycle_length",
                    "lead_sources",
                ]
                .into(),
            ),
            (
                "data_sources",
                vec!["Salesforce CRM", "HubSpot", "Google Analytics"].into(),
            ),
            ("time_period", "Q2 2025 (April-June)".into()),
            ("filters", "West Coast region, Enterprise deals >$50K".into()),
            ("output_format", "Executive PowerPoint with data tables".into()),
            ("audience", "VP Sales, Regional Directors".into()),
            (
                "additional_notes",
                "Include comparison to Q1 and same period last year".into(),
            ),
        ]),
    );

    let dashboard_update = AnalyticsRequest::new(
        basic_info(clock, "Mike Chen", "VP of Marketing", "Marketing", "Next two weeks"),
        RequestType::Dashboard,
        requirements(vec![
            ("purpose", "Update existing executive marketing dashboard".into()),
            ("dashboard_name", "Marketing Performance Executive Dashboard".into()),
            ("dashboard_location", "Tableau Server - Executive Folder".into()),
            (
                "changes_needed",
                vec![
                    "Add TikTok advertising metrics",
                    "Include customer acquisition cost by channel",
                    "Update attribution model for multi-touch",
                ]
                .into(),
            ),
            (
                "new_visualizations",
                vec![
                    "Social media ROI comparison chart",
                    "Customer journey funnel with new touchpoints",
                ]
                .into(),
            ),
            ("refresh_frequency", "Daily at 6 AM".into()),
            ("target_audience", "C-suite, Marketing leadership".into()),
            ("integration_needs", "Email alerts for CAC threshold breaches".into()),
        ]),
    );

    let report_update = AnalyticsRequest::new(
        basic_info(clock, "Lisa Rodriguez", "Content Director", "Editorial", "This month"),
        RequestType::Updates,
        requirements(vec![
            ("existing_report_name", "Weekly Content Performance Report".into()),
            ("current_location", "Google Drive - Editorial Shared Folder".into()),
            ("current_frequency", "Weekly, sent Mondays".into()),
            (
                "changes_needed",
                vec![
                    "Add video content metrics (YouTube, TikTok)",
                    "Include engagement rate by content type",
                    "Add competitor benchmarking section",
                ]
                .into(),
            ),
            (
                "reason_for_update",
                "Expanding video content strategy, need performance tracking".into(),
            ),
            (
                "new_data_sources",
                vec!["YouTube Analytics", "TikTok Analytics", "SEMrush"].into(),
            ),
            ("distribution_changes", "Add VP Product to recipient list".into()),
            ("format_changes", "Include executive summary at top".into()),
        ]),
    );

    vec![
        Sample {
            file_name: "sales_report_example.json",
            request: with_metadata(clock, sales_report, "session_abc123"),
        },
        Sample {
            file_name: "dashboard_update_example.json",
            request: with_metadata(clock, dashboard_update, "session_def456"),
        },
        Sample {
            file_name: "report_update_example.json",
            request: with_metadata(clock, report_update, "session_ghi789"),
        },
    ]
}

/// Short recap lines for a request, as shown after writing samples
pub fn recap(request: &AnalyticsRequest) -> Vec<String> {
    let info = &request.basic_info;
    let mut lines = vec![
        format!("Requester: {} ({})", info.name, info.role),
        format!("Department: {}", info.department),
        format!("Request Type: {}", request.request_type),
        format!("Timeline: {}", info.timeline),
    ];

    let field = |key: &str| request.requirements.get(key);
    let count = |key: &str| field(key).map_or(0, RequirementValue::len);
    let text = |key: &str| match field(key) {
        Some(RequirementValue::Text(text)) => text.clone(),
        Some(RequirementValue::List(items)) => items.join(", "),
        None => "Not specified".to_string(),
    };

    match request.request_type {
        RequestType::Reports => {
            lines.push(format!("Purpose: {}", text("purpose")));
            lines.push(format!("Metrics: {} metrics requested", count("metrics")));
        }
        RequestType::Dashboard => {
            lines.push(format!("Dashboard: {}", text("dashboard_name")));
            lines.push(format!("Changes: {} changes requested", count("changes_needed")));
        }
        RequestType::Updates => {
            lines.push(format!("Report: {}", text("existing_report_name")));
            lines.push(format!("Changes: {} changes requested", count("changes_needed")));
        }
    }
    lines
}
