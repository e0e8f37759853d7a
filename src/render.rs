//! HTML dashboard page
//!
//! Server-side rendering of a [`DashboardView`] into a single self-contained
//! page. A small inline script keeps the page live over `/ws`.

use std::fmt::Write;

use crate::dashboard::{DashboardView, LoadPhase};
use crate::report::{format_reported, DistrictFilter, FilterState, Report, Severity, StatusFilter};

/// Render the full dashboard page
pub fn render_dashboard(view: &DashboardView) -> String {
    let mut body = String::with_capacity(8 * 1024);

    render_header(&mut body, view);
    if let Some(error) = &view.error {
        let _ = write!(
            body,
            r#"<div class="error-banner" role="alert">{}</div>"#,
            html_escape(&error.to_string())
        );
    }
    render_stats(&mut body, view);
    render_filters(&mut body, view);
    render_table(&mut body, view);

    format!(
        "{head}<body>\n<main>\n{body}\n</main>\n<script>{script}</script>\n</body>\n</html>\n",
        head = PAGE_HEAD,
        body = body,
        script = LIVE_SCRIPT
    )
}

fn render_header(out: &mut String, view: &DashboardView) {
    let updated = view
        .last_updated
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    let _ = write!(
        out,
        r#"<header><h1>Water Leak Dashboard</h1><p class="updated">Last Updated: <span id="last-updated">{}</span></p></header>"#,
        html_escape(&updated)
    );
}

fn render_stats(out: &mut String, view: &DashboardView) {
    let stats = &view.statistics;
    let cards = [
        ("Total Active Leaks", stats.total_active.to_string(), "active"),
        ("Resolved Today", stats.resolved_today.to_string(), "resolved"),
        ("Critical Cases", stats.critical_active.to_string(), "critical"),
        ("Avg Response Time", view.avg_response_time.clone(), "response"),
    ];

    out.push_str(r#"<section class="stats">"#);
    for (label, value, class) in cards {
        let _ = write!(
            out,
            r#"<div class="stat-card stat-{}"><div class="stat-label">{}</div><div class="stat-value">{}</div></div>"#,
            class,
            label,
            html_escape(&value)
        );
    }
    out.push_str("</section>");
}

fn render_filters(out: &mut String, view: &DashboardView) {
    let filters = &view.filters;

    out.push_str(r#"<form class="filters" method="get" action="/" id="filter-form">"#);

    out.push_str(r#"<label>Status <select name="status">"#);
    for status in [StatusFilter::All, StatusFilter::Active, StatusFilter::Resolved] {
        let _ = write!(
            out,
            r#"<option value="{0}"{1}>{0}</option>"#,
            status.as_str(),
            selected(filters.status == status)
        );
    }
    out.push_str("</select></label>");

    out.push_str(r#"<fieldset class="severity"><legend>Severity</legend>"#);
    for severity in Severity::ALL {
        let _ = write!(
            out,
            r#"<label><input type="checkbox" name="sev" value="{0}"{1}> {0}</label>"#,
            severity,
            if filters.severities.contains(&severity) {
                " checked"
            } else {
                ""
            }
        );
    }
    // Filled from the checkboxes on submit
    out.push_str(r#"<input type="hidden" name="severity" id="severity-field"></fieldset>"#);

    out.push_str(r#"<label>District <select name="district">"#);
    let _ = write!(
        out,
        r#"<option value="All"{}>All</option>"#,
        selected(filters.district == DistrictFilter::All)
    );
    for district in &view.districts {
        let is_selected = matches!(&filters.district, DistrictFilter::Named(name) if name == district);
        let _ = write!(
            out,
            r#"<option value="{0}"{1}>{0}</option>"#,
            html_escape(district),
            selected(is_selected)
        );
    }
    out.push_str("</select></label>");

    let bound = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
    let _ = write!(
        out,
        r#"<label>From <input type="date" name="start" value="{}"></label><label>To <input type="date" name="end" value="{}"></label>"#,
        bound(filters.date_range.start),
        bound(filters.date_range.end)
    );

    out.push_str(r#"<button type="submit">Apply</button><a class="reset" href="/">Reset</a></form>"#);
}

fn render_table(out: &mut String, view: &DashboardView) {
    out.push_str(
        "<table class=\"reports\"><thead><tr><th>Location</th><th>Severity</th><th>Reported</th><th>Status</th><th>Action</th></tr></thead><tbody>",
    );

    if view.phase == LoadPhase::Loading {
        out.push_str(r#"<tr><td colspan="5" class="empty">Loading reports…</td></tr>"#);
    } else if view.reports.is_empty() {
        out.push_str(
            r#"<tr><td colspan="5" class="empty">No leak reports match the current filters.</td></tr>"#,
        );
    } else {
        for report in &view.reports {
            render_row(out, report, &view.filters);
        }
    }

    out.push_str("</tbody></table>");
}

fn render_row(out: &mut String, report: &Report, filters: &FilterState) {
    let severity = report.severity();
    let description = report
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|d| format!(r#"<div class="description">{}</div>"#, html_escape(d)))
        .unwrap_or_default();

    let (status, action) = if report.resolved {
        ("Resolved", r#"<span class="resolved-mark">✓ Resolved</span>"#.to_string())
    } else {
        // The query carries the filters in view back through the redirect
        let action = format!(
            "/reports/{}/resolve?{}",
            urlencoding::encode(&report.id.to_string()),
            filters.to_query_string()
        );
        (
            "Active",
            format!(
                r#"<form method="post" action="{}"><button type="submit">Mark Resolved</button></form>"#,
                html_escape(&action)
            ),
        )
    };

    let _ = write!(
        out,
        r#"<tr class="{row_class}"><td><div class="address">{address}</div>{description}</td><td><span class="badge badge-{badge}">{leak_type}</span></td><td>{reported}</td><td>{status}</td><td>{action}</td></tr>"#,
        row_class = if report.resolved { "row-resolved" } else { "row-active" },
        address = html_escape(&report.address),
        description = description,
        badge = severity.as_str().to_lowercase(),
        leak_type = html_escape(&report.leak_type),
        reported = html_escape(&format_reported(report.created_at.as_deref())),
        status = status,
        action = action,
    );
}

fn selected(is_selected: bool) -> &'static str {
    if is_selected {
        " selected"
    } else {
        ""
    }
}

/// Escape text for HTML element and attribute context
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

const PAGE_HEAD: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Water Leak Dashboard</title>
<style>
  body { font-family: system-ui, -apple-system, sans-serif; margin: 0; background: #f3f6f9; color: #1f2933; }
  main { max-width: 1200px; margin: 0 auto; padding: 24px; }
  header { display: flex; justify-content: space-between; align-items: baseline; }
  h1 { margin: 0 0 16px; color: #0b4f8a; }
  .updated { color: #52606d; font-size: 0.9rem; }
  .error-banner { background: #fde8e8; border: 1px solid #f8b4b4; color: #9b1c1c; padding: 12px 16px; border-radius: 6px; margin-bottom: 16px; }
  .stats { display: grid; grid-template-columns: repeat(4, 1fr); gap: 16px; margin-bottom: 20px; }
  .stat-card { background: #fff; border-radius: 8px; padding: 16px; box-shadow: 0 1px 3px rgba(0,0,0,0.08); }
  .stat-label { font-size: 0.85rem; color: #616e7c; }
  .stat-value { font-size: 1.8rem; font-weight: 600; margin-top: 4px; }
  .stat-critical .stat-value { color: #c81e1e; }
  .stat-resolved .stat-value { color: #057a55; }
  .filters { display: flex; flex-wrap: wrap; gap: 12px; align-items: center; background: #fff; padding: 12px 16px; border-radius: 8px; margin-bottom: 20px; }
  .filters fieldset { border: none; display: flex; gap: 8px; padding: 0; margin: 0; }
  .filters legend { float: left; margin-right: 6px; }
  .reset { color: #52606d; }
  table.reports { width: 100%; border-collapse: collapse; background: #fff; border-radius: 8px; overflow: hidden; }
  th, td { text-align: left; padding: 10px 12px; border-bottom: 1px solid #e4e7eb; }
  th { background: #f0f4f8; font-weight: 600; }
  .description { font-size: 0.85rem; color: #616e7c; }
  .badge { display: inline-block; padding: 2px 10px; border-radius: 12px; font-size: 0.8rem; font-weight: 600; }
  .badge-critical { background: #fde8e8; color: #c81e1e; }
  .badge-moderate { background: #fdf6b2; color: #8e4b10; }
  .badge-minor { background: #def7ec; color: #046c4e; }
  .row-resolved { color: #9aa5b1; }
  .resolved-mark { color: #057a55; font-weight: 600; }
  .empty { text-align: center; color: #7b8794; padding: 32px; }
  button { background: #0b4f8a; color: #fff; border: none; border-radius: 4px; padding: 6px 12px; cursor: pointer; }
</style>
</head>
"##;

const LIVE_SCRIPT: &str = r#"
(function () {
  var form = document.getElementById('filter-form');
  if (form) {
    form.addEventListener('submit', function () {
      var picked = Array.prototype.filter.call(form.querySelectorAll('input[name="sev"]'), function (c) { return c.checked; })
        .map(function (c) { return c.value; });
      document.getElementById('severity-field').value = picked.join(',');
      form.querySelectorAll('input[name="sev"]').forEach(function (c) { c.disabled = true; });
    });
  }
  if (!window.WebSocket) return;
  var proto = location.protocol === 'https:' ? 'wss://' : 'ws://';
  var ws = new WebSocket(proto + location.host + '/ws');
  ws.onopen = function () {
    ws.send(JSON.stringify({ type: 'subscribe', topics: ['reports', 'clock', 'system'] }));
  };
  ws.onmessage = function (event) {
    var msg = JSON.parse(event.data);
    if (msg.type === 'reports_changed' || msg.type === 'error') {
      location.reload();
    } else if (msg.type === 'clock') {
      var el = document.getElementById('last-updated');
      if (el) el.textContent = msg.last_updated.replace('T', ' ').slice(0, 19) + ' UTC';
    }
  };
})();
"#;
