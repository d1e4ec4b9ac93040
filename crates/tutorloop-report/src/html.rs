//! HTML progress report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use chrono::{DateTime, Utc};
use tutorloop_core::adaptive::{NextStep, Thresholds};
use tutorloop_core::snapshot::{ProgressSnapshot, TopicProgress};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn mastery_color(mastery: f64, thresholds: &Thresholds) -> &'static str {
    if mastery >= thresholds.mid() {
        "#22c55e"
    } else if mastery >= thresholds.low() {
        "#eab308"
    } else {
        "#ef4444"
    }
}

/// Generate an HTML report from a progress snapshot.
pub fn generate_html(snapshot: &ProgressSnapshot) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>tutorloop progress: {}</title>\n",
        html_escape(&snapshot.user_id)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>tutorloop progress</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">User: <strong>{}</strong> | {} topics | overall mastery {:.1}% | {}</p>\n",
        html_escape(&snapshot.user_id),
        snapshot.topics.len(),
        snapshot.overall_mastery * 100.0,
        snapshot.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Recommendation
    html.push_str("<section class=\"next-step\">\n");
    html.push_str("<h2>Next step</h2>\n");
    match &snapshot.next_step {
        NextStep::Recommend(rec) => {
            html.push_str(&format!(
                "<p><strong>{}</strong> on <strong>{}</strong> at <strong>{}</strong> difficulty (mastery {:.1}%)</p>\n",
                rec.action_type,
                html_escape(&rec.next_topic_id),
                rec.difficulty,
                rec.mastery * 100.0
            ));
            if let Some(reason) = &rec.reason {
                html.push_str(&format!("<p class=\"meta\">{}</p>\n", html_escape(reason)));
            }
        }
        NextStep::NothingToRecommend => {
            html.push_str("<p class=\"meta\">No quizzes recorded yet.</p>\n");
        }
    }
    html.push_str("</section>\n");

    // Topic table
    html.push_str("<section class=\"topics\">\n");
    html.push_str("<h2>Topics</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"topics\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Topic</th><th onclick=\"sortTable(1)\">Mastery</th><th onclick=\"sortTable(2)\">Samples</th><th onclick=\"sortTable(3)\">Last quiz</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for topic in &snapshot.topics {
        let last = topic
            .curve
            .last()
            .map(|p| p.timestamp.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        html.push_str(&format!(
            "<tr><td>{}</td><td style=\"color: {}\">{:.1}%</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&topic.topic_id),
            mastery_color(topic.mastery, &snapshot.thresholds),
            topic.mastery * 100.0,
            topic.samples,
            last
        ));
    }
    html.push_str("</tbody></table>\n");

    if !snapshot.topics.is_empty() {
        html.push_str(&generate_bar_chart(&snapshot.topics, &snapshot.thresholds));
    }
    html.push_str("</section>\n");

    // Learning curves
    let curves: Vec<&TopicProgress> = snapshot
        .topics
        .iter()
        .filter(|t| !t.curve.is_empty())
        .collect();
    if !curves.is_empty() {
        html.push_str("<section class=\"curves\">\n");
        html.push_str("<h2>Learning curves</h2>\n");
        for topic in curves {
            html.push_str(&format!("<h3>{}</h3>\n", html_escape(&topic.topic_id)));
            html.push_str(&generate_curve_chart(topic, &snapshot.thresholds));
        }
        html.push_str("</section>\n");
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(snapshot)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(snapshot: &ProgressSnapshot, path: &Path) -> Result<()> {
    let html = generate_html(snapshot);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn generate_bar_chart(topics: &[TopicProgress], thresholds: &Thresholds) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = topics.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, topic) in topics.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (topic.mastery.clamp(0.0, 1.0) * max_width as f64) as usize;

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&topic.topic_id)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width,
            y,
            width,
            bar_height,
            mastery_color(topic.mastery, thresholds)
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            topic.mastery * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

/// Horizontal position of `ts` within `[start, end]`, as a fraction.
fn time_fraction(ts: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let span = (end - start).num_milliseconds();
    if span <= 0 {
        return 0.0;
    }
    (ts - start).num_milliseconds() as f64 / span as f64
}

fn generate_curve_chart(topic: &TopicProgress, thresholds: &Thresholds) -> String {
    let width = 600.0;
    let height = 160.0;
    let margin = 20.0;
    let plot_w = width - 2.0 * margin;
    let plot_h = height - 2.0 * margin;

    let mut svg = format!(
        "<svg width=\"{width}\" height=\"{height}\" xmlns=\"http://www.w3.org/2000/svg\">\n"
    );

    // Threshold guides
    for threshold in [thresholds.low(), thresholds.mid()] {
        let y = margin + (1.0 - threshold) * plot_h;
        svg.push_str(&format!(
            "  <line x1=\"{margin}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#9ca3af\" stroke-dasharray=\"4 4\"/>\n",
            margin + plot_w
        ));
    }

    let (Some(first), Some(last)) = (topic.curve.first(), topic.curve.last()) else {
        svg.push_str("</svg>\n");
        return svg;
    };

    let points: Vec<(f64, f64)> = topic
        .curve
        .iter()
        .map(|p| {
            let x = if topic.curve.len() == 1 {
                margin + plot_w / 2.0
            } else {
                margin + time_fraction(p.timestamp, first.timestamp, last.timestamp) * plot_w
            };
            let y = margin + (1.0 - p.mastery.clamp(0.0, 1.0)) * plot_h;
            (x, y)
        })
        .collect();

    let polyline = points
        .iter()
        .map(|(x, y)| format!("{x:.1},{y:.1}"))
        .collect::<Vec<_>>()
        .join(" ");
    svg.push_str(&format!(
        "  <polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
        polyline,
        mastery_color(topic.mastery, thresholds)
    ));
    for (x, y) in &points {
        svg.push_str(&format!(
            "  <circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"3\" fill=\"currentColor\"/>\n"
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('topics');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, {numeric: true}) : vb.localeCompare(va, undefined, {numeric: true});
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
