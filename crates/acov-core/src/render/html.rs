use crate::report::{FileReport, LineState};

const STYLE: &str = r#"    <style type="text/css">
      body { font-size: 11px; font-family: verdana; }
      pre { font-size: 10px; margin: 0; }
      .uncovered { color: #f00; }
      .covered { color: #000; }
      .uncovered_new { background-color: #ff6230; color: #800; font-weight: bold; }
      .covered_new { background-color: #cad7fe; }
      .noexec { color: #aaa; }
      table { border-width: 0; border-spacing: 0; }
      td { border-width: 0; border-bottom: 1px solid #eed; }
      .linenum { background-color: #efe383; text-align: right; padding-right: 1em; }
      h1, h2 { border-bottom: 1px solid #ccc; }
    </style>
"#;

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render the annotated page of one report from the current text of its file.
pub fn render_report(report: &FileReport, lines: &[String]) -> String {
    let title = escape_html(&report.new_path().to_string_lossy());
    let mut page = String::new();

    page.push_str("<!DOCTYPE html>\n<html>\n  <head>\n");
    page.push_str(&format!("    <title>{}</title>\n", title));
    page.push_str(STYLE);
    page.push_str("  </head>\n  <body>\n");
    page.push_str(&format!("    <h1>{}</h1>\n", title));
    match report.old_path() {
        Some(old) => page.push_str(&format!(
            "    <h2>(Derived from {})</h2>\n",
            escape_html(&old.to_string_lossy())
        )),
        None => page.push_str("    <h2>(This file is new)</h2>\n"),
    }

    page.push_str("    <div>\n      Components:\n      <ul>\n");
    for component in report.components() {
        page.push_str(&format!("        <li>{}</li>\n", escape_html(component)));
    }
    page.push_str("      </ul>\n    </div>\n");

    push_legend(&mut page, report.has_old_file());

    page.push_str("    <h3>Code</h3>\n    <table>\n      <tbody>\n");
    for (idx, text) in lines.iter().enumerate() {
        let line = idx as u32 + 1;
        let class = report.line_state(line).css_class();
        let marker = if report.has_old_file() && report.new_lines().contains(line) {
            "*"
        } else {
            " "
        };
        let count = report
            .coverage()
            .get(&line)
            .map(|count| count.to_string())
            .unwrap_or_default();

        page.push_str(&format!(
            "        <tr class=\"{class}\"><td class=\"linenum\"><pre>{line}{marker}</pre></td>\
             <td><pre>{count}</pre></td><td class=\"{class}\"><pre>{text}</pre></td></tr>\n",
            text = escape_html(text.trim_end()),
        ));
    }
    page.push_str("      </tbody>\n    </table>\n  </body>\n</html>\n");

    page
}

fn push_legend(page: &mut String, has_old_file: bool) {
    page.push_str("    <h3>Legend</h3>\n    <table>\n      <tbody>\n");
    if has_old_file {
        page.push_str("        <tr><td><pre>Old code</pre></td><td><pre>New code</pre></td></tr>\n");
        page.push_str(&format!(
            "        <tr><td colspan=\"2\" class=\"{}\"><pre>non-executable</pre></td></tr>\n",
            LineState::NonExecutable.css_class()
        ));
        page.push_str(&format!(
            "        <tr><td class=\"{}\"><pre>Covered</pre></td><td class=\"{}\"><pre>Covered</pre></td></tr>\n",
            LineState::CoveredOld.css_class(),
            LineState::CoveredNew.css_class()
        ));
        page.push_str(&format!(
            "        <tr><td class=\"{}\"><pre>Uncovered</pre></td><td class=\"{}\"><pre>Uncovered</pre></td></tr>\n",
            LineState::UncoveredOld.css_class(),
            LineState::UncoveredNew.css_class()
        ));
    } else {
        for (state, label) in [
            (LineState::NonExecutable, "non-executable"),
            (LineState::CoveredNew, "Covered"),
            (LineState::UncoveredNew, "Uncovered"),
        ] {
            page.push_str(&format!(
                "        <tr><td class=\"{}\"><pre>{}</pre></td></tr>\n",
                state.css_class(),
                label
            ));
        }
    }
    page.push_str("      </tbody>\n    </table>\n");
}

/// One row of the index page.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub source: String,
    pub page: String,
    pub instrumented: usize,
    pub covered: usize,
    pub new_lines: Option<usize>,
}

pub fn render_index(entries: &[IndexEntry]) -> String {
    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html>\n  <head>\n    <title>Coverage</title>\n");
    page.push_str(STYLE);
    page.push_str("  </head>\n  <body>\n    <h1>Coverage</h1>\n    <table>\n");
    page.push_str(
        "      <thead><tr><th>File</th><th>Instrumented</th><th>Covered</th><th>New lines</th></tr></thead>\n      <tbody>\n",
    );
    for entry in entries {
        let new_lines = entry
            .new_lines
            .map(|n| n.to_string())
            .unwrap_or_else(|| "all".to_string());
        page.push_str(&format!(
            "        <tr><td><a href=\"{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&entry.page),
            escape_html(&entry.source),
            entry.instrumented,
            entry.covered,
            new_lines
        ));
    }
    page.push_str("      </tbody>\n    </table>\n  </body>\n</html>\n");
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("if (a < b && c > d) puts(\"x\");"),
            "if (a &lt; b &amp;&amp; c &gt; d) puts(&quot;x&quot;);"
        );
    }

    #[test]
    fn test_render_new_file() {
        let mut report = FileReport::new("/src/a.c");
        report.accumulate(2, 5, "/src/a.c");
        report.accumulate(3, 0, "/src/a.c");
        let lines = vec![
            "#include <stdio.h>".to_string(),
            "int main() {".to_string(),
            "  return 1;".to_string(),
        ];

        let page = render_report(&report, &lines);
        assert!(page.contains("(This file is new)"));
        assert!(page.contains("<li>/src/a.c</li>"));
        assert!(page.contains("#include &lt;stdio.h&gt;"));
        assert!(page.contains(
            "<tr class=\"noexec\"><td class=\"linenum\"><pre>1 </pre></td><td><pre></pre></td>"
        ));
        assert!(page.contains(
            "<tr class=\"covered_new\"><td class=\"linenum\"><pre>2 </pre></td><td><pre>5</pre></td>"
        ));
        assert!(page.contains(
            "<tr class=\"uncovered_new\"><td class=\"linenum\"><pre>3 </pre></td><td><pre>0</pre></td>"
        ));
        assert!(!page.contains("Old code"));
    }

    #[test]
    fn test_render_index() {
        let entries = vec![IndexEntry {
            source: "/src/a.c".to_string(),
            page: "_src_a.c.html".to_string(),
            instrumented: 3,
            covered: 2,
            new_lines: None,
        }];
        let page = render_index(&entries);
        assert!(page.contains("<a href=\"_src_a.c.html\">/src/a.c</a>"));
        assert!(page.contains("<td>all</td>"));
    }
}
