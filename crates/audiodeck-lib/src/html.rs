//! HTML output for a settled [`Page`].
//!
//! Produces one self-contained document: `#file-list` with a `.file-item` per
//! panel, and the `#download-all-btn` export link (omitted for the empty set).
//! Inline scripts keep browser `<audio>` elements mutually exclusive and,
//! when served, drive the export control from `/export/status`.

use std::fmt;

use audiodeck_core::page::{EXPORT_LABEL, Node, Page};

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; }
.file-item { border: 1px solid #ccc; border-radius: 6px; padding: 1em; margin-bottom: 1em; }
.file-item p { white-space: pre-wrap; }
.file-item .error { color: red; }
#download-all-btn { display: inline-block; margin-bottom: 1.5em; }
#download-all-btn[aria-disabled=\"true\"] { pointer-events: none; opacity: 0.6; }";

/// Pause and rewind the previous player whenever another one starts.
const EXCLUSIVE_PLAYBACK_JS: &str = "\
let current = null;
document.querySelectorAll('#file-list audio').forEach(a => a.addEventListener('play', () => {
  if (current && current !== a) { current.pause(); current.currentTime = 0; }
  current = a;
}));";

/// Click handler for the served export control.
///
/// Disables the link, mirrors the server's label while the archive is built,
/// alerts with the response body on failure, then restores the idle label.
const EXPORT_CONTROL_JS: &str = "\
const btn = document.getElementById('download-all-btn');
if (btn && btn.dataset.status) btn.addEventListener('click', async ev => {
  ev.preventDefault();
  if (btn.getAttribute('aria-disabled') === 'true') return;
  const idle = btn.textContent;
  btn.setAttribute('aria-disabled', 'true');
  const poll = setInterval(async () => {
    try {
      const s = await (await fetch(btn.dataset.status)).json();
      if (s.disabled) btn.textContent = s.label;
    } catch (_) {}
  }, 200);
  try {
    const res = await fetch(btn.href);
    if (!res.ok) { alert(await res.text()); return; }
    const url = URL.createObjectURL(await res.blob());
    const a = document.createElement('a');
    a.href = url;
    a.download = btn.getAttribute('download');
    document.body.appendChild(a);
    a.click();
    a.remove();
    URL.revokeObjectURL(url);
  } catch (e) {
    alert(String(e));
  } finally {
    clearInterval(poll);
    btn.textContent = idle;
    btn.removeAttribute('aria-disabled');
  }
});";

#[derive(Debug, Clone)]
pub struct HtmlOptions {
    pub title: String,
    /// Where the export control points: `/download-all` when served,
    /// `audio_files.zip` for a static render.
    pub export_href: String,
    pub archive_name: String,
    /// Export status endpoint. `None` for a static render, where the link is
    /// a plain download of a pre-built archive.
    pub status_href: Option<String>,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            title: "audiodeck".into(),
            export_href: "/download-all".into(),
            archive_name: audiodeck_core::types::ARCHIVE_FILE_NAME.into(),
            status_href: Some("/export/status".into()),
        }
    }
}

impl HtmlOptions {
    /// Options for an `index.html` that sits next to its archive.
    pub fn static_page(archive_name: &str) -> Self {
        Self {
            export_href: archive_name.into(),
            archive_name: archive_name.into(),
            status_href: None,
            ..Default::default()
        }
    }
}

pub fn render_html(page: &Page, opts: &HtmlOptions) -> String {
    Document { page, opts }.to_string()
}

struct Document<'a> {
    page: &'a Page,
    opts: &'a HtmlOptions,
}

impl fmt::Display for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { page, opts } = self;
        f.write_str("<!DOCTYPE html>\n<html lang=\"zh\">\n<head>\n<meta charset=\"utf-8\">\n")?;
        writeln!(f, "<title>{}</title>", escape(&opts.title))?;
        writeln!(f, "<style>\n{STYLE}\n</style>\n</head>\n<body>")?;

        let interactive = page.export_visible && opts.status_href.is_some();
        if page.export_visible {
            write!(
                f,
                "<a id=\"download-all-btn\" href=\"{}\" download=\"{}\"",
                escape(&opts.export_href),
                escape(&opts.archive_name)
            )?;
            if let Some(status) = &opts.status_href {
                write!(f, " data-status=\"{}\"", escape(status))?;
            }
            writeln!(f, ">{EXPORT_LABEL}</a>")?;
        }

        f.write_str("<div id=\"file-list\">\n")?;
        if let Some(placeholder) = &page.placeholder {
            writeln!(f, "<p>{}</p>", escape(placeholder))?;
        }
        for panel in &page.panels {
            f.write_str("<div class=\"file-item\">\n")?;
            for node in &panel.nodes {
                write_node(f, node)?;
            }
            f.write_str("</div>\n")?;
        }
        f.write_str("</div>\n")?;

        writeln!(f, "<script>\n{EXCLUSIVE_PLAYBACK_JS}\n</script>")?;
        if interactive {
            writeln!(f, "<script>\n{EXPORT_CONTROL_JS}\n</script>")?;
        }
        f.write_str("</body>\n</html>\n")
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
    match node {
        Node::Heading { text } => writeln!(f, "<h2>{}</h2>", escape(text)),
        Node::Text { body } => writeln!(f, "<p>{}</p>", escape(body)),
        Node::Audio { src } => writeln!(
            f,
            "<audio controls preload=\"none\" src=\"{}\"></audio>",
            escape(src)
        ),
        Node::Error { message } => writeln!(
            f,
            "<p class=\"error\" style=\"color: red\">{}</p>",
            escape(message)
        ),
    }
}

/// Escape text for element content and double-quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
