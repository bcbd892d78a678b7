//! Terminal rendering of the upload page and translation of user gestures
//! into controller calls.
//!
//! The view owns no workflow state of its own apart from the scroll position
//! of the two result panes. Everything else is read from
//! [`UploadController::snapshot`] at render time, so re-rendering after any
//! observer callback always reflects the latest state. The view subscribes a
//! [`RenderFlag`] on construction; [`UploadView::needs_render`] reports
//! whether any controller event arrived since the last [`UploadView::render`].

use crate::config::UploaderConfig;
use crate::controller::{UploadController, UploadSnapshot};
use crate::dropzone::Dropzone;
use crate::error::{DropRejection, SubmitError};
use crate::observer::UploadObserver;
use crate::output::ConversionResult;
use crate::selection::{FileHandle, SelectionState};
use crate::theme::Theme;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shown in the result area until a complete result exists.
pub const PLACEHOLDER: &str = "No content generated yet.";
pub const EXTRACTED_TITLE: &str = "Extracted Markdown Content";
pub const SUMMARY_TITLE: &str = "AI Summary";
pub const SUBMIT_LABEL: &str = "Upload & Convert File";
const DROP_PROMPT: &str = "Click to upload or drag and drop";

/// One of the two fixed-height result panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Extracted,
    Summary,
}

impl Pane {
    fn index(self) -> usize {
        match self {
            Pane::Extracted => 0,
            Pane::Summary => 1,
        }
    }
}

/// Set by every controller event, cleared by a render.
#[derive(Debug)]
pub struct RenderFlag(AtomicBool);

impl RenderFlag {
    fn mark(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl UploadObserver for RenderFlag {
    fn on_selection_changed(&self, _selection: &SelectionState) {
        self.mark();
    }

    fn on_submit_start(&self, _file: &FileHandle) {
        self.mark();
    }

    fn on_result_changed(&self, _result: Option<&ConversionResult>) {
        self.mark();
    }

    fn on_submit_error(&self, _error: &SubmitError) {
        self.mark();
    }
}

/// The upload page.
pub struct UploadView {
    controller: Arc<UploadController>,
    dropzone: Dropzone,
    theme: Theme,
    pane_height: usize,
    scroll: [usize; 2],
    dirty: Arc<RenderFlag>,
}

impl UploadView {
    pub fn new(controller: Arc<UploadController>, config: &UploaderConfig, theme: Theme) -> Self {
        let dirty = Arc::new(RenderFlag(AtomicBool::new(true)));
        controller.subscribe(dirty.clone());
        Self {
            controller,
            dropzone: Dropzone::from_config(config),
            theme,
            pane_height: config.pane_height.max(1),
            scroll: [0, 0],
            dirty,
        }
    }

    /// Whether the controller changed since the last [`Self::render`].
    pub fn needs_render(&self) -> bool {
        self.dirty.0.load(Ordering::SeqCst)
    }

    pub fn controller(&self) -> &Arc<UploadController> {
        &self.controller
    }

    pub fn dropzone(&self) -> &Dropzone {
        &self.dropzone
    }

    // ── Gestures ─────────────────────────────────────────────────────────

    /// Files dropped on (or picked through) the drop target.
    ///
    /// Rejected drops leave the selection untouched.
    pub fn drop_files(&self, files: Vec<FileHandle>) -> Result<(), DropRejection> {
        let held = self.controller.selection().to_files();
        let accepted = self.dropzone.accept(&held, files)?;
        self.controller.set_selection(accepted);
        Ok(())
    }

    /// Click on a file entry's remove marker. Returns the removed file.
    pub fn remove_file(&self, index: usize) -> Option<FileHandle> {
        let mut held = self.controller.selection().to_files();
        if index >= held.len() {
            return None;
        }
        let removed = held.remove(index);
        debug!(file = %removed.name(), "Removed file from selection");
        self.controller.set_selection(held);
        Some(removed)
    }

    /// Click on the submit button.
    pub async fn submit(&mut self) {
        self.controller.submit().await;
        self.scroll = [0, 0];
    }

    /// Scroll a result pane by `delta` lines, clamped to its content.
    pub fn scroll(&mut self, pane: Pane, delta: isize) {
        let Some(result) = self.controller.result() else {
            return;
        };
        let lines = pane_text(&result, pane).lines().count();
        let max = lines.saturating_sub(self.pane_height);
        let slot = &mut self.scroll[pane.index()];
        let next = slot.saturating_add_signed(delta).min(max);
        if next != *slot {
            *slot = next;
            self.dirty.mark();
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    /// Render the whole page from the controller's current state.
    pub fn render(&self) -> String {
        self.dirty.0.store(false, Ordering::SeqCst);
        let snapshot = self.controller.snapshot();
        let mut out = String::new();
        self.render_dropzone(&snapshot, &mut out);
        self.render_submit(&snapshot, &mut out);
        out.push('\n');
        out.push_str(&self.render_results(snapshot.result.as_ref()));
        out
    }

    /// Render only the result area: both panes, or the placeholder line.
    pub fn render_results(&self, result: Option<&ConversionResult>) -> String {
        let Some(result) = result else {
            return format!("{}\n", self.theme.dim(PLACEHOLDER));
        };

        let mut out = String::new();
        self.render_pane(EXTRACTED_TITLE, result, Pane::Extracted, &mut out);
        out.push('\n');
        self.render_pane(SUMMARY_TITLE, result, Pane::Summary, &mut out);
        out
    }

    fn render_dropzone(&self, snapshot: &UploadSnapshot, out: &mut String) {
        let t = &self.theme;
        let _ = writeln!(out, "┌╌╌ {} ╌╌┐", t.bold(DROP_PROMPT));
        let _ = writeln!(out, "  {}", t.dim(self.dropzone.accept_hint()));
        let _ = writeln!(
            out,
            "  {}",
            t.dim(&format!(
                "max {} file(s), {} each",
                self.dropzone.max_files(),
                format_size(self.dropzone.max_size())
            ))
        );
        for (i, file) in snapshot.selection.to_files().iter().enumerate() {
            let _ = writeln!(
                out,
                "  📎 {}  {}  [x {}]",
                file.name(),
                t.dim(&format_size(file.size())),
                i
            );
        }
        let _ = writeln!(out, "└╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌╌┘");
    }

    fn render_submit(&self, snapshot: &UploadSnapshot, out: &mut String) {
        let label = if snapshot.in_flight > 0 {
            format!("{SUBMIT_LABEL} …")
        } else {
            SUBMIT_LABEL.to_string()
        };
        let _ = writeln!(out, "[ {} ]", self.theme.bold(&label));
    }

    fn render_pane(&self, title: &str, result: &ConversionResult, pane: Pane, out: &mut String) {
        let t = &self.theme;
        let text = pane_text(result, pane);
        let lines: Vec<&str> = text.lines().collect();
        let offset = self.scroll[pane.index()].min(lines.len().saturating_sub(self.pane_height));
        let end = (offset + self.pane_height).min(lines.len());

        let _ = writeln!(out, "── {} ──", t.bold(title));
        if offset > 0 {
            let _ = writeln!(out, "│ {}", t.dim(&format!("↑ {offset} more line(s)")));
        }
        for line in &lines[offset..end] {
            let line = if t.is_colored() {
                escape_controls(line)
            } else {
                (*line).to_string()
            };
            let styled = match pane {
                Pane::Extracted => t.body(&line),
                Pane::Summary => t.accent(&line),
            };
            let _ = writeln!(out, "│ {styled}");
        }
        let below = lines.len() - end;
        if below > 0 {
            let _ = writeln!(out, "│ {}", t.dim(&format!("↓ {below} more line(s)")));
        }
    }
}

fn pane_text(result: &ConversionResult, pane: Pane) -> &str {
    match pane {
        Pane::Extracted => result.extracted(),
        Pane::Summary => result.summary(),
    }
}

/// Replace control characters other than tab with their `\u{..}` escape so
/// server text cannot drive the terminal.
fn escape_controls(line: &str) -> String {
    line.chars()
        .map(|c| {
            if c.is_control() && c != '\t' {
                c.escape_unicode().to_string()
            } else {
                c.to_string()
            }
        })
        .collect()
}

/// Human-readable byte size using binary units.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ConversionService;
    use crate::error::SubmitError;
    use crate::notify::TracingNotifier;
    use crate::output::ConversionResponse;
    use crate::theme::ThemeMode;
    use futures::future::BoxFuture;

    struct Echo;

    impl ConversionService for Echo {
        fn convert<'a>(
            &'a self,
            file: &'a FileHandle,
        ) -> BoxFuture<'a, Result<ConversionResponse, SubmitError>> {
            let name = file.name().to_string();
            Box::pin(async move {
                Ok(ConversionResponse {
                    markdown_content: Some((1..=30).map(|i| format!("line {i}\n")).collect()),
                    ai_summary: Some(format!("Summary of {name}.")),
                    message: None,
                })
            })
        }
    }

    fn view(pane_height: usize) -> UploadView {
        let config = UploaderConfig::builder()
            .pane_height(pane_height)
            .build()
            .unwrap();
        let ctrl = Arc::new(UploadController::new(Arc::new(Echo), Arc::new(TracingNotifier)));
        UploadView::new(ctrl, &config, Theme::plain())
    }

    #[test]
    fn placeholder_before_any_result() {
        let v = view(5);
        let page = v.render();
        assert!(page.contains(PLACEHOLDER));
        assert!(page.contains(SUBMIT_LABEL));
        assert!(!page.contains(EXTRACTED_TITLE));
    }

    #[test]
    fn held_file_is_listed_and_removable() {
        let v = view(5);
        v.drop_files(vec![FileHandle::new("report.pdf", vec![0u8; 2048])])
            .unwrap();
        assert!(v.render().contains("📎 report.pdf  2.0 KiB"));

        assert_eq!(v.remove_file(3), None);
        let removed = v.remove_file(0).unwrap();
        assert_eq!(removed.name(), "report.pdf");
        assert!(v.controller().selection().is_empty());
        assert!(!v.render().contains("report.pdf"));
    }

    #[test]
    fn rejected_drop_leaves_selection_alone() {
        let v = view(5);
        v.drop_files(vec![FileHandle::new("a.pdf", vec![1])]).unwrap();
        let err = v
            .drop_files(vec![FileHandle::new("b.pdf", vec![1])])
            .unwrap_err();
        assert_eq!(err, DropRejection::TooManyFiles { max: 1 });
        assert_eq!(v.controller().selection().file().unwrap().name(), "a.pdf");
    }

    #[tokio::test]
    async fn result_panes_are_fixed_height_and_scrollable() {
        let mut v = view(5);
        v.drop_files(vec![FileHandle::new("doc.pdf", b"%PDF".to_vec())])
            .unwrap();
        v.submit().await;

        let page = v.render();
        assert!(!page.contains(PLACEHOLDER));
        assert!(page.contains("│ line 1\n"));
        assert!(page.contains("│ line 5\n"));
        assert!(!page.contains("│ line 6\n"));
        assert!(page.contains("↓ 25 more line(s)"));
        assert!(page.contains("│ Summary of doc.pdf."));

        v.scroll(Pane::Extracted, 100);
        let page = v.render();
        assert!(page.contains("│ line 30\n"));
        assert!(page.contains("↑ 25 more line(s)"));
        assert!(!page.contains("↓"));

        v.scroll(Pane::Extracted, -3);
        assert!(v.render().contains("│ line 23\n"));
    }

    #[tokio::test]
    async fn controller_events_mark_view_for_render() {
        let mut v = view(5);
        assert!(v.needs_render());
        v.render();
        assert!(!v.needs_render());

        v.drop_files(vec![FileHandle::new("doc.pdf", b"%PDF".to_vec())])
            .unwrap();
        assert!(v.needs_render());
        v.render();

        v.submit().await;
        assert!(v.needs_render());
        v.render();

        v.scroll(Pane::Summary, 1);
        assert!(!v.needs_render());
        v.scroll(Pane::Extracted, 1);
        assert!(v.needs_render());
    }

    struct Hostile;

    impl ConversionService for Hostile {
        fn convert<'a>(
            &'a self,
            _file: &'a FileHandle,
        ) -> BoxFuture<'a, Result<ConversionResponse, SubmitError>> {
            Box::pin(async {
                Ok(ConversionResponse {
                    markdown_content: Some("# Title\x1b[2J\twide".into()),
                    ai_summary: Some("ok\x07".into()),
                    message: None,
                })
            })
        }
    }

    async fn hostile_page(color: bool) -> String {
        let config = UploaderConfig::default();
        let ctrl = Arc::new(UploadController::new(
            Arc::new(Hostile),
            Arc::new(TracingNotifier),
        ));
        let mut v = UploadView::new(ctrl, &config, Theme::new(ThemeMode::Dark, color));
        v.drop_files(vec![FileHandle::new("doc.pdf", b"%PDF".to_vec())])
            .unwrap();
        v.submit().await;
        v.render()
    }

    #[tokio::test]
    async fn colored_panes_escape_server_control_codes() {
        let page = hostile_page(true).await;
        assert!(!page.contains("\x1b[2J"));
        assert!(!page.contains('\x07'));
        assert!(page.contains("# Title\\u{1b}[2J\twide"));
        assert!(page.contains("ok\\u{7}"));
    }

    #[tokio::test]
    async fn plain_panes_keep_text_verbatim() {
        let page = hostile_page(false).await;
        assert!(page.contains("│ # Title\x1b[2J\twide\n"));
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2 * 1024 * 1024), "2.0 MiB");
        assert_eq!(format_size(1536), "1.5 KiB");
    }
}
