use std::io::{self, Write};

use tracker_core::{AppViewModel, PrimaryAction, ProgressView, StatusKind};

const BAR_WIDTH: usize = 20;

/// One terminal line for the current view; empty while idle.
pub(crate) fn render_line(view: &AppViewModel) -> String {
    let progress = &view.progress;
    let body = match progress.status {
        StatusKind::Idle => return String::new(),
        StatusKind::Processing => processing_line(progress),
        StatusKind::Success => success_line(progress),
        StatusKind::Error => error_line(progress),
    };

    let mut prefix = String::new();
    if let Some(label) = &view.job_label {
        prefix.push_str(label);
        prefix.push(' ');
    }
    if view.attempt > 1 {
        prefix.push_str(&format!("(第 {} 次) ", view.attempt));
    }
    format!("{prefix}{body}")
}

fn bar(percentage: u8) -> String {
    let filled = usize::from(percentage.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn processing_line(progress: &ProgressView) -> String {
    let mut parts = vec![
        format!("{} {:>3}%", bar(progress.percentage), progress.percentage),
        progress.stage_label.clone(),
        progress.unit_text.clone(),
    ];
    if let Some(elapsed) = &progress.elapsed_text {
        parts.push(elapsed.clone());
    }
    if let Some(hint) = &progress.hint {
        parts.push(hint.clone());
    }
    parts.join(" | ")
}

fn success_line(progress: &ProgressView) -> String {
    let mut line = String::from("导出完成");
    if let Some(elapsed) = &progress.elapsed_text {
        line.push_str(&format!(" (用时 {elapsed})"));
    }
    if let Some(count) = progress.extra_count {
        line.push_str(&format!(", 识别文本块 {count} 个"));
    }
    if let PrimaryAction::Download { url } = &progress.primary_action {
        line.push_str(&format!(": {url}"));
    }
    line
}

fn error_line(progress: &ProgressView) -> String {
    match &progress.primary_action {
        PrimaryAction::ShowError { message } => format!("导出失败: {message}"),
        PrimaryAction::None | PrimaryAction::Download { .. } => "导出失败".to_string(),
    }
}

/// Redraws a single status line in place; terminal states end the line.
pub(crate) struct TerminalRenderer<W: Write> {
    out: W,
    last_width: usize,
}

impl<W: Write> TerminalRenderer<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out, last_width: 0 }
    }

    pub(crate) fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        let line = render_line(view);
        if line.is_empty() {
            return Ok(());
        }
        let width = line.chars().count();
        let padding = " ".repeat(self.last_width.saturating_sub(width));
        write!(self.out, "\r{line}{padding}")?;

        if view.progress.status == StatusKind::Processing {
            self.last_width = width;
        } else {
            writeln!(self.out)?;
            self.last_width = 0;
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processing_view() -> AppViewModel {
        AppViewModel {
            job_label: None,
            attempt: 1,
            progress: ProgressView {
                status: StatusKind::Processing,
                percentage: 45,
                stage_label: "解析页面".to_string(),
                unit_text: "9 / 20".to_string(),
                elapsed_text: Some("1:05".to_string()),
                hint: Some("正在识别文字".to_string()),
                ..ProgressView::default()
            },
            dirty: true,
        }
    }

    #[test]
    fn processing_line_has_bar_and_details() {
        assert_eq!(
            render_line(&processing_view()),
            "[#########-----------]  45% | 解析页面 | 9 / 20 | 1:05 | 正在识别文字"
        );
    }

    #[test]
    fn label_and_retry_attempt_prefix_the_line() {
        let mut view = processing_view();
        view.job_label = Some("editable-pptx (p1)".to_string());
        view.attempt = 2;
        assert!(render_line(&view).starts_with("editable-pptx (p1) (第 2 次) [#########"));
    }

    #[test]
    fn success_line_shows_download() {
        let view = AppViewModel {
            progress: ProgressView {
                status: StatusKind::Success,
                percentage: 100,
                elapsed_text: Some("45 秒".to_string()),
                extra_count: Some(12),
                primary_action: PrimaryAction::Download {
                    url: "https://x/a.pptx".to_string(),
                },
                ..ProgressView::default()
            },
            ..AppViewModel::default()
        };
        assert_eq!(
            render_line(&view),
            "导出完成 (用时 45 秒), 识别文本块 12 个: https://x/a.pptx"
        );
    }

    #[test]
    fn idle_renders_nothing() {
        assert_eq!(render_line(&AppViewModel::default()), "");
    }

    #[test]
    fn renderer_overwrites_then_terminates_line() {
        let mut out = Vec::new();
        {
            let mut renderer = TerminalRenderer::new(&mut out);
            renderer.render(&processing_view()).unwrap();
            let failed = AppViewModel {
                progress: ProgressView {
                    status: StatusKind::Error,
                    primary_action: PrimaryAction::ShowError {
                        message: "已取消".to_string(),
                    },
                    ..ProgressView::default()
                },
                ..AppViewModel::default()
            };
            renderer.render(&failed).unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\r[#########"));
        assert!(text.contains("\r导出失败: 已取消 "));
        assert!(text.ends_with('\n'));
    }
}
