use pretty_assertions::assert_eq;
use tracker_core::{
    present, ElapsedTicker, JobProgress, PrimaryAction, ProgressNotification, ProgressView,
    StageHintRotator, StatusKind, DEFAULT_STAGE_LABEL,
};

#[test]
fn idle_job_presents_empty_progress() {
    let view = present(&JobProgress::default(), None, None);

    assert_eq!(
        view,
        ProgressView {
            status: StatusKind::Idle,
            percentage: 0,
            stage_label: DEFAULT_STAGE_LABEL.to_string(),
            unit_text: "0 / 0".to_string(),
            can_dismiss: false,
            primary_action: PrimaryAction::None,
            elapsed_text: None,
            hint: None,
            extra_count: None,
        }
    );
}

#[test]
fn processing_view_uses_current_unit_and_timers() {
    let mut job = JobProgress::begin(10);
    job.apply_update(&ProgressNotification {
        total: 10,
        completed: Some(3),
        current_page: Some(4),
        stage: Some("parsing".into()),
        stage_name: Some("解析第 4 页...".into()),
        ..ProgressNotification::default()
    })
    .unwrap();
    let mut ticker = ElapsedTicker::new();
    ticker.start();
    for _ in 0..12 {
        ticker.tick();
    }
    let mut hints = StageHintRotator::new(vec!["one".into(), "two".into()]);
    hints.start();
    hints.tick();

    let view = present(&job, Some(&ticker), Some(&hints));

    assert_eq!(view.status, StatusKind::Processing);
    assert_eq!(view.percentage, 30);
    assert_eq!(view.unit_text, "4 / 10");
    assert_eq!(view.stage_label, "解析第 4 页...");
    assert_eq!(view.elapsed_text.as_deref(), Some("12 秒"));
    assert_eq!(view.hint.as_deref(), Some("two"));
    assert!(!view.can_dismiss);
    assert_eq!(view.primary_action, PrimaryAction::None);
}

#[test]
fn success_offers_download_and_hides_hint() {
    let mut job = JobProgress::begin(2);
    job.mark_success("https://x/file.pptx", Some(7)).unwrap();
    let hints = StageHintRotator::default();

    let view = present(&job, None, Some(&hints));

    assert!(view.can_dismiss);
    assert_eq!(view.hint, None);
    assert_eq!(view.extra_count, Some(7));
    assert_eq!(
        view.primary_action,
        PrimaryAction::Download {
            url: "https://x/file.pptx".to_string()
        }
    );
}

#[test]
fn error_shows_message_and_keeps_last_progress() {
    let mut job = JobProgress::begin(4);
    job.apply_update(&ProgressNotification {
        total: 4,
        completed: Some(3),
        stage_name: Some("第 3 页完成".into()),
        ..ProgressNotification::default()
    })
    .unwrap();
    job.mark_failure("OCR 服务不可用").unwrap();

    let view = present(&job, None, None);

    assert!(view.can_dismiss);
    assert_eq!(view.percentage, 75);
    assert_eq!(view.stage_label, "第 3 页完成");
    assert_eq!(
        view.primary_action,
        PrimaryAction::ShowError {
            message: "OCR 服务不可用".to_string()
        }
    );
}

#[test]
fn can_dismiss_only_in_terminal_states() {
    let idle = JobProgress::default();
    let processing = JobProgress::begin(1);
    let mut success = JobProgress::begin(1);
    success.mark_success("u", None).unwrap();
    let mut error = JobProgress::begin(1);
    error.mark_failure("e").unwrap();

    let flags: Vec<bool> = [idle, processing, success, error]
        .iter()
        .map(|job| present(job, None, None).can_dismiss)
        .collect();
    assert_eq!(flags, vec![false, false, true, true]);
}
