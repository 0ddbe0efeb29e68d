use tracker_core::{update, AppState, Msg};

#[test]
fn ticks_without_a_job_change_nothing() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::TickerTick);
    let (next, more) = update(next, Msg::HintTick);

    assert_eq!(state, next);
    assert!(effects.is_empty());
    assert!(more.is_empty());
}

#[test]
fn user_actions_without_a_job_are_ignored() {
    let mut state = AppState::new();
    for msg in [
        Msg::CancelClicked,
        Msg::RetryClicked,
        Msg::DownloadClicked,
        Msg::DismissClicked,
    ] {
        let (next, effects) = update(state.clone(), msg);
        assert_eq!(state, next);
        assert!(effects.is_empty());
        state = next;
    }
}
