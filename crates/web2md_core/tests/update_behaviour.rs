use std::sync::Once;

use pretty_assertions::assert_eq;
use web2md_core::{
    update, Effect, InputOrigin, LogLevel, Msg, PipelineState, Status, EMPTY_AFTER_RETRY,
    EMPTY_CONTENT,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn drive(origin: InputOrigin, msgs: Vec<Msg>) -> (PipelineState, Vec<Effect>) {
    let mut state = PipelineState::new(origin);
    let mut all = Vec::new();
    for msg in msgs {
        let (next, effects) = update(state, msg);
        state = next;
        all.extend(effects);
    }
    (state, all)
}

fn statuses(effects: &[Effect]) -> Vec<Status> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::EmitStatus(status) => Some(*status),
            _ => None,
        })
        .collect()
}

#[test]
fn url_run_walks_every_stage() {
    init_logging();
    let (state, effects) = drive(
        InputOrigin::Url,
        vec![
            Msg::Started,
            Msg::Fetched,
            Msg::Cleaned,
            Msg::Converted { empty: false },
        ],
    );

    assert_eq!(state.status(), Status::Success);
    assert_eq!(
        effects,
        vec![
            Effect::EmitStatus(Status::Scraping),
            Effect::Fetch,
            Effect::EmitStatus(Status::Cleaning),
            Effect::Clean,
            Effect::EmitStatus(Status::Converting),
            Effect::Convert,
            Effect::EmitStatus(Status::Success),
            Effect::Complete,
        ]
    );
}

#[test]
fn html_run_skips_scraping() {
    init_logging();
    let (state, effects) = drive(
        InputOrigin::Html,
        vec![Msg::Started, Msg::Cleaned, Msg::Converted { empty: false }],
    );

    assert_eq!(state.status(), Status::Success);
    assert_eq!(
        statuses(&effects),
        vec![Status::Cleaning, Status::Converting, Status::Success]
    );
    assert!(!effects.contains(&Effect::Fetch));
}

#[test]
fn empty_conversion_retries_once_for_url_runs() {
    init_logging();
    let (state, effects) = drive(
        InputOrigin::Url,
        vec![
            Msg::Started,
            Msg::Fetched,
            Msg::Cleaned,
            Msg::Converted { empty: true },
        ],
    );

    assert_eq!(state.status(), Status::Converting);
    assert!(state.has_retried());
    assert_eq!(effects.last(), Some(&Effect::RetryWithBrowser));
    assert!(matches!(
        &effects[effects.len() - 2],
        Effect::EmitLog {
            level: LogLevel::Warn,
            auto_enable_browser: true,
            ..
        }
    ));

    let (state, effects) = update(state, Msg::Converted { empty: false });
    assert_eq!(state.status(), Status::Success);
    assert_eq!(
        effects,
        vec![Effect::EmitStatus(Status::Success), Effect::Complete]
    );
}

#[test]
fn second_empty_conversion_is_terminal() {
    init_logging();
    let (state, effects) = drive(
        InputOrigin::Url,
        vec![
            Msg::Started,
            Msg::Fetched,
            Msg::Cleaned,
            Msg::Converted { empty: true },
            Msg::Converted { empty: true },
        ],
    );

    assert_eq!(state.status(), Status::Error);
    assert_eq!(
        effects.iter().filter(|e| **e == Effect::RetryWithBrowser).count(),
        1
    );
    assert_eq!(
        effects.last(),
        Some(&Effect::Fail {
            message: EMPTY_AFTER_RETRY.to_string()
        })
    );
}

#[test]
fn html_runs_never_retry() {
    init_logging();
    let (state, effects) = drive(
        InputOrigin::Html,
        vec![Msg::Started, Msg::Cleaned, Msg::Converted { empty: true }],
    );

    assert_eq!(state.status(), Status::Error);
    assert!(!effects.contains(&Effect::RetryWithBrowser));
    assert_eq!(
        &effects[effects.len() - 2..],
        &[
            Effect::EmitStatus(Status::Error),
            Effect::Fail {
                message: EMPTY_CONTENT.to_string()
            }
        ]
    );
}

#[test]
fn failure_emits_error_status_then_message() {
    init_logging();
    let (state, effects) = drive(
        InputOrigin::Url,
        vec![
            Msg::Started,
            Msg::Failed {
                message: "Failed to fetch via proxy: boom".to_string(),
            },
        ],
    );

    assert_eq!(state.status(), Status::Error);
    assert_eq!(
        &effects[2..],
        &[
            Effect::EmitStatus(Status::Error),
            Effect::Fail {
                message: "Failed to fetch via proxy: boom".to_string()
            }
        ]
    );
}

#[test]
fn nothing_follows_a_terminal_state() {
    init_logging();
    let (state, _) = drive(
        InputOrigin::Url,
        vec![
            Msg::Started,
            Msg::Failed {
                message: "x".to_string(),
            },
        ],
    );

    for msg in [
        Msg::Fetched,
        Msg::Cleaned,
        Msg::Converted { empty: false },
        Msg::Failed {
            message: "again".to_string(),
        },
    ] {
        let (next, effects) = update(state.clone(), msg);
        assert_eq!(next.status(), Status::Error);
        assert!(effects.is_empty());
    }
}

#[test]
fn out_of_order_messages_are_ignored() {
    init_logging();
    let (state, effects) = drive(InputOrigin::Url, vec![Msg::Started, Msg::Cleaned]);

    assert_eq!(state.status(), Status::Scraping);
    assert_eq!(effects, vec![Effect::EmitStatus(Status::Scraping), Effect::Fetch]);
}

#[test]
fn transition_table_only_allows_forward_moves() {
    assert!(Status::Idle.can_transition_to(Status::Scraping));
    assert!(Status::Scraping.can_transition_to(Status::Cleaning));
    assert!(Status::Converting.can_transition_to(Status::Error));
    assert!(!Status::Cleaning.can_transition_to(Status::Scraping));
    assert!(!Status::Success.can_transition_to(Status::Error));
    assert!(!Status::Error.can_transition_to(Status::Success));
    assert!(!Status::Scraping.can_transition_to(Status::Success));
    assert!(!Status::Converting.can_transition_to(Status::Converting));
}
