use web2md_core::{update, InputOrigin, Msg, PipelineState, Status};

#[test]
fn converted_before_start_is_noop() {
    let state = PipelineState::new(InputOrigin::Url);
    let (next, effects) = update(state.clone(), Msg::Converted { empty: false });

    assert_eq!(state, next);
    assert_eq!(next.status(), Status::Idle);
    assert!(effects.is_empty());
}
