use cxlsim_flit::flit::*;
use cxlsim_flit::link::*;

fn started(init: &mut LinkInit) -> InitStep {
    init.handle(InitEvent::Started).unwrap()
}

#[test]
fn test_handshake_completes() {
    let spec = LinkSpec::default();
    let mut init = LinkInit::new(spec);
    assert_eq!(init.state(), InitState::Start);

    let step = started(&mut init);
    assert_eq!(step.flits, vec![ControlFlit::retry_idle(spec.retry_buffer_size)]);
    assert_eq!(step.arm_timeout, Some(1));
    assert_eq!(init.state(), InitState::WaitRetryIdle);

    let step = init.handle(InitEvent::Received(ControlFlit::retry_idle(64))).unwrap();
    assert_eq!(step.flits, vec![ControlFlit::init_param(spec.retry_buffer_size)]);
    assert_eq!(step.arm_timeout, Some(2));
    assert_eq!(init.state(), InitState::WaitInitParam);

    let step = init.handle(InitEvent::Received(ControlFlit::init_param(64))).unwrap();
    assert_eq!(init.state(), InitState::Done);
    assert_eq!(step.arm_timeout, None);
    assert_eq!(step.flits.len(), 14);
    assert!(step.flits.iter().all(|f| f.kind() == ControlKind::LlcrdAck));
    assert_eq!(step.flits[0].credits, Credits::ret(CreditChannel::Mem, 7));
    assert_eq!(step.flits[1].credits, Credits::ret(CreditChannel::Cache, 7));
}

#[test]
fn test_timeout_is_fatal() {
    let mut init = LinkInit::new(LinkSpec::default());
    let epoch = started(&mut init).arm_timeout.unwrap();
    assert_eq!(
        init.handle(InitEvent::TimedOut(epoch)),
        Err(LinkInitError::Timeout { state: InitState::WaitRetryIdle })
    );
    assert_eq!(init.state(), InitState::Error);

    // nothing brings it back
    let step = init.handle(InitEvent::Received(ControlFlit::retry_idle(64))).unwrap();
    assert!(step.flits.is_empty());
    assert_eq!(init.state(), InitState::Error);
}

#[test]
fn test_stale_timeout_is_ignored() {
    let mut init = LinkInit::new(LinkSpec::default());
    let first = started(&mut init).arm_timeout.unwrap();
    init.handle(InitEvent::Received(ControlFlit::retry_idle(64))).unwrap();

    let step = init.handle(InitEvent::TimedOut(first)).unwrap();
    assert_eq!(step, InitStep::default());
    assert_eq!(init.state(), InitState::WaitInitParam);
}

#[test]
fn test_unexpected_flit_while_waiting() {
    let mut init = LinkInit::new(LinkSpec::default());
    started(&mut init);
    let req = ControlFlit { llctrl: LLCTRL_RETRY, sub_type: RETRY_REQ, ..Default::default() };
    assert_eq!(
        init.handle(InitEvent::Received(req)),
        Err(LinkInitError::Unexpected { state: InitState::WaitRetryIdle, kind: ControlKind::RetryReq })
    );
    assert_eq!(init.state(), InitState::Error);
}

#[test]
fn test_acks_tolerated_before_retry_idle() {
    let mut init = LinkInit::new(LinkSpec::default());
    started(&mut init);
    let ack = ControlFlit::llcrd_ack(Credits::ret(CreditChannel::Cache, 1));
    let step = init.handle(InitEvent::Received(ack)).unwrap();
    assert!(step.flits.is_empty());
    assert_eq!(init.state(), InitState::WaitRetryIdle);
}

#[test]
fn test_init_wait_is_strict() {
    let mut init = LinkInit::new(LinkSpec::default());
    started(&mut init);
    init.handle(InitEvent::Received(ControlFlit::retry_idle(64))).unwrap();
    let result = init.handle(InitEvent::Received(ControlFlit::retry_idle(64)));
    assert_eq!(
        result,
        Err(LinkInitError::Unexpected { state: InitState::WaitInitParam, kind: ControlKind::RetryIdle })
    );
}

#[test]
fn test_early_flits_are_queued() {
    let mut init = LinkInit::new(LinkSpec::default());
    init.handle(InitEvent::Received(ControlFlit::retry_idle(64))).unwrap();
    init.handle(InitEvent::Received(ControlFlit::init_param(64))).unwrap();
    assert_eq!(init.state(), InitState::Start);

    let step = started(&mut init);
    assert_eq!(init.state(), InitState::Done);
    // RETRY.Idle, INIT.Param, then the credit flits
    assert_eq!(step.flits.len(), 16);
}

#[test]
fn test_credit_rounds_follow_config() {
    let spec = LinkSpec { credit_rounds: 2, credits_per_return: 3, ..Default::default() };
    let mut init = LinkInit::new(spec);
    init.handle(InitEvent::Received(ControlFlit::retry_idle(64))).unwrap();
    init.handle(InitEvent::Received(ControlFlit::init_param(64))).unwrap();
    let step = started(&mut init);
    let credits: Vec<_> = step.flits.iter().filter(|f| f.kind() == ControlKind::LlcrdAck).collect();
    assert_eq!(credits.len(), 4);
    assert_eq!(credits[0].credits.rsp, 0b1011);
}
