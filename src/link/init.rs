use std::collections::VecDeque;

use asynchronix::model::{Model, Output};
use asynchronix::time::Scheduler;
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::flit::{ControlFlit, ControlKind, CreditChannel, Credits};
use super::common::LinkSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Start,
    SendRetryIdle,
    WaitRetryIdle,
    SendInitParam,
    WaitInitParam,
    SendCredit,
    Done,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkInitError {
    #[error("unexpected {kind:?} control flit in {state:?}")]
    Unexpected { state: InitState, kind: ControlKind },

    #[error("timed out in {state:?}")]
    Timeout { state: InitState },
}

/// What the sequencer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitEvent {
    /// The startup delay has elapsed.
    Started,
    Received(ControlFlit),
    /// A timeout armed in the given epoch fired.
    TimedOut(u64),
}

/// Effects of one event.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InitStep {
    /// Control flits to hand to the encoder, in order.
    pub flits: Vec<ControlFlit>,
    /// Epoch of a timeout that must now be armed.
    pub arm_timeout: Option<u64>,
}

/// One-shot link initialization handshake.
///
/// RETRY.Idle exchange, then INIT.Param exchange, then credit return. Flits
/// received before the sequencer waits for them stay queued. Any failure is
/// terminal: the handshake is never retried.
pub struct LinkInit {
    state: InitState,
    spec: LinkSpec,
    inbox: VecDeque<ControlFlit>,
    epoch: u64,
    pub o_ctrl: Output<ControlFlit>,
    pub o_outcome: Output<Result<(), LinkInitError>>,
    pub o_link_up: Output<()>,
}

impl LinkInit {
    pub fn new(spec: LinkSpec) -> Self {
        LinkInit {
            state: InitState::Start,
            spec,
            inbox: VecDeque::new(),
            epoch: 0,
            o_ctrl: Output::new(),
            o_outcome: Output::new(),
            o_link_up: Output::new(),
        }
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    pub fn handle(&mut self, event: InitEvent) -> Result<InitStep, LinkInitError> {
        let mut step = InitStep::default();
        match event {
            InitEvent::Started if self.state == InitState::Start => {
                self.enter(InitState::SendRetryIdle, &mut step);
            }
            InitEvent::Received(flit) => {
                if matches!(self.state, InitState::Done | InitState::Error) {
                    debug!("ignoring {:?} after handshake", flit.kind());
                    return Ok(step);
                }
                self.inbox.push_back(flit);
            }
            InitEvent::TimedOut(epoch) if epoch == self.epoch && self.is_waiting() => {
                let state = self.state;
                self.state = InitState::Error;
                error!("link init timed out in {:?}", state);
                return Err(LinkInitError::Timeout { state });
            }
            _ => return Ok(step),
        }
        self.pump(&mut step)?;
        Ok(step)
    }

    fn is_waiting(&self) -> bool {
        matches!(self.state, InitState::WaitRetryIdle | InitState::WaitInitParam)
    }

    /// Moves to `state` and runs every send state until the next wait.
    fn enter(&mut self, state: InitState, step: &mut InitStep) {
        info!("link init: {:?}", state);
        self.state = state;
        match state {
            InitState::SendRetryIdle => {
                step.flits.push(ControlFlit::retry_idle(self.spec.retry_buffer_size));
                self.enter(InitState::WaitRetryIdle, step);
            }
            InitState::SendInitParam => {
                step.flits.push(ControlFlit::init_param(self.spec.retry_buffer_size));
                self.enter(InitState::WaitInitParam, step);
            }
            InitState::SendCredit => {
                for _ in 0..self.spec.credit_rounds {
                    for channel in [CreditChannel::Mem, CreditChannel::Cache] {
                        let credits = Credits::ret(channel, self.spec.credits_per_return);
                        step.flits.push(ControlFlit::llcrd_ack(credits));
                    }
                }
                self.enter(InitState::Done, step);
            }
            InitState::WaitRetryIdle | InitState::WaitInitParam => {
                self.epoch += 1;
                step.arm_timeout = Some(self.epoch);
            }
            InitState::Start | InitState::Done | InitState::Error => (),
        }
    }

    /// Consumes queued flits while waiting.
    fn pump(&mut self, step: &mut InitStep) -> Result<(), LinkInitError> {
        while self.is_waiting() {
            let Some(flit) = self.inbox.pop_front() else { break };
            let kind = flit.kind();
            match (self.state, kind) {
                (InitState::WaitRetryIdle, ControlKind::RetryIdle) => {
                    self.enter(InitState::SendInitParam, step);
                }
                (InitState::WaitRetryIdle, ControlKind::RetryAck | ControlKind::LlcrdAck) => {
                    debug!("ack while waiting for RETRY.Idle");
                }
                (InitState::WaitInitParam, _) if flit.is_init() => {
                    self.enter(InitState::SendCredit, step);
                }
                (state, kind) => {
                    self.state = InitState::Error;
                    error!("link init: unexpected {:?} in {:?}", kind, state);
                    return Err(LinkInitError::Unexpected { state, kind });
                }
            }
        }
        Ok(())
    }

    /// Arms the timeout of `epoch`. A zero window, or one the scheduler
    /// cannot place in the future, expires on the spot.
    fn arm(&mut self, epoch: u64, scheduler: &Scheduler<Self>) -> Result<(), LinkInitError> {
        if !self.spec.init_timeout.is_zero() {
            let deadline = scheduler.time() + self.spec.init_timeout;
            match scheduler.schedule_event(deadline, Self::_on_timeout, epoch) {
                Ok(()) => return Ok(()),
                Err(e) => warn!("could not arm init timeout: {:?}", e),
            }
        }
        self.handle(InitEvent::TimedOut(epoch)).map(|_| ())
    }

    async fn apply(&mut self, result: Result<InitStep, LinkInitError>, scheduler: &Scheduler<Self>) {
        let step = match result {
            Ok(step) => step,
            Err(e) => return self.o_outcome.send(Err(e)).await,
        };
        for flit in step.flits {
            self.o_ctrl.send(flit).await;
        }
        if let Some(epoch) = step.arm_timeout {
            if let Err(e) = self.arm(epoch, scheduler) {
                return self.o_outcome.send(Err(e)).await;
            }
        }
        if self.state == InitState::Done {
            info!("link up");
            self.o_link_up.send(()).await;
            self.o_outcome.send(Ok(())).await;
        }
    }

    // inputs (internal inputs are prefixed with _)

    pub async fn on_start(&mut self, _: (), scheduler: &Scheduler<Self>) {
        if !self.spec.startup_delay.is_zero() {
            let deadline = scheduler.time() + self.spec.startup_delay;
            match scheduler.schedule_event(deadline, Self::_on_started, ()) {
                Ok(()) => return,
                Err(e) => warn!("could not schedule link init start: {:?}", e),
            }
        }
        self._on_started((), scheduler).await;
    }

    async fn _on_started(&mut self, _: (), scheduler: &Scheduler<Self>) {
        let result = self.handle(InitEvent::Started);
        self.apply(result, scheduler).await;
    }

    pub async fn on_ctrl(&mut self, flit: ControlFlit, scheduler: &Scheduler<Self>) {
        let was_done = self.state == InitState::Done;
        let result = self.handle(InitEvent::Received(flit));
        if was_done {
            return;
        }
        self.apply(result, scheduler).await;
    }

    // a timeout step never carries flits
    async fn _on_timeout(&mut self, epoch: u64) {
        if let Err(e) = self.handle(InitEvent::TimedOut(epoch)) {
            self.o_outcome.send(Err(e)).await;
        }
    }
}

impl Model for LinkInit {}
