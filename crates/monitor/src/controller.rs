//! Monitor controller: enable/disable lifecycle around the detection poll

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use camera_session::{CameraDevice, CameraSession, ReleaseHandle, VideoSink};
use expression::{DetectionTick, DistressDetector};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::observer::DistressObserver;
use crate::state::{DistressLatch, MonitorState, MonitorStatus};
use crate::MonitorError;

/// Per-controller session bookkeeping, guarded by one lock
#[derive(Default)]
struct Slot {
    /// Bumped on every enable; stale tasks compare against it
    generation: u64,
    state: MonitorState,
    cancel: Option<CancellationToken>,
    release: Option<ReleaseHandle>,
    task: Option<JoinHandle<()>>,
    /// Tasks of disabled sessions that may still be unwinding
    retiring: Vec<JoinHandle<()>>,
    polling: bool,
    latch: DistressLatch,
}

struct Inner {
    camera: Arc<dyn CameraDevice>,
    detector: Arc<DistressDetector>,
    observer: Arc<dyn DistressObserver>,
    config: MonitorConfig,
    slot: Mutex<Slot>,
    status: watch::Sender<MonitorStatus>,
}

/// Drives webcam distress detection for one host.
///
/// Enabling spawns a session task on the current Tokio runtime. Disabling,
/// or dropping the controller, cancels that task, stops the poll and releases
/// the camera before returning.
pub struct MonitorController {
    inner: Arc<Inner>,
}

impl MonitorController {
    pub fn new(
        camera: Arc<dyn CameraDevice>,
        detector: Arc<DistressDetector>,
        observer: Arc<dyn DistressObserver>,
        config: MonitorConfig,
    ) -> Self {
        let (status, _) = watch::channel(MonitorStatus::default());
        Self {
            inner: Arc::new(Inner {
                camera,
                detector,
                observer,
                config,
                slot: Mutex::new(Slot::default()),
                status,
            }),
        }
    }

    /// Start a monitoring session. Returns `false` if one is already
    /// enabling or active. Must be called from within a Tokio runtime.
    pub fn enable(&self) -> bool {
        let mut slot = self.inner.lock();
        if slot.state != MonitorState::Disabled {
            return false;
        }

        slot.generation += 1;
        let generation = slot.generation;
        let cancel = CancellationToken::new();
        let session_id = Uuid::new_v4();
        let previous = std::mem::take(&mut slot.retiring);

        slot.cancel = Some(cancel.clone());
        slot.state = MonitorState::Enabling;
        slot.latch.reset();
        self.inner.publish(&slot, |s| {
            s.session_id = Some(session_id);
            s.last_error = None;
            s.ticks = 0;
            s.skipped_ticks = 0;
            s.distress_events = 0;
        });
        info!(session = %session_id, "Emotional monitor enabling");

        let inner = self.inner.clone();
        slot.task = Some(tokio::spawn(inner.run_session(generation, cancel, previous)));
        true
    }

    /// Stop the session: cancel the poll and release the camera.
    /// Returns `false` if the monitor was not enabled.
    pub fn disable(&self) -> bool {
        self.inner.shutdown("disabled")
    }

    /// Flip the toggle; returns the new enabled flag
    pub fn toggle(&self) -> bool {
        if self.is_enabled() {
            self.disable();
        } else {
            self.enable();
        }
        self.is_enabled()
    }

    pub fn set_enabled(&self, enabled: bool) -> bool {
        if enabled {
            self.enable()
        } else {
            self.disable()
        }
    }

    pub fn state(&self) -> MonitorState {
        self.inner.lock().state
    }

    pub fn is_enabled(&self) -> bool {
        self.state().is_enabled()
    }

    /// True while the detection poll is running
    pub fn is_polling(&self) -> bool {
        self.inner.lock().polling
    }

    pub fn status(&self) -> MonitorStatus {
        self.inner.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitorStatus> {
        self.inner.status.subscribe()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// Wait for disabled sessions to finish unwinding (late camera
    /// acquisitions included).
    pub async fn wait_idle(&self) {
        loop {
            let pending = std::mem::take(&mut self.inner.lock().retiring);
            if pending.is_empty() {
                return;
            }
            for task in pending {
                let _ = task.await;
            }
        }
    }
}

impl Drop for MonitorController {
    fn drop(&mut self) {
        self.inner.shutdown("teardown");
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, slot: &Slot, update: impl FnOnce(&mut MonitorStatus)) {
        self.status.send_modify(|status| {
            status.state = slot.state;
            status.latch = slot.latch.state();
            update(status);
        });
    }

    fn is_current(slot: &Slot, generation: u64, state: MonitorState) -> bool {
        slot.generation == generation && slot.state == state
    }

    fn shutdown(&self, reason: &str) -> bool {
        let mut slot = self.lock();
        if !slot.state.is_enabled() {
            return false;
        }

        slot.state = MonitorState::Disabling;
        self.publish(&slot, |_| {});

        if let Some(cancel) = slot.cancel.take() {
            cancel.cancel();
        }
        if let Some(release) = slot.release.take() {
            release.release();
        }
        slot.polling = false;
        slot.retiring.retain(|task| !task.is_finished());
        if let Some(task) = slot.task.take() {
            slot.retiring.push(task);
        }

        slot.state = MonitorState::Disabled;
        slot.latch.reset();
        self.publish(&slot, |_| {});
        metrics::gauge!("monitor_active").set(0.0);
        info!(reason, "Emotional monitor disabled");
        true
    }

    async fn run_session(
        self: Arc<Self>,
        generation: u64,
        cancel: CancellationToken,
        previous: Vec<JoinHandle<()>>,
    ) {
        for task in previous {
            let _ = task.await;
        }
        if cancel.is_cancelled() {
            debug!("Session disabled before acquiring the camera");
            return;
        }

        let acquire = CameraSession::acquire(self.camera.as_ref(), &self.config.constraints);
        tokio::pin!(acquire);
        let mut models = Box::pin(self.detector.load_models());

        let mut acquired: Option<CameraSession> = None;
        let mut camera_settled = false;
        let mut loaded = false;

        // Err(None): cancelled. Err(Some(_)): startup failed.
        let outcome: Result<CameraSession, Option<MonitorError>> = loop {
            if loaded {
                if let Some(session) = acquired.take() {
                    break Ok(session);
                }
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Err(None),
                result = &mut acquire, if !camera_settled => {
                    camera_settled = true;
                    match result {
                        Ok(session) => acquired = Some(session),
                        Err(e) => break Err(Some(e.into())),
                    }
                }
                result = &mut models, if !loaded => match result {
                    Ok(()) => loaded = true,
                    Err(e) => break Err(Some(e.into())),
                },
            }
        };

        let mut session = match outcome {
            Ok(session) => session,
            Err(err) => {
                match err {
                    Some(err) => self.fail(generation, err, acquired.take()),
                    None => {
                        if let Some(mut session) = acquired.take() {
                            session.release();
                        }
                    }
                }
                // Rolls back an unfinished load before waiting on the camera.
                drop(models);
                if !camera_settled {
                    if let Ok(mut late) = acquire.await {
                        debug!(stream = %late.stream_id(), "Releasing camera acquired after startup ended");
                        late.release();
                    }
                }
                return;
            }
        };

        let sink = VideoSink::new();
        if let Err(e) = session.bind_to_sink(sink.clone()) {
            return self.fail(generation, e.into(), Some(session));
        }
        if !self.register_stream(generation, session.release_handle()) {
            session.release();
            return;
        }

        let ready = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            ready = session.await_ready(&self.config.readiness) => ready,
        };
        if let Err(e) = ready {
            return self.fail(generation, e.into(), Some(session));
        }

        if !self.activate(generation) {
            session.release();
            return;
        }

        self.poll(generation, &cancel, &sink).await;

        session.release();
        self.finish_polling(generation);
    }

    async fn poll(&self, generation: u64, cancel: &CancellationToken, sink: &VideoSink) {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some(frame) = sink.latest_frame() else {
                self.record_skip(generation, "no frame decoded");
                continue;
            };
            if cancel.is_cancelled() {
                break;
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.detector.detect(&frame) => result,
            };

            match result {
                Ok(tick) => self.record_tick(generation, &tick),
                Err(e) => {
                    warn!("Detection tick failed: {}", e);
                    self.record_skip(generation, "detection failed");
                }
            }
        }
    }

    fn register_stream(&self, generation: u64, release: ReleaseHandle) -> bool {
        let mut slot = self.lock();
        if !Self::is_current(&slot, generation, MonitorState::Enabling) {
            return false;
        }
        slot.release = Some(release);
        true
    }

    fn activate(&self, generation: u64) -> bool {
        let mut slot = self.lock();
        if !Self::is_current(&slot, generation, MonitorState::Enabling) {
            return false;
        }
        slot.state = MonitorState::Active;
        slot.polling = true;
        self.publish(&slot, |_| {});
        metrics::gauge!("monitor_active").set(1.0);
        info!(
            interval_ms = self.config.poll_interval_ms,
            "Emotional monitor active"
        );
        true
    }

    fn finish_polling(&self, generation: u64) {
        let mut slot = self.lock();
        if slot.generation == generation {
            slot.polling = false;
        }
    }

    fn record_tick(&self, generation: u64, tick: &DetectionTick) {
        let rising = {
            let mut slot = self.lock();
            if !Self::is_current(&slot, generation, MonitorState::Active) {
                return;
            }
            metrics::counter!("monitor_ticks_total").increment(1);

            let distressed = self.detector.is_distressed(tick);
            let rising = slot.latch.observe(distressed);
            self.publish(&slot, |s| {
                s.ticks += 1;
                if rising {
                    s.distress_events += 1;
                }
            });
            rising
        };
        if !rising {
            return;
        }

        metrics::counter!("monitor_distress_events_total").increment(1);
        info!(
            sad = tick.sad_score,
            fear = tick.fear_score,
            "Distress detected"
        );
        // Disabled between the tick and here: drop the event.
        if !Self::is_current(&self.lock(), generation, MonitorState::Active) {
            return;
        }
        self.observer.on_distress_detected();
    }

    fn record_skip(&self, generation: u64, reason: &str) {
        let slot = self.lock();
        if !Self::is_current(&slot, generation, MonitorState::Active) {
            return;
        }
        metrics::counter!("monitor_tick_failures_total").increment(1);
        debug!(reason, "Detection tick skipped");
        self.publish(&slot, |s| s.skipped_ticks += 1);
    }

    fn fail(&self, generation: u64, err: MonitorError, session: Option<CameraSession>) {
        if let Some(mut session) = session {
            session.release();
        }

        let mut slot = self.lock();
        if !Self::is_current(&slot, generation, MonitorState::Enabling) {
            return;
        }
        if let Some(release) = slot.release.take() {
            release.release();
        }
        slot.cancel = None;
        slot.task = None;
        slot.polling = false;
        slot.state = MonitorState::Disabled;
        warn!("Emotional monitor could not start: {}", err);
        self.publish(&slot, |s| s.last_error = Some(err.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use camera_session::{CameraConstraints, CameraError, MediaStream, ReadinessPolicy, VideoFrame};
    use expression::{
        DetectionConfig, ExpressionError, ExpressionModel, ExpressionScores, FaceBox,
        FaceExpressions, ModelLoader, ModelSource, ModelState,
    };
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Clone)]
    enum CameraBehaviour {
        ReadyAfter(Duration),
        NeverReady,
        Fail(CameraError),
        Gated(Arc<Notify>),
    }

    struct FakeStream {
        id: Uuid,
        stops: Arc<AtomicUsize>,
        live: AtomicBool,
        ready_after: Option<Duration>,
    }

    impl MediaStream for FakeStream {
        fn id(&self) -> Uuid {
            self.id
        }

        fn attach(&self, sink: VideoSink) {
            if let Some(delay) = self.ready_after {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    sink.present(VideoFrame::filled(8, 8, [120, 110, 100]));
                });
            }
        }

        fn stop_tracks(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.live.store(false, Ordering::SeqCst);
        }

        fn is_live(&self) -> bool {
            self.live.load(Ordering::SeqCst)
        }
    }

    struct FakeCamera {
        behaviour: CameraBehaviour,
        opened: AtomicUsize,
        stops: Arc<AtomicUsize>,
    }

    impl FakeCamera {
        fn new(behaviour: CameraBehaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                opened: AtomicUsize::new(0),
                stops: Arc::new(AtomicUsize::new(0)),
            })
        }

        fn stops(&self) -> usize {
            self.stops.load(Ordering::SeqCst)
        }

        fn opened(&self) -> usize {
            self.opened.load(Ordering::SeqCst)
        }

        fn stream(&self, ready_after: Option<Duration>) -> Arc<dyn MediaStream> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Arc::new(FakeStream {
                id: Uuid::new_v4(),
                stops: self.stops.clone(),
                live: AtomicBool::new(true),
                ready_after,
            })
        }
    }

    #[async_trait]
    impl CameraDevice for FakeCamera {
        async fn open(
            &self,
            _constraints: &CameraConstraints,
        ) -> Result<Arc<dyn MediaStream>, CameraError> {
            match &self.behaviour {
                CameraBehaviour::ReadyAfter(delay) => Ok(self.stream(Some(*delay))),
                CameraBehaviour::NeverReady => Ok(self.stream(None)),
                CameraBehaviour::Fail(e) => Err(e.clone()),
                CameraBehaviour::Gated(gate) => {
                    gate.notified().await;
                    Ok(self.stream(Some(Duration::ZERO)))
                }
            }
        }
    }

    #[derive(Clone, Copy)]
    enum Step {
        NoFace,
        Face(f32, f32),
        Fail,
    }

    /// Replays a script of detections, repeating the last step
    struct ScriptedModel {
        script: Mutex<VecDeque<Step>>,
        last: Mutex<Step>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExpressionModel for ScriptedModel {
        async fn detect_single_face(
            &self,
            _frame: &VideoFrame,
        ) -> Result<Option<FaceExpressions>, ExpressionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = {
                let mut script = self.script.lock().unwrap();
                let mut last = self.last.lock().unwrap();
                if let Some(step) = script.pop_front() {
                    *last = step;
                }
                *last
            };
            match step {
                Step::NoFace => Ok(None),
                Step::Fail => Err(ExpressionError::Inference("frame read error".into())),
                Step::Face(sad, fearful) => Ok(Some(FaceExpressions {
                    face: FaceBox {
                        x: 0.0,
                        y: 0.0,
                        width: 8.0,
                        height: 8.0,
                        score: 0.9,
                    },
                    scores: ExpressionScores {
                        sad,
                        fearful,
                        ..Default::default()
                    },
                })),
            }
        }
    }

    /// Sleeps through every detection and reports a distressed face
    #[derive(Default)]
    struct SlowModel {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
        finished: AtomicUsize,
    }

    impl SlowModel {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn finished(&self) -> usize {
            self.finished.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExpressionModel for SlowModel {
        async fn detect_single_face(
            &self,
            _frame: &VideoFrame,
        ) -> Result<Option<FaceExpressions>, ExpressionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2500)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(Some(FaceExpressions {
                face: FaceBox {
                    x: 0.0,
                    y: 0.0,
                    width: 8.0,
                    height: 8.0,
                    score: 0.9,
                },
                scores: ExpressionScores {
                    sad: 0.9,
                    ..Default::default()
                },
            }))
        }
    }

    struct FixedSource {
        model: Arc<dyn ExpressionModel>,
        fail: bool,
        delay: Duration,
    }

    #[async_trait]
    impl ModelSource for FixedSource {
        async fn load(&self) -> Result<Arc<dyn ExpressionModel>, ExpressionError> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(ExpressionError::ModelLoad("404 /models".into()));
            }
            Ok(self.model.clone())
        }

        fn describe(&self) -> String {
            "fixed".into()
        }
    }

    fn counting_observer() -> (Arc<dyn DistressObserver>, Arc<AtomicUsize>) {
        let events = Arc::new(AtomicUsize::new(0));
        let counter = events.clone();
        let observer: Arc<dyn DistressObserver> = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (observer, events)
    }

    fn controller(
        camera: Arc<FakeCamera>,
        source: FixedSource,
        observer: Arc<dyn DistressObserver>,
        readiness: ReadinessPolicy,
    ) -> (MonitorController, Arc<ModelLoader>) {
        let loader = Arc::new(ModelLoader::new(Arc::new(source)));
        let detector = Arc::new(DistressDetector::new(loader.clone(), DetectionConfig::default()));
        let config = MonitorConfig {
            readiness,
            ..Default::default()
        };
        (
            MonitorController::new(camera, detector, observer, config),
            loader,
        )
    }

    struct Harness {
        controller: MonitorController,
        camera: Arc<FakeCamera>,
        model: Arc<ScriptedModel>,
        loader: Arc<ModelLoader>,
        events: Arc<AtomicUsize>,
    }

    impl Harness {
        fn new(behaviour: CameraBehaviour, script: Vec<Step>) -> Self {
            Self::build(
                behaviour,
                script,
                false,
                Duration::from_millis(20),
                ReadinessPolicy::default(),
            )
        }

        fn build(
            behaviour: CameraBehaviour,
            script: Vec<Step>,
            model_fails: bool,
            load_delay: Duration,
            readiness: ReadinessPolicy,
        ) -> Self {
            let camera = FakeCamera::new(behaviour);
            let model = Arc::new(ScriptedModel {
                script: Mutex::new(script.into()),
                last: Mutex::new(Step::NoFace),
                calls: AtomicUsize::new(0),
            });
            let source = FixedSource {
                model: model.clone(),
                fail: model_fails,
                delay: load_delay,
            };
            let (observer, events) = counting_observer();
            let (controller, loader) = controller(camera.clone(), source, observer, readiness);
            Self {
                controller,
                camera,
                model,
                loader,
                events,
            }
        }

        fn events(&self) -> usize {
            self.events.load(Ordering::SeqCst)
        }

        async fn wait_for(&self, state: MonitorState) {
            wait_for(&self.controller, state).await;
        }
    }

    async fn wait_for(controller: &MonitorController, state: MonitorState) {
        let mut rx = controller.subscribe();
        tokio::time::timeout(Duration::from_secs(60), rx.wait_for(|s| s.state == state))
            .await
            .expect("state not reached")
            .expect("status channel closed");
    }

    fn ready_camera() -> CameraBehaviour {
        CameraBehaviour::ReadyAfter(Duration::from_millis(150))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_distressed_tick_raises_one_event() {
        let h = Harness::new(ready_camera(), vec![Step::NoFace, Step::Face(0.5, 0.0)]);

        assert!(h.controller.enable());
        assert_eq!(h.controller.state(), MonitorState::Enabling);
        h.wait_for(MonitorState::Active).await;

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(h.model.calls(), 1);
        assert_eq!(h.events(), 0);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(h.model.calls(), 2);
        assert_eq!(h.events(), 1);

        let status = h.controller.status();
        assert_eq!(status.ticks, 2);
        assert_eq!(status.distress_events, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_are_edge_triggered() {
        let h = Harness::new(
            ready_camera(),
            vec![
                Step::NoFace,
                Step::Face(0.6, 0.0),
                Step::Face(0.0, 0.7),
                Step::Face(0.5, 0.5),
                Step::Face(0.1, 0.1),
                Step::Face(0.9, 0.0),
            ],
        );

        h.controller.enable();
        h.wait_for(MonitorState::Active).await;
        tokio::time::sleep(Duration::from_millis(5500)).await;

        assert_eq!(h.model.calls(), 6);
        assert_eq!(h.events(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_denied_reverts_to_disabled() {
        let h = Harness::new(
            CameraBehaviour::Fail(CameraError::PermissionDenied("blocked".into())),
            vec![],
        );

        h.controller.enable();
        h.wait_for(MonitorState::Disabled).await;

        assert!(!h.controller.is_enabled());
        assert!(!h.controller.is_polling());
        let status = h.controller.status();
        assert!(status.last_error.unwrap().contains("permission denied"));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(h.model.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_model_failure_releases_camera() {
        let h = Harness::build(
            ready_camera(),
            vec![],
            true,
            Duration::from_millis(20),
            ReadinessPolicy::default(),
        );

        h.controller.enable();
        h.wait_for(MonitorState::Disabled).await;

        assert_eq!(h.camera.opened(), 1);
        assert_eq!(h.camera.stops(), 1);
        assert!(!h.controller.is_polling());
        assert!(h.controller.status().last_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_readiness_timeout_releases_camera() {
        let policy = ReadinessPolicy {
            poll_interval_ms: 100,
            max_polls: 3,
        };
        let h = Harness::build(
            CameraBehaviour::NeverReady,
            vec![],
            false,
            Duration::from_millis(20),
            policy,
        );

        h.controller.enable();
        h.wait_for(MonitorState::Disabled).await;

        assert_eq!(h.camera.stops(), 1);
        assert_eq!(h.model.calls(), 0);
        assert!(h
            .controller
            .status()
            .last_error
            .unwrap()
            .contains("never decoded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_before_camera_resolves_releases_late_stream() {
        let gate = Arc::new(Notify::new());
        let h = Harness::new(CameraBehaviour::Gated(gate.clone()), vec![Step::Face(0.9, 0.9)]);

        h.controller.enable();
        tokio::task::yield_now().await;
        assert!(h.controller.disable());
        assert_eq!(h.controller.state(), MonitorState::Disabled);

        gate.notify_one();
        h.controller.wait_idle().await;

        assert_eq!(h.camera.opened(), 1);
        assert_eq!(h.camera.stops(), 1);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(h.model.calls(), 0);
        assert_eq!(h.events(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_stops_polling_and_releases() {
        let h = Harness::new(ready_camera(), vec![Step::Face(0.1, 0.0)]);

        h.controller.enable();
        h.wait_for(MonitorState::Active).await;
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(h.model.calls(), 3);

        assert!(h.controller.disable());
        assert!(!h.controller.is_polling());
        assert_eq!(h.camera.stops(), 1);

        let calls = h.model.calls();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(h.model.calls(), calls);
        assert_eq!(h.camera.stops(), 1);
        assert!(!h.controller.disable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_tears_down_session() {
        let h = Harness::new(ready_camera(), vec![Step::Face(0.1, 0.0)]);
        h.controller.enable();
        h.wait_for(MonitorState::Active).await;

        let Harness {
            controller,
            camera,
            model,
            ..
        } = h;
        drop(controller);

        assert_eq!(camera.stops(), 1);
        let calls = model.calls();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(model.calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reenable_uses_a_fresh_stream() {
        let h = Harness::new(ready_camera(), vec![Step::Face(0.8, 0.0)]);

        h.controller.enable();
        h.wait_for(MonitorState::Active).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(h.events(), 1);

        h.controller.disable();
        assert!(h.controller.enable());
        h.wait_for(MonitorState::Active).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(h.camera.opened(), 2);
        assert_eq!(h.camera.stops(), 1);
        // Latch starts calm again in the new session.
        assert_eq!(h.events(), 2);

        h.controller.disable();
        assert_eq!(h.camera.stops(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_tick_is_swallowed() {
        let h = Harness::new(ready_camera(), vec![Step::Fail, Step::Face(0.0, 0.4)]);

        h.controller.enable();
        h.wait_for(MonitorState::Active).await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let status = h.controller.status();
        assert_eq!(status.state, MonitorState::Active);
        assert_eq!(status.skipped_ticks, 1);
        assert_eq!(status.ticks, 1);
        assert_eq!(h.events(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_is_idempotent_and_toggle_flips() {
        let h = Harness::new(ready_camera(), vec![]);

        assert!(h.controller.enable());
        assert!(!h.controller.enable());
        h.wait_for(MonitorState::Active).await;
        assert_eq!(h.camera.opened(), 1);

        assert!(!h.controller.toggle());
        assert_eq!(h.camera.stops(), 1);
        assert!(h.controller.toggle());
        h.wait_for(MonitorState::Active).await;
        assert_eq!(h.camera.opened(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_camera_denial_does_not_wait_for_model_load() {
        let h = Harness::build(
            CameraBehaviour::Fail(CameraError::PermissionDenied("blocked".into())),
            vec![],
            false,
            Duration::from_secs(10),
            ReadinessPolicy::default(),
        );

        h.controller.enable();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(h.controller.state(), MonitorState::Disabled);
        assert!(!h.controller.is_enabled());
        assert!(h
            .controller
            .status()
            .last_error
            .unwrap()
            .contains("permission denied"));
        // The unfinished load was abandoned, not left half done.
        assert_eq!(h.loader.state(), ModelState::Uninitialized);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_disabled_while_queued_never_opens_camera() {
        let gate = Arc::new(Notify::new());
        let h = Harness::new(CameraBehaviour::Gated(gate.clone()), vec![Step::Face(0.9, 0.9)]);

        h.controller.enable();
        tokio::task::yield_now().await;
        assert!(h.controller.disable());
        assert!(h.controller.enable());
        tokio::task::yield_now().await;
        assert!(h.controller.disable());

        gate.notify_one();
        gate.notify_one();
        h.controller.wait_idle().await;

        assert_eq!(h.camera.opened(), 1);
        assert_eq!(h.camera.stops(), 1);
        assert_eq!(h.controller.state(), MonitorState::Disabled);
        assert_eq!(h.model.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_detections_never_overlap() {
        let camera = FakeCamera::new(ready_camera());
        let model = Arc::new(SlowModel::default());
        let source = FixedSource {
            model: model.clone(),
            fail: false,
            delay: Duration::from_millis(20),
        };
        let (observer, events) = counting_observer();
        let (controller, _) = controller(camera, source, observer, ReadinessPolicy::default());

        controller.enable();
        wait_for(&controller, MonitorState::Active).await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(model.max_in_flight.load(Ordering::SeqCst), 1);
        // 2.5 s detections on a 1 s poll: missed ticks are skipped.
        assert!((3..=4).contains(&model.calls()), "calls = {}", model.calls());
        assert_eq!(controller.status().ticks, model.finished() as u64);
        assert_eq!(events.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_mid_detection_discards_result() {
        let camera = FakeCamera::new(ready_camera());
        let model = Arc::new(SlowModel::default());
        let source = FixedSource {
            model: model.clone(),
            fail: false,
            delay: Duration::from_millis(20),
        };
        let (observer, events) = counting_observer();
        let (controller, _) = controller(camera.clone(), source, observer, ReadinessPolicy::default());

        controller.enable();
        wait_for(&controller, MonitorState::Active).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(model.in_flight.load(Ordering::SeqCst), 1);

        assert!(controller.disable());
        assert_eq!(camera.stops(), 1);
        assert!(!controller.is_polling());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(model.calls(), 1);
        assert_eq!(model.finished(), 0);
        assert_eq!(controller.status().ticks, 0);
        assert_eq!(events.load(Ordering::SeqCst), 0);
        assert_eq!(camera.stops(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_may_disable_the_controller() {
        let camera = FakeCamera::new(ready_camera());
        let model = Arc::new(ScriptedModel {
            script: Mutex::new(vec![Step::Face(0.8, 0.0)].into()),
            last: Mutex::new(Step::NoFace),
            calls: AtomicUsize::new(0),
        });
        let source = FixedSource {
            model: model.clone(),
            fail: false,
            delay: Duration::from_millis(20),
        };
        let handle: Arc<std::sync::OnceLock<std::sync::Weak<MonitorController>>> =
            Arc::new(std::sync::OnceLock::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let observer: Arc<dyn DistressObserver> = {
            let handle = handle.clone();
            let seen = seen.clone();
            Arc::new(move || {
                if let Some(controller) = handle.get().and_then(|weak| weak.upgrade()) {
                    seen.lock().unwrap().push(controller.state());
                    controller.disable();
                }
            })
        };
        let (controller, _) = controller(camera.clone(), source, observer, ReadinessPolicy::default());
        let controller = Arc::new(controller);
        handle.set(Arc::downgrade(&controller)).unwrap();

        controller.enable();
        wait_for(&controller, MonitorState::Active).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(*seen.lock().unwrap(), vec![MonitorState::Active]);
        assert_eq!(controller.state(), MonitorState::Disabled);
        assert_eq!(camera.stops(), 1);
        assert_eq!(model.calls(), 1);
    }
}
