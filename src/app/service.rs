//! Node service — the hexagonal core.
//!
//! [`NodeService`] owns the connectivity supervisor, the discovery
//! registry, the reporter and the device context. All I/O flows through
//! port traits; the clock and the event sink are injected at call sites,
//! so the whole service runs against fakes on the host.
//!
//! ```text
//!  SensingPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                  │          NodeService          │
//!  NetworkPort ◀──▶│ Supervisor · Registry · Report│
//!  BrokerPort  ◀──▶└──────────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::NodeConfig;
use crate::connectivity::{ConnectivitySupervisor, LinkState};
use crate::discovery::{DeviceContext, DiscoveryRegistry};

use super::catalog;
use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{BrokerPort, ClockPort, EventSink, NetworkPort, Qos, SensingEvent, SensingPort};
use super::reporter::Reporter;

// ───────────────────────────────────────────────────────────────
// NodeService
// ───────────────────────────────────────────────────────────────

pub struct NodeService<N, B, S> {
    supervisor: ConnectivitySupervisor<N, B>,
    sensing: S,
    registry: DiscoveryRegistry,
    reporter: Reporter,
    ctx: DeviceContext,
    discovery_retry_ms: u32,
    refresh_setter: String,
    refresh_getter: String,
}

impl<N: NetworkPort, B: BrokerPort, S: SensingPort> NodeService<N, B, S> {
    /// Wire the service. Nothing touches the links until
    /// [`bring_up`](Self::bring_up).
    ///
    /// `identifier` is the hardware identity (factory MAC).
    pub fn new(config: &NodeConfig, identifier: &str, network: N, broker: B, sensing: S) -> Self {
        let ctx = DeviceContext::new(&config.device, identifier);
        let refresh_setter = catalog::refresh_setter_topic(&ctx.device_id);
        let refresh_getter = catalog::refresh_getter_topic(&ctx.device_id);

        let mut supervisor = ConnectivitySupervisor::new(network, broker, config, &ctx.availability_topic);
        supervisor.add_subscription(refresh_setter.as_str());

        Self {
            supervisor,
            sensing,
            registry: catalog::registry(),
            reporter: Reporter::new(config.report_interval_secs),
            ctx,
            discovery_retry_ms: config.discovery_retry_ms,
            refresh_setter,
            refresh_getter,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Blocking bring-up: connect, announce everything, go online.
    ///
    /// Returns only once every announcement has been accepted by the
    /// broker. Discovery metadata is purged afterwards and never
    /// re-announced.
    pub fn bring_up(&mut self, clock: &mut impl ClockPort, sink: &mut impl EventSink) {
        self.sensing.setup();
        self.supervisor.assert_connectivity(clock, sink);

        loop {
            let pending = self
                .registry
                .publish_pending(self.supervisor.broker_mut(), &self.ctx);
            sink.emit(&AppEvent::DiscoveryProgress { pending });
            if pending == 0 {
                break;
            }
            info!("Discovery: {} pending, retrying in {} ms", pending, self.discovery_retry_ms);
            clock.delay_ms(self.discovery_retry_ms);
            self.supervisor.assert_connectivity(clock, sink);
        }

        let records = self.registry.purge();
        sink.emit(&AppEvent::DiscoveryPurged { records });

        let _ = self
            .reporter
            .publish_online(self.supervisor.broker_mut(), &self.ctx);
        self.publish_report_interval();
        self.publish_diagnostics(sink);
        self.reporter.arm(clock.now_ms());

        info!("NodeService: ready ({} entities announced)", records);
        sink.emit(&AppEvent::Ready);
    }

    // ── Per-loop orchestration ────────────────────────────────

    /// One pass of the steady-state loop: sensing → broker → inbound
    /// commands → connectivity → interval reports.
    pub fn poll_cycle(&mut self, clock: &mut impl ClockPort, sink: &mut impl EventSink) {
        // 1. Sensing events
        self.sensing.poll();
        while let Some(event) = self.sensing.next_event() {
            match event {
                SensingEvent::Pulse => {
                    let reading = self.sensing.reading();
                    match self
                        .reporter
                        .publish_reading(self.supervisor.broker_mut(), &self.ctx, &reading)
                    {
                        Ok(()) => sink.emit(&AppEvent::ReadingPublished(reading)),
                        Err(_) => sink.emit(&AppEvent::ReadingDropped),
                    }
                }
                SensingEvent::Noise => {
                    debug!("Sensing: noise");
                    sink.emit(&AppEvent::NoiseDetected);
                }
            }
        }

        // 2. Broker client housekeeping and inbound messages
        self.supervisor.broker_mut().poll();
        while let Some(msg) = self.supervisor.broker_mut().take_message() {
            match AppCommand::parse(&msg, &self.refresh_setter) {
                Some(cmd) => self.handle_command(cmd, sink),
                None => {
                    debug!("Inbound: ignoring '{}' on {}", msg.payload, msg.topic);
                    sink.emit(&AppEvent::MessageIgnored);
                }
            }
        }

        // 3. Connectivity (no-op when ready)
        self.supervisor.assert_connectivity(clock, sink);

        // 4. Interval reports
        if self.reporter.take_due(clock.now_ms()) {
            let _ = self
                .reporter
                .publish_online(self.supervisor.broker_mut(), &self.ctx);
            self.publish_diagnostics(sink);
        }
    }

    // ── Command handling ──────────────────────────────────────

    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) {
        match cmd {
            AppCommand::SetReportInterval { minutes } => {
                let minutes = self.reporter.set_interval_minutes(minutes);
                self.publish_report_interval();
                sink.emit(&AppEvent::ReportIntervalChanged { minutes });
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> LinkState {
        self.supervisor.state()
    }

    pub fn context(&self) -> &DeviceContext {
        &self.ctx
    }

    pub fn registry(&self) -> &DiscoveryRegistry {
        &self.registry
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn supervisor(&self) -> &ConnectivitySupervisor<N, B> {
        &self.supervisor
    }

    pub fn supervisor_mut(&mut self) -> &mut ConnectivitySupervisor<N, B> {
        &mut self.supervisor
    }

    pub fn sensing_mut(&mut self) -> &mut S {
        &mut self.sensing
    }

    // ── Internal ──────────────────────────────────────────────

    /// Current report interval on the control's getter topic.
    fn publish_report_interval(&mut self) {
        let value = self.reporter.interval_minutes().to_string();
        match self
            .supervisor
            .broker_mut()
            .publish(&self.refresh_getter, &value, true, Qos::AtLeastOnce)
        {
            Ok(()) => debug!("Reporter: interval {} -> {}", value, self.refresh_getter),
            Err(e) => warn!("Reporter: interval state failed — {}", e),
        }
    }

    fn publish_diagnostics(&mut self, sink: &mut impl EventSink) {
        let (network, broker) = self.supervisor.links_mut();
        if self
            .reporter
            .publish_diagnostics(broker, network, &self.ctx)
            .is_ok()
        {
            sink.emit(&AppEvent::DiagnosticsPublished);
        }
    }
}
