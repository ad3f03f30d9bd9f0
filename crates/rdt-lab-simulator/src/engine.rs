use crate::trace::SimulationReport;
use rand::{Rng, SeedableRng};
use rdt_lab_abstract::{ConfigError, Packet, RecordingContext, SimConfig, TcpHeader, TimerOp};
use rdt_lab_abstract::TransportProtocol;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use tracing::{debug, info, warn};

/// Upper bound on events processed by [`Simulator::run_until_complete`].
pub const DEFAULT_EVENT_LIMIT: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Sender,
    Receiver,
}

impl NodeId {
    pub fn peer(&self) -> Self {
        match self {
            NodeId::Sender => NodeId::Receiver,
            NodeId::Receiver => NodeId::Sender,
        }
    }
}

#[derive(Debug)]
pub enum EventType {
    PacketArrival {
        to: NodeId,
        packet: Packet,
    },
    TimerExpiry {
        node: NodeId,
        timer_id: u32,
        generation: u64,
    },
    AppSend {
        data: Vec<u8>,
    },
}

#[derive(Debug)]
struct Event {
    time: u64,
    event_type: EventType,
    id: u64, // tie-breaker for events at the same time
}

// Min-heap on (time, id): the earliest event pops first.
impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// A compact textual summary of a link-layer event.
#[derive(Debug, Clone, Serialize)]
pub struct LinkEventSummary {
    pub time: u64,
    pub description: String,
}

/// Drives a sender/receiver pair over a simulated unreliable channel.
///
/// Every handler gets a fresh [`RecordingContext`]; its effects are applied
/// once the handler has returned, so a protocol never observes its own
/// actions mid-call.
///
/// Starting a timer whose id is already pending replaces it: only the most
/// recent start for a `(node, id)` pair can fire.
pub struct Simulator {
    time: u64,
    event_queue: BinaryHeap<Event>,
    event_id_counter: u64,

    config: SimConfig,
    rng: rand::rngs::StdRng,

    pub sender: Box<dyn TransportProtocol>,
    pub receiver: Box<dyn TransportProtocol>,

    pub delivered_data: Vec<Vec<u8>>,
    pub sender_packet_count: u32,

    /// Samples from `SystemContext::record_metric`, keyed by name, as (time_ms, value).
    pub metrics: HashMap<String, Vec<(u64, f64)>>,

    drop_sender_seq_once: Vec<u32>,
    drop_receiver_ack_once: Vec<u32>,

    pub link_events: Vec<LinkEventSummary>,

    /// Bumped on every start and cancel; a firing with an older generation is stale.
    timer_generations: HashMap<(NodeId, u32), u64>,

    completed: bool,
}

impl Simulator {
    pub fn new(
        config: SimConfig,
        sender: Box<dyn TransportProtocol>,
        receiver: Box<dyn TransportProtocol>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = rand::rngs::StdRng::seed_from_u64(config.seed);

        Ok(Self {
            time: 0,
            event_queue: BinaryHeap::new(),
            event_id_counter: 0,
            config,
            rng,
            sender,
            receiver,
            delivered_data: Vec::new(),
            sender_packet_count: 0,
            metrics: HashMap::new(),
            drop_sender_seq_once: Vec::new(),
            drop_receiver_ack_once: Vec::new(),
            link_events: Vec::new(),
            timer_generations: HashMap::new(),
            completed: false,
        })
    }

    /// Drop the first packet sent by Sender whose seq equals `seq`.
    pub fn add_drop_sender_seq_once(&mut self, seq: u32) {
        self.drop_sender_seq_once.push(seq);
    }

    /// Drop the first ACK sent by Receiver whose ack equals `ack`.
    pub fn add_drop_receiver_ack_once(&mut self, ack: u32) {
        self.drop_receiver_ack_once.push(ack);
    }

    pub fn metric_series(&self, name: &str) -> Option<&[(u64, f64)]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    fn push_event(&mut self, time: u64, event_type: EventType) {
        self.event_queue.push(Event {
            time,
            event_type,
            id: self.event_id_counter,
        });
        self.event_id_counter += 1;
    }

    pub fn schedule_app_send(&mut self, time: u64, data: Vec<u8>) {
        self.push_event(time, EventType::AppSend { data });
    }

    pub fn init(&mut self) {
        let mut ctx = RecordingContext::at(self.time);
        self.sender.init(&mut ctx);
        self.process_actions(NodeId::Sender, ctx);

        let mut ctx = RecordingContext::at(self.time);
        self.receiver.init(&mut ctx);
        self.process_actions(NodeId::Receiver, ctx);
    }

    pub fn current_time(&self) -> u64 {
        self.time
    }

    pub fn remaining_events(&self) -> usize {
        self.event_queue.len()
    }

    /// Process the next event. Returns false if the queue is empty.
    pub fn step(&mut self) -> bool {
        let Some(event) = self.event_queue.pop() else {
            return false;
        };

        // Stale timers are discarded without advancing the clock.
        if let EventType::TimerExpiry {
            node,
            timer_id,
            generation,
        } = &event.event_type
            && self.timer_generations.get(&(*node, *timer_id)) != Some(generation)
        {
            debug!("Skipping stale timer event for timer_id={}", timer_id);
            return true;
        }

        self.time = event.time;
        debug!("Processing event at {}: {:?}", self.time, event.event_type);

        let mut ctx = RecordingContext::at(self.time);
        let node = match event.event_type {
            EventType::PacketArrival { to, packet } => {
                match to {
                    NodeId::Sender => self.sender.on_packet(&mut ctx, packet),
                    NodeId::Receiver => self.receiver.on_packet(&mut ctx, packet),
                }
                to
            }
            EventType::TimerExpiry { node, timer_id, .. } => {
                match node {
                    NodeId::Sender => self.sender.on_timer(&mut ctx, timer_id),
                    NodeId::Receiver => self.receiver.on_timer(&mut ctx, timer_id),
                }
                node
            }
            EventType::AppSend { data } => {
                self.sender.on_app_data(&mut ctx, &data);
                NodeId::Sender
            }
        };
        self.process_actions(node, ctx);
        true
    }

    /// Initialize both nodes and run until the queue drains or [`DEFAULT_EVENT_LIMIT`] is hit.
    pub fn run_until_complete(&mut self) -> bool {
        self.run_with_limit(DEFAULT_EVENT_LIMIT)
    }

    /// Returns true if the event queue drained within `max_events`.
    pub fn run_with_limit(&mut self, max_events: usize) -> bool {
        self.init();
        for _ in 0..max_events {
            if !self.step() {
                self.completed = true;
                return true;
            }
        }
        self.completed = self.event_queue.is_empty();
        if !self.completed {
            warn!(
                "Stopping after {} events with {} still queued",
                max_events,
                self.remaining_events()
            );
        }
        self.completed
    }

    pub fn export_report(&self) -> SimulationReport {
        SimulationReport {
            config: self.config.clone(),
            duration_ms: self.time,
            completed: self.completed,
            delivered_data: self.delivered_data.clone(),
            sender_packet_count: self.sender_packet_count,
            metrics: self.metrics.clone(),
            link_events: self.link_events.clone(),
        }
    }

    fn link_event(&mut self, description: String) {
        debug!("{}", description);
        self.link_events.push(LinkEventSummary {
            time: self.time,
            description,
        });
    }

    fn process_actions(&mut self, source_node: NodeId, actions: RecordingContext) {
        for (name, value) in actions.metrics {
            self.metrics
                .entry(name)
                .or_default()
                .push((self.time, value));
        }

        for log in actions.logs {
            info!("[{:?}] {}", source_node, log);
        }

        for data in actions.delivered {
            info!("[{:?}] DELIVERED DATA: {} bytes", source_node, data.len());
            self.link_event(format!(
                "[{:?}] DELIVERED {} bytes to application",
                source_node,
                data.len()
            ));
            self.delivered_data.push(data);
        }

        for op in actions.timers {
            match op {
                TimerOp::Cancel { timer_id } => {
                    *self
                        .timer_generations
                        .entry((source_node, timer_id))
                        .or_insert(0) += 1;
                }
                TimerOp::Start { delay_ms, timer_id } => {
                    let generation = self
                        .timer_generations
                        .entry((source_node, timer_id))
                        .or_insert(0);
                    *generation += 1;
                    let generation = *generation;
                    self.push_event(
                        self.time + delay_ms,
                        EventType::TimerExpiry {
                            node: source_node,
                            timer_id,
                            generation,
                        },
                    );
                }
            }
        }

        for packet in actions.sent {
            self.transmit(source_node, packet);
        }
    }

    /// Consume the first scripted drop rule matching `header`, returning its label.
    fn take_scripted_drop(&mut self, from: NodeId, header: &TcpHeader) -> Option<&'static str> {
        let (rules, key, label) = match from {
            NodeId::Sender => (&mut self.drop_sender_seq_once, header.seq_num, "deterministic seq"),
            NodeId::Receiver if header.is_ack() => {
                (&mut self.drop_receiver_ack_once, header.ack_num, "deterministic ack")
            }
            NodeId::Receiver => return None,
        };
        let pos = rules.iter().position(|k| *k == key)?;
        rules.remove(pos);
        Some(label)
    }

    fn transmit(&mut self, from: NodeId, mut packet: Packet) {
        let to = from.peer();
        let (seq, ack) = (packet.header.seq_num, packet.header.ack_num);

        if from == NodeId::Sender {
            self.sender_packet_count += 1;
        }

        let dropped = match self.take_scripted_drop(from, &packet.header) {
            Some(rule) => Some(rule),
            None if self.rng.random::<f64>() < self.config.loss_rate => Some("random loss"),
            None => None,
        };
        if let Some(reason) = dropped {
            self.link_event(format!("[{from:?}->{to:?}] DROP ({reason}) seq={seq} ack={ack}"));
            return;
        }

        if self.rng.random::<f64>() < self.config.corrupt_rate {
            self.link_event(format!("[{from:?}->{to:?}] CORRUPT seq={seq} ack={ack}"));
            // Invert the carried checksum so any recomputing checker flags it.
            packet.header.checksum = !packet.header.checksum;
        }

        let latency = self
            .rng
            .random_range(self.config.min_latency..=self.config.max_latency);
        self.link_event(format!(
            "[{from:?}->{to:?}] SEND seq={seq} ack={ack} (latency={latency}ms)"
        ));
        self.push_event(self.time + latency, EventType::PacketArrival { to, packet });
    }
}
