use rdt_lab_abstract::checksum::{additive_checksum, is_corrupted};
use rdt_lab_abstract::{Packet, SeqBit, SystemContext, TcpHeader, TransportProtocol};

/// Retransmission timeout for the outstanding packet.
pub const RETRANSMIT_TIMEOUT_MS: u64 = 3000;

#[derive(Debug, Default)]
enum SenderState {
    #[default]
    Idle,
    /// One packet in flight, timer keyed by `next_seq` running.
    WaitAck { packet: Packet },
}

/// Stop-and-wait sender with alternating-bit sequencing.
///
/// Application data that arrives while a packet is outstanding is dropped;
/// there is no send buffer.
#[derive(Debug, Default)]
pub struct Rdt3Sender {
    next_seq: SeqBit,
    state: SenderState,
    retransmissions: u64,
}

impl Rdt3Sender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_seq(&self) -> SeqBit {
        self.next_seq
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self.state, SenderState::WaitAck { .. })
    }

    /// The packet awaiting acknowledgment, if any.
    pub fn outstanding(&self) -> Option<&Packet> {
        match &self.state {
            SenderState::WaitAck { packet } => Some(packet),
            SenderState::Idle => None,
        }
    }

    fn timer_id(&self) -> u32 {
        self.next_seq.as_u32()
    }

    fn retransmit(&mut self, ctx: &mut dyn SystemContext) {
        let SenderState::WaitAck { packet } = &self.state else {
            return;
        };
        ctx.send_packet(packet.clone());
        ctx.start_timer(RETRANSMIT_TIMEOUT_MS, self.timer_id());
        self.retransmissions += 1;
        ctx.record_metric("retransmissions", self.retransmissions as f64);
    }
}

impl TransportProtocol for Rdt3Sender {
    fn init(&mut self, _ctx: &mut dyn SystemContext) {
        self.next_seq = SeqBit::Zero;
        self.state = SenderState::Idle;
        self.retransmissions = 0;
    }

    fn on_app_data(&mut self, ctx: &mut dyn SystemContext, data: &[u8]) {
        if self.is_waiting() {
            ctx.log("RDT3 Sender Busy: Dropping application data");
            return;
        }

        let mut h = TcpHeader::default();
        h.seq_num = self.next_seq.as_u32();
        h.checksum = additive_checksum(h.seq_num, data);

        let packet = Packet::new(h, data);
        ctx.send_packet(packet.clone());
        ctx.start_timer(RETRANSMIT_TIMEOUT_MS, self.timer_id());
        self.state = SenderState::WaitAck { packet };
    }

    fn on_packet(&mut self, ctx: &mut dyn SystemContext, packet: Packet) {
        if !self.is_waiting() {
            return;
        }

        let h = &packet.header;
        let acks_current = h.is_ack() && self.next_seq.matches(h.ack_num);

        if is_corrupted(&packet) || (h.is_ack() && !acks_current) {
            ctx.log(&format!(
                "Corrupted or Duplicate ACK. Retransmitting {}",
                self.timer_id()
            ));
            ctx.cancel_timer(self.timer_id());
            self.retransmit(ctx);
            return;
        }

        if acks_current {
            ctx.log(&format!("Received ACK {}", self.timer_id()));
            ctx.cancel_timer(self.timer_id());
            self.state = SenderState::Idle;
            self.next_seq = self.next_seq.flip();
        }
    }

    fn on_timer(&mut self, ctx: &mut dyn SystemContext, timer_id: u32) {
        if self.is_waiting() && timer_id == self.timer_id() {
            ctx.log(&format!("Timeout! Retransmitting seq {}", timer_id));
            self.retransmit(ctx);
        }
    }
}
