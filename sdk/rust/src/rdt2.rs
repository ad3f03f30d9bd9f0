use std::collections::VecDeque;

use rdt_lab_abstract::checksum::packet_internet_checksum;
use rdt_lab_abstract::{Packet, SeqBit, SystemContext, TransportProtocol};

const DATA_TIMER: u32 = 1;
const DATA_TIMEOUT_MS: u64 = 1000;

fn seal(mut packet: Packet) -> Packet {
    packet.header.checksum = packet_internet_checksum(&packet);
    packet
}

fn is_intact(packet: &Packet) -> bool {
    packet_internet_checksum(packet) == packet.header.checksum
}

/// Stop-and-wait sender that queues application data instead of dropping it.
#[derive(Debug, Default)]
pub struct Rdt2Sender {
    next_seq: SeqBit,
    pending: VecDeque<Vec<u8>>,
    in_flight: Option<Packet>,
}

impl Rdt2Sender {
    pub fn queued(&self) -> usize {
        self.pending.len()
    }

    fn try_send(&mut self, ctx: &mut dyn SystemContext) {
        if self.in_flight.is_some() {
            return;
        }
        if let Some(payload) = self.pending.pop_front() {
            let packet = seal(Packet::new_simple(self.next_seq.as_u32(), 0, 0, &payload));
            ctx.log(&format!(
                "RDT2 send seq={} ({} bytes)",
                packet.header.seq_num,
                packet.len()
            ));
            ctx.send_packet(packet.clone());
            ctx.start_timer(DATA_TIMEOUT_MS, DATA_TIMER);
            self.in_flight = Some(packet);
            ctx.record_metric("queued", self.pending.len() as f64);
        }
    }

    fn handle_ack(&mut self, ctx: &mut dyn SystemContext, ack: u32) {
        if self.in_flight.is_none() || !self.next_seq.matches(ack) {
            return;
        }
        ctx.log(&format!("RDT2 received ACK for seq {}", ack));
        ctx.cancel_timer(DATA_TIMER);
        self.in_flight = None;
        self.next_seq = self.next_seq.flip();
        self.try_send(ctx);
    }
}

impl TransportProtocol for Rdt2Sender {
    fn init(&mut self, ctx: &mut dyn SystemContext) {
        self.next_seq = SeqBit::Zero;
        self.pending.clear();
        self.in_flight = None;
        ctx.log("RDT2 sender ready");
    }

    fn on_packet(&mut self, ctx: &mut dyn SystemContext, packet: Packet) {
        if !is_intact(&packet) {
            ctx.log("RDT2 sender dropping corrupted ACK");
            return;
        }
        if packet.header.is_ack() {
            self.handle_ack(ctx, packet.header.ack_num);
        }
    }

    fn on_timer(&mut self, ctx: &mut dyn SystemContext, timer_id: u32) {
        if timer_id != DATA_TIMER {
            return;
        }
        if let Some(packet) = &self.in_flight {
            ctx.log(&format!(
                "RDT2 timeout, retransmitting seq {}",
                packet.header.seq_num
            ));
            ctx.send_packet(packet.clone());
            ctx.start_timer(DATA_TIMEOUT_MS, DATA_TIMER);
        }
    }

    fn on_app_data(&mut self, ctx: &mut dyn SystemContext, data: &[u8]) {
        self.pending.push_back(data.to_vec());
        self.try_send(ctx);
    }
}

/// Receiver for [`Rdt2Sender`]: verifies the Internet checksum before delivering.
#[derive(Debug)]
pub struct Rdt2Receiver {
    expected_seq: SeqBit,
    last_acked: SeqBit,
}

impl Default for Rdt2Receiver {
    fn default() -> Self {
        Self {
            expected_seq: SeqBit::Zero,
            last_acked: SeqBit::One,
        }
    }
}

impl Rdt2Receiver {
    fn send_ack(&mut self, ctx: &mut dyn SystemContext, seq: SeqBit) {
        let raw = seq.as_u32();
        ctx.log(&format!("RDT2 send ACK for seq {}", raw));
        ctx.send_packet(seal(Packet::new_ack(raw, raw, 0)));
        self.last_acked = seq;
    }
}

impl TransportProtocol for Rdt2Receiver {
    fn init(&mut self, ctx: &mut dyn SystemContext) {
        ctx.log("RDT2 receiver ready");
        self.expected_seq = SeqBit::Zero;
        self.last_acked = self.expected_seq.flip();
    }

    fn on_packet(&mut self, ctx: &mut dyn SystemContext, packet: Packet) {
        if !is_intact(&packet) {
            ctx.log(&format!(
                "RDT2 checksum mismatch for seq {} (expected {:04X}, got {:04X})",
                packet.header.seq_num,
                packet_internet_checksum(&packet),
                packet.header.checksum
            ));
            self.send_ack(ctx, self.last_acked);
            return;
        }
        if self.expected_seq.matches(packet.header.seq_num) {
            ctx.log(&format!(
                "RDT2 received seq {} ({} bytes)",
                packet.header.seq_num,
                packet.len()
            ));
            ctx.deliver_data(&packet.payload);
            self.send_ack(ctx, self.expected_seq);
            self.expected_seq = self.expected_seq.flip();
        } else {
            ctx.log(&format!(
                "RDT2 unexpected seq {} (expect {}), re-ACK {}",
                packet.header.seq_num,
                self.expected_seq.as_u32(),
                self.last_acked.as_u32()
            ));
            self.send_ack(ctx, self.last_acked);
        }
    }

    fn on_timer(&mut self, _ctx: &mut dyn SystemContext, _timer_id: u32) {}

    fn on_app_data(&mut self, _ctx: &mut dyn SystemContext, _data: &[u8]) {}
}

pub fn sender() -> Box<dyn TransportProtocol> {
    Box::new(Rdt2Sender::default())
}

pub fn receiver() -> Box<dyn TransportProtocol> {
    Box::new(Rdt2Receiver::default())
}
