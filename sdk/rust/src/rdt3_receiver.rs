use rdt_lab_abstract::checksum::additive_checksum;
use rdt_lab_abstract::{Packet, SeqBit, SystemContext, TcpHeader, TransportProtocol, flags};

/// Alternating-bit receiver. Never times out and never sends on its own.
#[derive(Debug, Default)]
pub struct Rdt3Receiver {
    expected_seq: SeqBit,
}

impl Rdt3Receiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expected_seq(&self) -> SeqBit {
        self.expected_seq
    }

    fn send_ack(&self, ctx: &mut dyn SystemContext, ack: SeqBit) {
        let mut h = TcpHeader::default();
        h.ack_num = ack.as_u32();
        h.flags = flags::ACK;
        h.checksum = additive_checksum(h.seq_num, &[]);
        ctx.send_packet(Packet::new(h, &[]));
    }
}

impl TransportProtocol for Rdt3Receiver {
    fn init(&mut self, _ctx: &mut dyn SystemContext) {
        self.expected_seq = SeqBit::Zero;
    }

    fn on_app_data(&mut self, _ctx: &mut dyn SystemContext, _data: &[u8]) {
        // Receiver doesn't send app data
    }

    fn on_packet(&mut self, ctx: &mut dyn SystemContext, packet: Packet) {
        let seq = packet.header.seq_num;

        match SeqBit::try_from(seq) {
            Ok(bit) if bit == self.expected_seq => {
                ctx.log(&format!("Received correct packet {}", seq));
                ctx.deliver_data(&packet.payload);
                self.send_ack(ctx, bit);
                self.expected_seq = bit.flip();
            }
            Ok(_) => {
                ctx.log(&format!(
                    "Duplicate/Out-of-order packet {}, expected {}",
                    seq,
                    self.expected_seq.as_u32()
                ));
                // Re-ACK the last in-order packet so the sender retransmits.
                self.send_ack(ctx, self.expected_seq.flip());
            }
            Err(e) => {
                ctx.log(&format!("Ignoring packet: {e}"));
                self.send_ack(ctx, self.expected_seq.flip());
            }
        }
    }

    fn on_timer(&mut self, _ctx: &mut dyn SystemContext, _timer_id: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdt_lab_abstract::RecordingContext;
    use rdt_lab_abstract::checksum::is_corrupted;

    fn data(seq: u32, payload: &[u8]) -> Packet {
        let mut h = TcpHeader::new(seq, 0, 0, 0);
        h.checksum = additive_checksum(seq, payload);
        Packet::new(h, payload)
    }

    #[test]
    fn in_order_packet_is_delivered_and_acked() {
        let mut ctx = RecordingContext::new();
        let mut receiver = Rdt3Receiver::new();
        receiver.init(&mut ctx);

        receiver.on_packet(&mut ctx, data(0, b"hi"));

        assert_eq!(ctx.delivered, vec![b"hi".to_vec()]);
        assert_eq!(ctx.sent.len(), 1);
        let ack = &ctx.sent[0];
        assert!(ack.header.is_ack());
        assert_eq!(ack.header.ack_num, 0);
        assert!(ack.is_empty());
        assert!(!is_corrupted(ack));
        assert_eq!(receiver.expected_seq(), SeqBit::One);
    }

    #[test]
    fn duplicate_is_reacked_not_delivered() {
        let mut ctx = RecordingContext::new();
        let mut receiver = Rdt3Receiver::new();
        receiver.on_packet(&mut ctx, data(0, b"hi"));
        ctx.clear();

        receiver.on_packet(&mut ctx, data(0, b"hi"));

        assert!(ctx.delivered.is_empty());
        assert_eq!(ctx.sent.len(), 1);
        assert_eq!(ctx.sent[0].header.ack_num, 0);
        assert_eq!(receiver.expected_seq(), SeqBit::One);
    }

    #[test]
    fn out_of_space_seq_acks_previous() {
        let mut ctx = RecordingContext::new();
        let mut receiver = Rdt3Receiver::new();

        receiver.on_packet(&mut ctx, data(5, b"??"));

        assert!(ctx.delivered.is_empty());
        assert_eq!(ctx.sent[0].header.ack_num, 1);
        assert_eq!(receiver.expected_seq(), SeqBit::Zero);
        assert!(ctx.logs[0].contains("outside the alternating-bit space"));
    }

    #[test]
    fn init_resets_expected_seq() {
        let mut ctx = RecordingContext::new();
        let mut receiver = Rdt3Receiver::new();
        receiver.on_packet(&mut ctx, data(0, b"hi"));
        assert_eq!(receiver.expected_seq(), SeqBit::One);
        ctx.clear();

        receiver.init(&mut ctx);
        receiver.init(&mut ctx);

        assert_eq!(receiver.expected_seq(), SeqBit::Zero);
        assert!(ctx.is_quiet());
    }

    #[test]
    fn alternates_across_messages() {
        let mut ctx = RecordingContext::new();
        let mut receiver = Rdt3Receiver::new();
        for (i, payload) in [b"a", b"b", b"c"].iter().enumerate() {
            receiver.on_packet(&mut ctx, data(i as u32 % 2, *payload));
        }
        assert_eq!(ctx.delivered, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        let acks: Vec<u32> = ctx.sent.iter().map(|p| p.header.ack_num).collect();
        assert_eq!(acks, vec![0, 1, 0]);
        assert!(ctx.timers.is_empty());
    }
}
