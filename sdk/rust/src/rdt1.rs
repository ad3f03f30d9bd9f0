use rdt_lab_abstract::{Packet, SystemContext, TcpHeader, TransportProtocol};

/// Minimal RDT1 sender (assumes a perfect channel, no checksum/ACK).
#[derive(Debug, Default)]
pub struct Rdt1Sender;

impl TransportProtocol for Rdt1Sender {
    fn init(&mut self, ctx: &mut dyn SystemContext) {
        ctx.log("RDT1 sender ready (ideal channel)");
    }

    fn on_packet(&mut self, ctx: &mut dyn SystemContext, packet: Packet) {
        ctx.log(&format!(
            "RDT1 sender ignoring inbound packet seq={}",
            packet.header.seq_num
        ));
    }

    fn on_timer(&mut self, _ctx: &mut dyn SystemContext, _timer_id: u32) {
        // No timers are ever started on an ideal channel.
    }

    fn on_app_data(&mut self, ctx: &mut dyn SystemContext, data: &[u8]) {
        let packet = Packet::new(TcpHeader::default(), data);
        ctx.log(&format!(
            "RDT1 sender pushing {} bytes to channel",
            packet.len()
        ));
        ctx.send_packet(packet);
    }
}

/// Minimal RDT1 receiver (immediately delivers application data).
#[derive(Debug, Default)]
pub struct Rdt1Receiver;

impl TransportProtocol for Rdt1Receiver {
    fn init(&mut self, ctx: &mut dyn SystemContext) {
        ctx.log("RDT1 receiver ready (ideal channel)");
    }

    fn on_packet(&mut self, ctx: &mut dyn SystemContext, packet: Packet) {
        ctx.log(&format!("RDT1 receiver delivering {} bytes", packet.len()));
        ctx.deliver_data(&packet.payload);
    }

    fn on_timer(&mut self, _ctx: &mut dyn SystemContext, _timer_id: u32) {}

    fn on_app_data(&mut self, ctx: &mut dyn SystemContext, data: &[u8]) {
        ctx.log(&format!(
            "RDT1 receiver ignoring outbound app data of len {}",
            data.len()
        ));
    }
}

pub fn sender() -> Box<dyn TransportProtocol> {
    Box::new(Rdt1Sender)
}

pub fn receiver() -> Box<dyn TransportProtocol> {
    Box::new(Rdt1Receiver)
}
