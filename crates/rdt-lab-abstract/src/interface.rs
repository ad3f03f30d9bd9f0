use crate::packet::Packet;

/// Everything a protocol may do to the outside world.
///
/// Implemented by the driver (simulator, test harness), never by a protocol.
/// All operations are infallible from the protocol's point of view: channel
/// loss or corruption only shows up as a missing or altered later event.
pub trait SystemContext {
    /// Hand a packet to the unreliable channel. No delivery guarantee.
    fn send_packet(&mut self, packet: Packet);

    /// Schedule a one-shot timer that fires `on_timer(timer_id)` after `delay_ms`.
    /// What happens when `timer_id` is already pending is up to the driver.
    fn start_timer(&mut self, delay_ms: u64, timer_id: u32);

    /// Prevent a future firing of `timer_id`. A no-op if it already fired or never existed.
    fn cancel_timer(&mut self, timer_id: u32);

    /// Pass payload bytes up to the application, in call order.
    fn deliver_data(&mut self, data: &[u8]);

    fn log(&mut self, message: &str);

    /// Current logical time in ms.
    fn now(&self) -> u64;

    /// Record a numeric sample for visualization / grading (e.g. cwnd).
    fn record_metric(&mut self, _name: &str, _value: f64) {}
}

/// Event-driven state machine driven by exactly one event at a time.
///
/// Handlers run to completion and must not block; anything that has to
/// happen later is scheduled through [`SystemContext::start_timer`].
pub trait TransportProtocol {
    /// Reset all mutable state. Must be safe to call more than once.
    fn init(&mut self, _ctx: &mut dyn SystemContext) {}

    /// A packet arrived from the channel.
    fn on_packet(&mut self, ctx: &mut dyn SystemContext, packet: Packet);

    /// A timer started through the context expired.
    fn on_timer(&mut self, ctx: &mut dyn SystemContext, timer_id: u32);

    /// The application wants `data` delivered to the peer.
    fn on_app_data(&mut self, ctx: &mut dyn SystemContext, data: &[u8]);
}
