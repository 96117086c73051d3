mod bus;
mod events;

pub use bus::EventBus;
pub use events::{DrawEvent, FinishAction};

pub trait EventHandler {
    fn handle_event(&mut self, event: &DrawEvent);
}

impl<F> EventHandler for F
where
    F: FnMut(&DrawEvent),
{
    fn handle_event(&mut self, event: &DrawEvent) {
        self(event)
    }
}
