// Polling scheduler, interval floor and event delivery

mod delivery;
mod interval;
mod scheduler;

pub use delivery::{event_channel, DeliveryPolicy, EventReceiver, EventSender};
pub use interval::{
    clamp_interval, minimum_interval, set_minimum_interval, DEFAULT_MINIMUM_INTERVAL,
    MAXIMUM_INTERVAL,
};
pub use scheduler::{PollStatus, Scheduler, SchedulerState};
