pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod input;
pub mod message;
pub mod metrics;
pub mod pipeline;
pub mod queue;
pub mod sender;
pub mod shutdown;
pub mod worker;

pub use config::Config;
pub use error::{DeliveryError, NotifierError, Result};
pub use message::Message;
pub use pipeline::{Pipeline, PipelineOutcome, PipelineState, RunningPipeline};
pub use sender::{HttpSender, NotificationSender};
pub use shutdown::{ShutdownReason, ShutdownSignal};
