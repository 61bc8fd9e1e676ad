//! Real-time VSTP amendments.
//!
//! Very Short Term Plan messages arrive over a STOMP subscription. Each one
//! carries a single schedule that is converted to the canonical model and
//! appended to the store. The consumer reconnects with capped backoff and
//! only acknowledges a message once it has been written.

mod consumer;
mod convert;
mod error;
mod stomp;
mod types;

pub use consumer::{
    AmendmentSession, AmendmentSource, Backoff, ConsumerState, Delivery, VSTP_TOPIC, VstpConsumer,
};
pub use convert::{convert_speed, decode_message, to_schedule};
pub use error::VstpError;
pub use stomp::{Frame, StompConfig, StompConnection, StompSource, read_frame};
pub use types::{
    VstpCifMsgV1, VstpLocation, VstpLocationRef, VstpSchedule, VstpSegment, VstpSender,
    VstpStompMsg, VstpTiplocRef,
};
