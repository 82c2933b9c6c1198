use crate::alert::{Alert, AlertDescription};
use crate::message::Record;

/// The result of handing one record to a [`Context`](crate::Context).
///
/// Exactly one variant is produced per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// The record was processed and nothing needs to be sent.
    None,
    /// Records to serialize and send to the peer, in order.
    Packet(Vec<Record>),
    /// A protocol error to report to the peer. Fatal alerts terminate the
    /// session; the transport closes the connection after sending.
    Alert {
        description: AlertDescription,
        message: String,
        fatal: bool,
    },
    /// Decrypted application payload for the upper layer.
    Application(Vec<u8>),
}

impl Output {
    pub(crate) fn fatal(description: AlertDescription, message: impl Into<String>) -> Self {
        Output::Alert {
            description,
            message: message.into(),
            fatal: true,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Output::Alert { fatal: true, .. })
    }

    /// The alert record to put on the wire for an `Alert` output.
    pub fn alert_record(&self) -> Option<Record> {
        match self {
            Output::Alert {
                description, fatal, ..
            } => {
                let alert = if *fatal {
                    Alert::fatal(*description)
                } else {
                    Alert::warning(*description)
                };
                Some(Record::Alert(alert))
            }
            _ => None,
        }
    }

    /// The records of a `Packet`, or an empty slice.
    pub fn records(&self) -> &[Record] {
        match self {
            Output::Packet(records) => records,
            _ => &[],
        }
    }
}
