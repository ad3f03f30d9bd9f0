use std::fmt;
use std::str::FromStr;

use rdt_lab_abstract::TransportProtocol;
use thiserror::Error;

use crate::{rdt1, rdt2, rdt3_receiver::Rdt3Receiver, rdt3_sender::Rdt3Sender};

/// Built-in Rust implementations that can be used without loading external code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinProtocol {
    Rdt1,
    Rdt2,
    Rdt3,
}

#[derive(Debug, Error)]
#[error("unknown builtin '{0}', try one of: rdt1, rdt2, rdt3")]
pub struct UnknownProtocol(pub String);

impl BuiltinProtocol {
    pub const ALL: [BuiltinProtocol; 3] = [Self::Rdt1, Self::Rdt2, Self::Rdt3];

    pub fn name(self) -> &'static str {
        match self {
            Self::Rdt1 => "rdt1",
            Self::Rdt2 => "rdt2",
            Self::Rdt3 => "rdt3",
        }
    }

    pub fn sender(self) -> Box<dyn TransportProtocol> {
        match self {
            Self::Rdt1 => rdt1::sender(),
            Self::Rdt2 => rdt2::sender(),
            Self::Rdt3 => Box::new(Rdt3Sender::new()),
        }
    }

    pub fn receiver(self) -> Box<dyn TransportProtocol> {
        match self {
            Self::Rdt1 => rdt1::receiver(),
            Self::Rdt2 => rdt2::receiver(),
            Self::Rdt3 => Box::new(Rdt3Receiver::new()),
        }
    }
}

impl FromStr for BuiltinProtocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownProtocol(s.to_string()))
    }
}

impl fmt::Display for BuiltinProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
