use nom::combinator::map_opt;
use nom::number::complete::be_u8;
use nom::IResult;

/// Whether the peer should answer with its own KeyUpdate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUpdateRequest {
    UpdateNotRequested,
    UpdateRequested,
}

impl KeyUpdateRequest {
    fn from_wire(value: u8) -> Option<Self> {
        Some(match value {
            0 => KeyUpdateRequest::UpdateNotRequested,
            1 => KeyUpdateRequest::UpdateRequested,
            _ => return None,
        })
    }

    fn to_wire(self) -> u8 {
        match self {
            KeyUpdateRequest::UpdateNotRequested => 0,
            KeyUpdateRequest::UpdateRequested => 1,
        }
    }
}

/// Post-handshake traffic key rotation, TLS 1.3 only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUpdate {
    pub request_update: KeyUpdateRequest,
}

impl KeyUpdate {
    pub fn request_update() -> Self {
        KeyUpdate {
            request_update: KeyUpdateRequest::UpdateRequested,
        }
    }

    /// What the server sends back after stepping its read key.
    pub fn update_not_requested() -> Self {
        KeyUpdate {
            request_update: KeyUpdateRequest::UpdateNotRequested,
        }
    }

    pub fn is_update_requested(&self) -> bool {
        matches!(self.request_update, KeyUpdateRequest::UpdateRequested)
    }

    /// Values other than 0 and 1 are rejected.
    pub fn parse(input: &[u8]) -> IResult<&[u8], KeyUpdate> {
        let (rest, request_update) = map_opt(be_u8, KeyUpdateRequest::from_wire)(input)?;
        Ok((rest, KeyUpdate { request_update }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(self.request_update.to_wire());
    }
}
