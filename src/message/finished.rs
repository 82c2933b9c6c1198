use nom::IResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    pub verify_data: Vec<u8>,
}

impl Finished {
    pub fn new(verify_data: Vec<u8>) -> Self {
        Finished { verify_data }
    }

    /// The body is the whole message; its length is fixed by the cipher suite.
    pub fn parse(input: &[u8]) -> IResult<&[u8], Finished> {
        Ok((
            &[],
            Finished {
                verify_data: input.to_vec(),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.verify_data);
    }
}
