use crate::error::Error;

/// Reports the size, in bytes, a value will occupy once marshaled.
pub trait MarshalSize {
    fn marshal_size(&self) -> usize;
}

/// Serializes a value to its wire representation.
pub trait Marshal: MarshalSize {
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize, Error>;

    fn marshal(&self) -> Result<Vec<u8>, Error> {
        let l = self.marshal_size();
        let mut buf = vec![0u8; l];
        let n = self.marshal_to(&mut buf)?;
        if n != l {
            return Err(Error::new(format!(
                "marshal_to wrote {n} bytes, expected {l}"
            )));
        }
        Ok(buf)
    }
}

/// Parses a value out of its wire representation.
pub trait Unmarshal: Sized + MarshalSize {
    fn unmarshal(buf: &[u8]) -> Result<Self, Error>;
}
