use std::io::{self, Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Reads one length-prefixed `rmp-serde` message. Returns `Ok(None)` on a
/// clean EOF at a message boundary (the peer closed the connection).
pub(crate) fn read_framed<T, R>(reader: &mut R) -> io::Result<Option<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    let value = rmp_serde::from_slice(&body)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(value))
}

pub(crate) fn write_framed<T, W>(writer: &mut W, value: &T) -> io::Result<()>
where
    T: Serialize,
    W: Write,
{
    let body = rmp_serde::to_vec(value).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let len = u32::try_from(body.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        .to_be_bytes();
    writer.write_all(&len)?;
    writer.write_all(&body)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn roundtrips_through_an_in_memory_buffer() {
        let mut buf = Vec::new();
        write_framed(&mut buf, &("hello".to_string(), 42u32)).unwrap();
        let mut cursor = std::io::Cursor::new(buf);
        let (s, n): (String, u32) = read_framed(&mut cursor).unwrap().unwrap();
        assert_eq!(s, "hello");
        assert_eq!(n, 42);
    }

    #[test]
    fn empty_reader_yields_none() {
        let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
        let value: Option<(String, u32)> = read_framed(&mut cursor).unwrap();
        assert!(value.is_none());
    }
}
