//! Helpers shared by the crate's tests

use tokio::io::{AsyncRead, AsyncReadExt};

/// Read byte by byte until `terminator` has been received
///
/// Panics on EOF so a closed peer fails the test with what it did send.
pub(crate) async fn read_until<R>(peer: &mut R, terminator: &[u8]) -> String
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    while !buf.ends_with(terminator) {
        let n = peer.read(&mut byte).await.unwrap();
        assert!(n > 0, "unexpected EOF after {:?}", String::from_utf8_lossy(&buf));
        buf.push(byte[0]);
    }
    String::from_utf8(buf).unwrap()
}
